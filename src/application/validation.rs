//! Pre-submission validation of a recipe's input form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::FieldError;
use crate::domain::{RecipeInput, RecipeRunRequest};
use crate::error::ValidationErrors;

/// Node kind behind a form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormInputKind {
    #[serde(rename = "prompt", alias = "promptV3")]
    Prompt,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "import")]
    Import,
    #[serde(rename = "media_iterator")]
    MediaIterator,
    #[serde(rename = "multilora")]
    MultiLora,
    #[serde(other)]
    Other,
}

/// One input of a recipe's run form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    /// Id of the node the input feeds.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FormInputKind,
    #[serde(default)]
    pub value: Option<Value>,
    /// Shown to the person running the recipe.
    #[serde(default = "default_exposed")]
    pub exposed: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn text_at<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn default_exposed() -> bool {
    true
}

impl FormInput {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: FormInputKind, value: Option<Value>) -> Self {
        Self {
            id: id.into(),
            kind,
            value,
            exposed: true,
            disabled: false,
            name: None,
        }
    }

    /// Why this input blocks submission, if it does.
    #[must_use]
    pub fn check(&self) -> Option<FieldError> {
        let Some(value) = self.value.as_ref().filter(|v| !v.is_null()) else {
            return Some(FieldError::Required);
        };

        match self.kind {
            FormInputKind::Prompt if text_at(value, "prompt").is_empty() => Some(FieldError::Required),
            FormInputKind::String if text_at(value, "string").trim().is_empty() => {
                Some(FieldError::Required)
            }
            FormInputKind::Import | FormInputKind::MediaIterator => {
                let file_url = value
                    .get("file")
                    .and_then(|file| file.get("url"))
                    .and_then(Value::as_str)
                    .filter(|url| !url.is_empty());
                let url = value
                    .get("url")
                    .and_then(Value::as_str)
                    .filter(|url| !url.is_empty());
                (file_url.is_none() && url.is_none()).then_some(FieldError::MissingFile)
            }
            FormInputKind::MultiLora => {
                let has_file = value
                    .get("selectedLora")
                    .and_then(|lora| lora.get("file"))
                    .and_then(Value::as_str)
                    .is_some_and(|file| !file.is_empty());
                (!has_file).then_some(FieldError::MissingLora)
            }
            _ => None,
        }
    }
}

/// Validate exposed, enabled inputs in form order.
///
/// # Errors
///
/// Returns every offending field; the first entry is the one to focus.
pub fn validate_form(inputs: &[FormInput]) -> Result<(), ValidationErrors> {
    let errors: Vec<(String, FieldError)> = inputs
        .iter()
        .filter(|input| input.exposed && !input.disabled)
        .filter_map(|input| input.check().map(|err| (input.id.clone(), err)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Build a recipe submission from every form input, exposed or not.
#[must_use]
pub fn recipe_request(
    recipe_id: impl Into<String>,
    inputs: &[FormInput],
    number_of_runs: u32,
    recipe_version: u32,
) -> RecipeRunRequest {
    RecipeRunRequest {
        recipe_id: recipe_id.into(),
        inputs: inputs
            .iter()
            .map(|input| RecipeInput {
                node_id: input.id.clone(),
                input: input.value.clone().unwrap_or(Value::Null),
                disabled: input.disabled,
                name: input.name.clone(),
            })
            .collect(),
        number_of_runs,
        recipe_version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_prompt_is_required() {
        let input = FormInput::new("n1", FormInputKind::Prompt, Some(json!({"prompt": ""})));
        assert_eq!(input.check(), Some(FieldError::Required));
    }

    #[test]
    fn whitespace_string_is_required() {
        let input = FormInput::new("n1", FormInputKind::String, Some(json!({"string": "  "})));
        assert_eq!(input.check(), Some(FieldError::Required));
    }

    #[test]
    fn import_accepts_file_or_direct_url() {
        let file = FormInput::new(
            "n1",
            FormInputKind::Import,
            Some(json!({"file": {"url": "https://x/a.png"}})),
        );
        let direct = FormInput::new(
            "n2",
            FormInputKind::MediaIterator,
            Some(json!({"url": "https://x/b.png"})),
        );
        let missing = FormInput::new("n3", FormInputKind::Import, Some(json!({"file": {}})));

        assert_eq!(file.check(), None);
        assert_eq!(direct.check(), None);
        assert_eq!(missing.check(), Some(FieldError::MissingFile));
    }

    #[test]
    fn multilora_needs_uploaded_file() {
        let input = FormInput::new(
            "n1",
            FormInputKind::MultiLora,
            Some(json!({"selectedLora": {"id": "l1", "name": "style"}, "weight": 1})),
        );
        assert_eq!(input.check(), Some(FieldError::MissingLora));
    }

    #[test]
    fn missing_value_is_required_for_any_kind() {
        let input = FormInput::new("n1", FormInputKind::Other, None);
        assert_eq!(input.check(), Some(FieldError::Required));
    }

    #[test]
    fn hidden_and_disabled_inputs_are_skipped() {
        let mut hidden = FormInput::new("hidden", FormInputKind::Prompt, None);
        hidden.exposed = false;
        let mut disabled = FormInput::new("disabled", FormInputKind::Prompt, None);
        disabled.disabled = true;

        assert!(validate_form(&[hidden, disabled]).is_ok());
    }

    #[test]
    fn errors_keep_form_order() {
        let inputs = [
            FormInput::new("ok", FormInputKind::Prompt, Some(json!({"prompt": "hi"}))),
            FormInput::new("second", FormInputKind::Import, Some(json!({}))),
            FormInput::new("third", FormInputKind::Prompt, None),
        ];

        let errors = validate_form(&inputs).unwrap_err();
        assert_eq!(errors.first_field(), Some("second"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("third"), Some(FieldError::Required));
    }

    #[test]
    fn form_input_deserializes_from_editor_shape() {
        let input: FormInput = serde_json::from_value(json!({
            "id": "n7",
            "type": "promptV3",
            "value": {"prompt": "a fox"},
            "disabled": false
        }))
        .unwrap();
        assert_eq!(input.kind, FormInputKind::Prompt);
        assert!(input.exposed);
    }

    #[test]
    fn recipe_request_includes_every_input() {
        let mut hidden = FormInput::new("h", FormInputKind::String, Some(json!({"string": "x"})));
        hidden.exposed = false;
        hidden.name = Some("Style".into());
        let inputs = [
            FormInput::new("p", FormInputKind::Prompt, Some(json!({"prompt": "hi"}))),
            hidden,
        ];

        let request = recipe_request("r1", &inputs, 2, 5);
        assert_eq!(request.inputs.len(), 2);
        assert_eq!(request.inputs[1].name.as_deref(), Some("Style"));
        assert_eq!(
            serde_json::to_value(&request).unwrap()["numberOfRuns"],
            json!(2)
        );
    }
}
