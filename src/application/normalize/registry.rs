use crate::domain::error::NormalizeError;

use super::rules::{
    BriaVisualId, CivitSchedulerFixup, ControlnetType, IdeogramMaskNegation,
    IdeogramStyleReferences, ImageArray, InputRule, MagnificPixelBudget, ModelMatch, ReferenceImageArray, RuleContext,
    RunwayActTwoCharacter, RunwayAlephReferences, RunwayGen4References, TopazUpscaleClamp,
};

/// Registry of model-specific rewrite rules.
///
/// Rules run in registration order; every rule whose `applies_to()` matches
/// the model sees the output of the rules before it.
///
/// Use [`RuleRegistry::builder`] to construct the default rule set.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn InputRule>>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::new()
    }

    /// Register a rule.
    pub fn register(&mut self, rule: Box<dyn InputRule>) {
        self.rules.push(rule);
    }

    #[must_use]
    pub fn rules(&self) -> &[Box<dyn InputRule>] {
        &self.rules
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the rules that apply to `model`, in run order.
    #[must_use]
    pub fn matching(&self, model: &ModelMatch<'_>) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(model))
            .map(|rule| rule.name())
            .collect()
    }

    /// Run every applicable rule against `ctx`.
    ///
    /// Stops at the first rule that rejects the input.
    pub fn apply_all(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        let model = ctx.model;
        for rule in self.rules.iter().filter(|rule| rule.applies_to(&model)) {
            tracing::trace!(rule = rule.name(), model = model.name, "Applying input rule");
            rule.apply(ctx)?;
        }
        Ok(())
    }
}

/// Builder for a [`RuleRegistry`] holding the built-in rules.
#[derive(Debug, Clone)]
pub struct RuleRegistryBuilder {
    pixel_budget: u64,
}

impl Default for RuleRegistryBuilder {
    fn default() -> Self {
        Self {
            pixel_budget: super::upscale::DEFAULT_PIXEL_BUDGET,
        }
    }
}

impl RuleRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixel budget enforced for upscaling models.
    #[must_use]
    pub const fn pixel_budget(mut self, budget: u64) -> Self {
        self.pixel_budget = budget;
        self
    }

    #[must_use]
    pub fn build(self) -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(BriaVisualId));
        registry.register(Box::new(ControlnetType));
        registry.register(Box::new(IdeogramMaskNegation));
        registry.register(Box::new(IdeogramStyleReferences));
        registry.register(Box::new(TopazUpscaleClamp));
        registry.register(Box::new(CivitSchedulerFixup));
        registry.register(Box::new(ImageArray));
        registry.register(Box::new(RunwayGen4References));
        registry.register(Box::new(RunwayActTwoCharacter));
        registry.register(Box::new(ReferenceImageArray));
        registry.register(Box::new(RunwayAlephReferences));
        registry.register(Box::new(MagnificPixelBudget::new(self.pixel_budget)));
        registry
    }
}
