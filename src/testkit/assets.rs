//! Fixed [`AssetService`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::port::AssetService;
use crate::testkit::backend::transport_failure;

/// Answers dimension probes from a table, registers every image under the
/// same visual id and "inverts" masks by prefixing their URL.
pub struct StaticAssets {
    dimensions: HashMap<String, (u32, u32)>,
    fallback: Option<(u32, u32)>,
    visual_id: String,
    fail_register: bool,
    fail_negate: bool,
    probes: AtomicU32,
    registrations: AtomicU32,
    negations: AtomicU32,
}

impl Default for StaticAssets {
    fn default() -> Self {
        Self {
            dimensions: HashMap::new(),
            fallback: Some((1024, 1024)),
            visual_id: "visual-1".into(),
            fail_register: false,
            fail_negate: false,
            probes: AtomicU32::new(0),
            registrations: AtomicU32::new(0),
            negations: AtomicU32::new(0),
        }
    }
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(mut self, url: &str, width: u32, height: u32) -> Self {
        self.dimensions.insert(url.to_string(), (width, height));
        self
    }

    /// Make every probe of an unlisted URL fail.
    pub fn unreadable(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn with_visual_id(mut self, visual_id: &str) -> Self {
        self.visual_id = visual_id.to_string();
        self
    }

    pub fn with_failing_register(mut self) -> Self {
        self.fail_register = true;
        self
    }

    pub fn with_failing_negation(mut self) -> Self {
        self.fail_negate = true;
        self
    }

    /// Value returned for an inverted mask at `url`.
    pub fn negated(url: &str) -> String {
        format!("data:image/png;base64,negated:{url}")
    }

    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn registration_count(&self) -> u32 {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn negation_count(&self) -> u32 {
        self.negations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetService for StaticAssets {
    async fn image_dimensions(&self, url: &str) -> Result<(u32, u32)> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.dimensions
            .get(url)
            .copied()
            .or(self.fallback)
            .ok_or_else(transport_failure)
    }

    async fn register_visual(&self, _url: &str) -> Result<String> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        if self.fail_register {
            return Err(transport_failure());
        }
        Ok(self.visual_id.clone())
    }

    async fn negate_mask(&self, url: &str) -> Result<String> {
        self.negations.fetch_add(1, Ordering::SeqCst);
        if self.fail_negate {
            return Err(transport_failure());
        }
        Ok(Self::negated(url))
    }
}
