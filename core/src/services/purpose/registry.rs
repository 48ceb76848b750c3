//! Purpose → side effect mapping

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::value_objects::{Purpose, UserId};
use crate::errors::{OtpError, OtpResult};

/// Side effect applied after a token for a purpose is consumed
///
/// Runs only after the store reported a successful consumption, and at
/// most once per consumed token. It is not atomic with the consumption.
#[async_trait]
pub trait PurposeHandler: Send + Sync {
    /// Apply the effect for `user_id`
    async fn on_redeemed(&self, user_id: UserId) -> anyhow::Result<()>;
}

/// Closed set of purposes with their side effects
#[derive(Clone, Default)]
pub struct PurposeRegistry {
    handlers: HashMap<Purpose, Arc<dyn PurposeHandler>>,
}

impl PurposeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for a purpose
    pub fn register(mut self, purpose: Purpose, handler: Arc<dyn PurposeHandler>) -> Self {
        self.insert(purpose, handler);
        self
    }

    /// Register in place, returning the previous handler if any
    pub fn insert(
        &mut self,
        purpose: Purpose,
        handler: Arc<dyn PurposeHandler>,
    ) -> Option<Arc<dyn PurposeHandler>> {
        self.handlers.insert(purpose, handler)
    }

    /// Handler for a purpose, `None` if the purpose is unknown
    pub fn side_effect_for(&self, purpose: &Purpose) -> Option<Arc<dyn PurposeHandler>> {
        self.handlers.get(purpose).cloned()
    }

    /// Handler for a purpose, failing for unknown purposes
    pub fn require(&self, purpose: &Purpose) -> OtpResult<Arc<dyn PurposeHandler>> {
        self.side_effect_for(purpose)
            .ok_or_else(|| OtpError::UnknownPurpose {
                purpose: purpose.clone(),
            })
    }

    /// Whether the purpose is registered
    pub fn contains(&self, purpose: &Purpose) -> bool {
        self.handlers.contains_key(purpose)
    }

    /// Registered purposes, in no particular order
    pub fn purposes(&self) -> impl Iterator<Item = &Purpose> {
        self.handlers.keys()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for PurposeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut purposes: Vec<&str> = self.handlers.keys().map(Purpose::as_str).collect();
        purposes.sort_unstable();
        f.debug_struct("PurposeRegistry")
            .field("purposes", &purposes)
            .finish()
    }
}
