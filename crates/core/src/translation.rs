//! The translation capability.

use async_trait::async_trait;

use crate::error::ServiceError;

/// Translates replies out of the model's language.
///
/// Implementations hold no per-target state: every call names its target.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into the language with the ISO 639-1 `target`
    /// code.
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> Result<String, ServiceError>;
}
