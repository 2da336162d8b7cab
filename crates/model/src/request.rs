use bytes::Bytes;

use crate::OpaqueMessage;
use crate::settings::{GenerationConfig, SafetySettings};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// The fixed instruction that frames every turn.
    pub system_instruction: Option<String>,
    /// The conversation so far, ending with the new user message.
    pub messages: Vec<ModelMessage>,
    /// Sampling controls.
    pub generation_config: GenerationConfig,
    /// Block thresholds per harm category.
    pub safety_settings: SafetySettings,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// A user input, optionally with an image.
    User(UserContent),
    /// An assistant text.
    Assistant(String),
    /// An opaque message (usually the history message from the model).
    Opaque(OpaqueMessage),
}

/// What the user sent in one turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserContent {
    /// The prompt text.
    pub text: String,
    /// An image sent along with the prompt.
    pub image: Option<ImageAttachment>,
}

impl UserContent {
    /// Creates a text-only user content.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    /// Attaches an image.
    #[inline]
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

/// Raw image bytes with their MIME type.
///
/// The bytes are forwarded to the provider as-is; nothing here decodes
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Encoded image data.
    pub data: Bytes,
}

impl ImageAttachment {
    /// Creates an attachment from its MIME type and data.
    #[inline]
    pub fn new<S: Into<String>, B: Into<Bytes>>(mime_type: S, data: B) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}
