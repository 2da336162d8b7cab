use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use vts_chat_model::{ErrorKind as ModelErrorKind, ModelProviderError};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The user input was rejected before anything was sent.
    Validation,
    /// The prompt or its context tripped a safety threshold.
    Blocked,
    /// A backend (chat, translation, speech) or the output store failed.
    Service,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "Invalid input"),
            ErrorKind::Blocked => write!(f, "Blocked Prompt"),
            ErrorKind::Service => write!(f, "An error occurred"),
        }
    }
}

/// The step of a submission that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Talking to the chat model.
    Chat,
    /// Translating the reply.
    Translation,
    /// Synthesizing speech.
    Speech,
    /// Writing or reading output artifacts.
    Storage,
}

/// Describes a failed operation of the session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    stage: Option<Stage>,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `Validation` kind.
    #[inline]
    pub fn validation() -> Self {
        Self {
            kind: ErrorKind::Validation,
            stage: None,
            reason: None,
        }
    }

    /// Creates a new error with the `Blocked` kind.
    #[inline]
    pub fn blocked() -> Self {
        Self {
            kind: ErrorKind::Blocked,
            stage: Some(Stage::Chat),
            reason: None,
        }
    }

    /// Creates a new error with the `Service` kind, raised at `stage`.
    #[inline]
    pub fn service(stage: Stage) -> Self {
        Self {
            kind: ErrorKind::Service,
            stage: Some(stage),
            reason: None,
        }
    }

    pub(crate) fn from_model(err: &dyn ModelProviderError) -> Self {
        let error = match err.kind() {
            ModelErrorKind::Blocked => Self::blocked(),
            ModelErrorKind::RateLimitExceeded | ModelErrorKind::Other => {
                Self::service(Stage::Chat)
            }
        };
        error.with_reason(err.to_string())
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            reason: Some(reason.into()),
            ..self
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the stage that failed, if any.
    #[inline]
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}

/// The single failure mode of the translation and speech backends.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    /// Creates an error with a message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ServiceError {}
