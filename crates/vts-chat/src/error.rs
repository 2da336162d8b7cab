use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A command or its arguments could not be understood.
    InvalidInput,
    /// A copy, download or playback action failed.
    ActionFailed,
    /// The session reported an error.
    Session,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::ActionFailed => write!(f, "Action failed"),
            ErrorKind::Session => write!(f, "Session error"),
        }
    }
}

/// Describes a failed command.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            reason: None,
        }
    }

    /// Creates a new error with the `ActionFailed` kind.
    #[inline]
    pub fn action_failed() -> Self {
        Self {
            kind: ErrorKind::ActionFailed,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
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
        match (self.kind, &self.reason) {
            // Session errors already carry their own prefix.
            (ErrorKind::Session, Some(reason)) => f.write_str(reason),
            (kind, Some(reason)) => write!(f, "{kind}: {reason}"),
            (kind, None) => write!(f, "{kind}"),
        }
    }
}

impl StdError for Error {}

impl From<vts_chat_core::Error> for Error {
    fn from(err: vts_chat_core::Error) -> Self {
        Self {
            kind: ErrorKind::Session,
            reason: Some(err.to_string()),
        }
    }
}
