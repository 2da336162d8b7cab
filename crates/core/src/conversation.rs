//! Conversation-related types.

use std::fmt::{self, Display};

use vts_chat_model::ImageAttachment;

/// The assistant turn a fresh transcript starts with.
pub const GREETING: &str = "Hi there. Can I help you?";

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person typing.
    User,
    /// The model.
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message of the visible transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
    image: Option<ImageAttachment>,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(
        content: S,
        image: Option<ImageAttachment>,
    ) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image,
        }
    }

    /// Creates an assistant turn.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image: None,
        }
    }

    /// Returns the author of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the image sent with this turn.
    #[inline]
    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }
}

/// The chronological, append-only list of turns shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Default for Transcript {
    #[inline]
    fn default() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }
}

impl Transcript {
    /// Returns all turns, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the newest turn.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drops everything and starts over with the greeting.
    #[inline]
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_to_greeting() {
        let mut transcript = Transcript::default();
        transcript.push(Turn::user("Hello", None));
        transcript.push(Turn::assistant("Hi!"));
        assert_eq!(transcript.turns().len(), 3);

        transcript.reset();
        assert_eq!(transcript.turns(), &[Turn::assistant(GREETING)]);
        assert_eq!(transcript.last().unwrap().role(), Role::Assistant);
    }
}
