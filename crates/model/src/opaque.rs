use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-specific history entry that the chat session keeps on
/// behalf of the remote conversation.
///
/// Providers usually need the exact shape of their own reply (roles,
/// parts, metadata) to continue a conversation. Wrapping it here lets
/// the session store it without knowing anything about it, and lets the
/// provider get it back when the next request is serialized.
pub struct OpaqueMessage(Arc<dyn OpaqueValue>);

impl OpaqueMessage {
    /// Wraps a provider value.
    ///
    /// The `id` must be unique within one remote conversation. Two
    /// `OpaqueMessage`s are equal iff their ids are equal.
    #[inline]
    pub fn new<ID: Into<String>, T: Send + Sync + 'static>(
        id: ID,
        value: T,
    ) -> Self {
        Self(Arc::new(Entry {
            id: id.into(),
            value,
        }))
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    /// Gets the wrapped value back, if it has type `T`.
    #[inline]
    pub fn to_raw<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }
}

impl Clone for OpaqueMessage {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id()).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

trait OpaqueValue: Send + Sync {
    fn id(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

struct Entry<T> {
    id: String,
    value: T,
}

impl<T: Send + Sync + 'static> OpaqueValue for Entry<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct ModelTurn {
        role: &'static str,
        text: String,
    }

    #[test]
    fn test_downcast() {
        let opaque = OpaqueMessage::new(
            "conv:1/turn:2",
            ModelTurn {
                role: "model",
                text: "Hanoi".to_owned(),
            },
        );
        let turn = opaque.to_raw::<ModelTurn>().unwrap();
        assert_eq!(turn.role, "model");
        assert_eq!(turn.text, "Hanoi");
        assert!(opaque.to_raw::<String>().is_none());
    }

    #[test]
    fn test_equality_by_id() {
        let a = OpaqueMessage::new("turn:1", "first".to_owned());
        let b = OpaqueMessage::new("turn:1", "rewritten".to_owned());
        let c = OpaqueMessage::new("turn:2", "first".to_owned());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.clone().id(), "turn:1");
    }
}
