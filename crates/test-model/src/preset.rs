use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default)]
    pub failures: Option<u64>,
    /// If set, the response is rejected by the safety policy before
    /// any event is delivered.
    #[serde(default)]
    pub blocked: bool,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            ..Default::default()
        }
    }

    /// Creates a response that streams `fragments` as message deltas.
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            fragments
                .into_iter()
                .map(|f| PresetEvent::MessageDelta(f.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a response that is blocked by the safety policy.
    #[inline]
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Default::default()
        }
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// The full text this response streams.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .map(|PresetEvent::MessageDelta(delta)| delta.as_str())
            .collect()
    }
}
