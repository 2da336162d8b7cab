//! Renders a streamed reply with a typing cadence.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chat::Fragments;
use crate::error::Error;

/// Appended to intermediate renderings while the reply is still arriving.
pub const CURSOR: &str = "_";

/// Shown before the first fragment arrives.
pub const THINKING: &str = "Thinking...";

/// Where the presenter draws the reply.
pub trait RenderSink: Send {
    /// The request was sent and no fragment has arrived yet.
    fn thinking(&mut self);

    /// The reply so far, already followed by [`CURSOR`].
    fn partial(&mut self, text: &str);

    /// The complete reply. Called once, after the last partial.
    fn finished(&mut self, text: &str);

    /// The reply rendered in another language.
    fn translated(&mut self, language: &str, text: &str);

    /// A stage of the submission failed.
    fn error(&mut self, message: &str);
}

/// Decides how often the partial text is redrawn.
#[async_trait]
pub trait Pacing: Send {
    /// Number of characters to accumulate before the next redraw.
    ///
    /// `None` redraws once per fragment and never pauses.
    fn next_burst(&mut self) -> Option<usize>;

    /// Waits before a redraw.
    async fn pause(&mut self);
}

/// Redraws after a random number of characters and sleeps a little
/// before each redraw, which looks like someone typing.
pub struct TypingPacing {
    rng: StdRng,
    bursts: RangeInclusive<usize>,
    delay: Duration,
}

impl TypingPacing {
    /// Creates a pacing with custom burst bounds and delay.
    pub fn new(bursts: RangeInclusive<usize>, delay: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            bursts,
            delay,
        }
    }

    /// Makes the burst sizes reproducible.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Default for TypingPacing {
    #[inline]
    fn default() -> Self {
        Self::new(5..=10, Duration::from_millis(50))
    }
}

#[async_trait]
impl Pacing for TypingPacing {
    fn next_burst(&mut self) -> Option<usize> {
        if self.bursts.is_empty() {
            return Some(1);
        }
        Some(self.rng.gen_range(self.bursts.clone()).max(1))
    }

    async fn pause(&mut self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Redraws on fragment boundaries only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacing for NoPacing {
    #[inline]
    fn next_burst(&mut self) -> Option<usize> {
        None
    }

    async fn pause(&mut self) {}
}

/// Drives a [`Fragments`] sequence into a [`RenderSink`].
pub struct Presenter {
    pacing: Box<dyn Pacing>,
}

impl Presenter {
    /// Creates a presenter with the given pacing.
    #[inline]
    pub fn new<P: Pacing + 'static>(pacing: P) -> Self {
        Self {
            pacing: Box::new(pacing),
        }
    }

    /// Consumes `fragments` to the end and returns the full reply.
    ///
    /// On error nothing is finished and the error is returned as-is;
    /// reporting it is up to the caller.
    pub async fn present(
        &mut self,
        fragments: &mut (dyn Fragments + '_),
        sink: &mut dyn RenderSink,
    ) -> Result<String, Error> {
        sink.thinking();
        let mut text = String::new();
        while let Some(fragment) = fragments.next_fragment().await {
            let fragment = fragment?;
            let Some(mut burst) = self.pacing.next_burst() else {
                text.push_str(&fragment);
                sink.partial(&format!("{text}{CURSOR}"));
                continue;
            };

            // The counter restarts with every fragment.
            let mut count = 0;
            for ch in fragment.chars() {
                text.push(ch);
                count += 1;
                if count >= burst {
                    self.pacing.pause().await;
                    sink.partial(&format!("{text}{CURSOR}"));
                    count = 0;
                    burst = self.pacing.next_burst().unwrap_or(usize::MAX);
                }
            }
        }
        sink.finished(&text);
        Ok(text)
    }
}

impl Default for Presenter {
    #[inline]
    fn default() -> Self {
        Self::new(TypingPacing::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use tokio::time::Instant;

    use super::*;

    struct ScriptedFragments(VecDeque<Result<String, Error>>);

    impl ScriptedFragments {
        fn new<const N: usize>(fragments: [&str; N]) -> Self {
            Self(fragments.iter().map(|f| Ok((*f).to_owned())).collect())
        }
    }

    #[async_trait]
    impl Fragments for ScriptedFragments {
        async fn next_fragment(&mut self) -> Option<Result<String, Error>> {
            self.0.pop_front()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        thinking: usize,
        partials: Vec<String>,
        finished: Vec<String>,
    }

    impl RenderSink for RecordingSink {
        fn thinking(&mut self) {
            self.thinking += 1;
        }

        fn partial(&mut self, text: &str) {
            self.partials.push(text.to_owned());
        }

        fn finished(&mut self, text: &str) {
            self.finished.push(text.to_owned());
        }

        fn translated(&mut self, _language: &str, _text: &str) {}

        fn error(&mut self, _message: &str) {}
    }

    struct FixedPacing {
        burst: usize,
        pauses: usize,
    }

    #[async_trait]
    impl Pacing for FixedPacing {
        fn next_burst(&mut self) -> Option<usize> {
            Some(self.burst)
        }

        async fn pause(&mut self) {
            self.pauses += 1;
        }
    }

    #[tokio::test]
    async fn test_no_pacing() {
        let mut presenter = Presenter::new(NoPacing);
        let mut fragments = ScriptedFragments::new(["Xin ", "chào", "!"]);
        let mut sink = RecordingSink::default();

        let text = presenter.present(&mut fragments, &mut sink).await.unwrap();
        assert_eq!(text, "Xin chào!");
        assert_eq!(sink.thinking, 1);
        assert_eq!(sink.partials, ["Xin _", "Xin chào_", "Xin chào!_"]);
        assert_eq!(sink.finished, ["Xin chào!"]);
    }

    #[tokio::test]
    async fn test_burst_restarts_per_fragment() {
        let mut presenter = Presenter::new(FixedPacing {
            burst: 3,
            pauses: 0,
        });
        // 4 chars then 5 chars: one redraw in each fragment, the leftover
        // characters never complete a burst.
        let mut fragments = ScriptedFragments::new(["abcd", "efghi"]);
        let mut sink = RecordingSink::default();

        let text = presenter.present(&mut fragments, &mut sink).await.unwrap();
        assert_eq!(text, "abcdefghi");
        assert_eq!(sink.partials, ["abc_", "abcdefg_"]);
        assert_eq!(sink.finished, ["abcdefghi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_pacing() {
        let mut presenter =
            Presenter::new(TypingPacing::default().with_seed(7));
        let reply = "The capital of Vietnam is Hanoi.";
        let mut fragments =
            ScriptedFragments::new(["The capital ", "of Vietnam is Hanoi."]);
        let mut sink = RecordingSink::default();

        let start = Instant::now();
        let text = presenter.present(&mut fragments, &mut sink).await.unwrap();
        assert_eq!(text, reply);
        assert!(!sink.partials.is_empty());
        for partial in &sink.partials {
            let shown = partial.strip_suffix(CURSOR).unwrap();
            assert!(reply.starts_with(shown));
        }
        assert_eq!(sink.finished, [reply]);
        assert_eq!(
            start.elapsed(),
            Duration::from_millis(50) * sink.partials.len() as u32
        );
    }

    #[tokio::test]
    async fn test_error_stops_presentation() {
        let mut presenter = Presenter::new(NoPacing);
        let mut fragments = ScriptedFragments(VecDeque::from([
            Ok("partial".to_owned()),
            Err(Error::blocked()),
            Ok("never".to_owned()),
        ]));
        let mut sink = RecordingSink::default();

        let err = presenter
            .present(&mut fragments, &mut sink)
            .await
            .unwrap_err();
        assert_eq!(err, Error::blocked());
        assert!(sink.finished.is_empty());
    }
}
