//! The speech synthesis capability.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, ServiceError, Stage};
use crate::output::OutputStore;

/// Languages the synthesizer is known to speak.
pub const SPEECH_LANGUAGES: [&str; 16] = [
    "en", "hi", "bn", "te", "ta", "gu", "kn", "pa", "ml", "es", "fr", "de",
    "it", "pt", "ar", "ru",
];

/// Used for every code outside [`SPEECH_LANGUAGES`].
pub const FALLBACK_SPEECH_LANGUAGE: &str = "en";

/// Turns text into MP3 audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` spoken in `language`, which is always one of
    /// [`SPEECH_LANGUAGES`].
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Bytes, ServiceError>;
}

/// Picks the code to synthesize with. Unsupported codes quietly become
/// [`FALLBACK_SPEECH_LANGUAGE`].
pub fn speech_language_for(code: &str) -> &'static str {
    SPEECH_LANGUAGES
        .iter()
        .find(|supported| **supported == code)
        .copied()
        .unwrap_or_else(|| {
            debug!("no voice for {code:?}, using {FALLBACK_SPEECH_LANGUAGE}");
            FALLBACK_SPEECH_LANGUAGE
        })
}

/// Synthesizes `text` and overwrites the audio artifact with the result.
pub async fn speak_to_store(
    synthesizer: &dyn SpeechSynthesizer,
    store: &OutputStore,
    text: &str,
    code: &str,
) -> Result<PathBuf, Error> {
    let language = speech_language_for(code);
    let audio = synthesizer.synthesize(text, language).await.map_err(|err| {
        Error::service(Stage::Speech).with_reason(err.message())
    })?;
    if audio.is_empty() {
        return Err(Error::service(Stage::Speech)
            .with_reason("synthesizer returned no audio"));
    }
    store.save_audio(&audio).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::output::ArtifactKind;

    #[derive(Default)]
    struct RecordingSynthesizer {
        languages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            language: &str,
        ) -> Result<Bytes, ServiceError> {
            self.languages.lock().unwrap().push(language.to_owned());
            Ok(Bytes::from(format!("{language}:{text}")))
        }
    }

    #[test]
    fn test_speech_language_for() {
        assert_eq!(speech_language_for("es"), "es");
        assert_eq!(speech_language_for("ml"), "ml");
        assert_eq!(speech_language_for("or"), "en");
        assert_eq!(speech_language_for("vi"), "en");
        assert_eq!(speech_language_for(""), "en");
    }

    #[tokio::test]
    async fn test_unsupported_code_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::open(dir.path()).unwrap();
        let synthesizer = RecordingSynthesizer::default();

        let path = speak_to_store(&synthesizer, &store, "namaskar", "or")
            .await
            .unwrap();
        assert_eq!(path, store.path(ArtifactKind::Audio));
        assert_eq!(
            store.read_bytes(ArtifactKind::Audio).await.unwrap(),
            "en:namaskar".as_bytes()
        );
        assert_eq!(*synthesizer.languages.lock().unwrap(), ["en"]);
    }
}
