use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use vts_chat_core::{ServiceError, SpeechSynthesizer};

use super::chunk::{char_len, chunk_text};

const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";
// Longer texts are refused by the endpoint.
const MAX_CHUNK_CHARS: usize = 100;

fn segment_query(
    chunk: &str,
    language: &str,
    idx: usize,
    total: usize,
) -> Vec<(&'static str, String)> {
    vec![
        ("ie", "UTF-8".to_owned()),
        ("client", "tw-ob".to_owned()),
        ("tl", language.to_owned()),
        ("q", chunk.to_owned()),
        ("total", total.to_string()),
        ("idx", idx.to_string()),
        ("textlen", char_len(chunk).to_string()),
    ]
}

/// Speaks text with the Google Translate voice.
///
/// Texts are read in segments of at most 100 characters. The MP3
/// segments are concatenated into one stream.
#[derive(Clone, Debug)]
pub struct GoogleTts {
    client: Client,
    endpoint: String,
}

impl GoogleTts {
    /// Creates a synthesizer using the public endpoint.
    #[inline]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }

    async fn fetch_segment(
        &self,
        query: &[(&'static str, String)],
    ) -> Result<Bytes, ServiceError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(query)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| ServiceError::new(format!("{err}")))?;

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok());
        if let Some(content_type) = content_type {
            if content_type.type_() != mime::AUDIO {
                return Err(ServiceError::new(format!(
                    "expected audio, got {content_type}"
                )));
            }
        }

        resp.bytes()
            .await
            .map_err(|err| ServiceError::new(format!("{err}")))
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Bytes, ServiceError> {
        let segments = chunk_text(text, MAX_CHUNK_CHARS, char_len)
            .into_iter()
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        if segments.is_empty() {
            return Err(ServiceError::new("there is nothing to read aloud"));
        }
        debug!("synthesizing {} segment(s) in {language}", segments.len());

        let mut audio = Vec::new();
        for (idx, segment) in segments.iter().enumerate() {
            let query = segment_query(segment, language, idx, segments.len());
            let bytes = self.fetch_segment(&query).await?;
            trace!("segment {idx}: {} bytes", bytes.len());
            audio.extend_from_slice(&bytes);
        }
        Ok(Bytes::from(audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_query() {
        let query = segment_query("Xin chào", "vi", 1, 3);
        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("client"), Some("tw-ob"));
        assert_eq!(get("tl"), Some("vi"));
        assert_eq!(get("q"), Some("Xin chào"));
        assert_eq!(get("idx"), Some("1"));
        assert_eq!(get("total"), Some("3"));
        assert_eq!(get("textlen"), Some("8"));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let tts = GoogleTts::new(Client::new());
        let err = tts.synthesize(" \n ", "en").await.unwrap_err();
        assert_eq!(err.message(), "there is nothing to read aloud");
    }
}
