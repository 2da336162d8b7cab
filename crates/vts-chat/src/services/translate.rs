use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use vts_chat_core::{ServiceError, Translator};

use super::chunk::{byte_len, chunk_text};

const DEFAULT_ENDPOINT: &str = "https://api.mymemory.translated.net/get";
const SOURCE_LANGUAGE: &str = "en";
// The free endpoint rejects longer queries.
const MAX_QUERY_BYTES: usize = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationResponse {
    response_data: Option<ResponseData>,
    // Usually a number, but some errors send it as a string.
    response_status: Value,
    #[serde(default)]
    response_details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: String,
}

fn parse_translation(body: &str) -> Result<String, ServiceError> {
    let response: TranslationResponse = serde_json::from_str(body)
        .map_err(|err| ServiceError::new(format!("bad translation: {err}")))?;
    let status = response.response_status.as_u64().or_else(|| {
        response
            .response_status
            .as_str()
            .and_then(|s| s.parse().ok())
    });
    if status != Some(200) {
        let details = response
            .response_details
            .unwrap_or_else(|| response.response_status.to_string());
        return Err(ServiceError::new(format!(
            "translation failed: {details}"
        )));
    }
    response
        .response_data
        .map(|data| data.translated_text)
        .ok_or_else(|| ServiceError::new("translation is missing"))
}

/// Translates English replies with the MyMemory service.
#[derive(Clone, Debug)]
pub struct MyMemoryTranslator {
    client: Client,
    endpoint: String,
}

impl MyMemoryTranslator {
    /// Creates a translator using the public endpoint.
    #[inline]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        target: &str,
    ) -> Result<String, ServiceError> {
        let langpair = format!("{SOURCE_LANGUAGE}|{target}");
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("q", chunk), ("langpair", langpair.as_str())])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| ServiceError::new(format!("{err}")))?
            .text()
            .await
            .map_err(|err| ServiceError::new(format!("{err}")))?;
        parse_translation(&body)
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> Result<String, ServiceError> {
        let chunks = chunk_text(text, MAX_QUERY_BYTES, byte_len);
        debug!("translating {} chunk(s) to {target}", chunks.len());

        let mut translated = String::with_capacity(text.len());
        for chunk in chunks {
            let words = chunk.trim();
            if !words.is_empty() {
                let result = self.translate_chunk(words, target).await?;
                translated.push_str(result.trim());
            }
            // Keep the line structure of the reply.
            translated.push_str(&chunk[chunk.trim_end().len()..]);
        }
        Ok(translated)
    }
}
