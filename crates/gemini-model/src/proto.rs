use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use vts_chat_model::{
    GenerationConfig as ModelGenerationConfig, HarmBlockThreshold,
    HarmCategory, ModelMessage, ModelRequest, SafetySettings as ModelSafety,
    UserContent,
};

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub response_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl Candidate {
    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        let Some(content) = &self.content else {
            return String::new();
        };
        content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect()
    }
}

/// Finish reasons that mean the candidate was withheld by the safety
/// filters rather than completed.
pub fn is_blocking_finish_reason(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" | "RECITATION"
    )
}

// -----------
// Conversions
// -----------

pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: req.system_instruction.as_ref().map(|text| {
            SystemInstruction {
                parts: vec![Part::Text { text: text.clone() }],
            }
        }),
        contents: req.messages.iter().map(create_content).collect(),
        generation_config: create_generation_config(&req.generation_config),
        safety_settings: create_safety_settings(&req.safety_settings),
    }
}

pub fn model_content(text: String) -> Content {
    Content {
        role: "model".to_owned(),
        parts: vec![Part::Text { text }],
    }
}

fn create_content(msg: &ModelMessage) -> Content {
    match msg {
        ModelMessage::User(content) => create_user_content(content),
        ModelMessage::Assistant(text) => model_content(text.clone()),
        ModelMessage::Opaque(opaque_message) => {
            // Opaque messages from this provider always hold `Content`.
            match opaque_message.to_raw::<Content>() {
                Some(content) => content.clone(),
                None => {
                    warn!("foreign opaque message: {opaque_message:?}");
                    model_content(String::new())
                }
            }
        }
    }
}

fn create_user_content(content: &UserContent) -> Content {
    let mut parts = Vec::with_capacity(2);
    // The image goes first, the prompt refers to it.
    if let Some(image) = &content.image {
        parts.push(Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: BASE64_STANDARD.encode(&image.data),
            },
        });
    }
    parts.push(Part::Text {
        text: content.text.clone(),
    });
    Content {
        role: "user".to_owned(),
        parts,
    }
}

fn create_generation_config(
    config: &ModelGenerationConfig,
) -> GenerationConfig {
    GenerationConfig {
        max_output_tokens: config.max_output_tokens(),
        temperature: config.temperature(),
        top_p: config.top_p(),
        top_k: config.top_k(),
    }
}

fn create_safety_settings(settings: &ModelSafety) -> Vec<SafetySetting> {
    settings
        .iter()
        .map(|(category, threshold)| SafetySetting {
            category: match category {
                HarmCategory::DangerousContent => {
                    "HARM_CATEGORY_DANGEROUS_CONTENT"
                }
                HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
                HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
                HarmCategory::SexuallyExplicit => {
                    "HARM_CATEGORY_SEXUALLY_EXPLICIT"
                }
            },
            threshold: match threshold {
                HarmBlockThreshold::BlockNone => "BLOCK_NONE",
                HarmBlockThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
                HarmBlockThreshold::BlockMediumAndAbove => {
                    "BLOCK_MEDIUM_AND_ABOVE"
                }
                HarmBlockThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vts_chat_model::{ImageAttachment, OpaqueMessage};

    use super::*;

    #[test]
    fn test_create_request() {
        let mut safety_settings = ModelSafety::default();
        safety_settings.set(
            HarmCategory::Harassment,
            HarmBlockThreshold::BlockMediumAndAbove,
        );
        let request = ModelRequest {
            system_instruction: Some("You are a helpful assistant.".to_owned()),
            messages: vec![
                ModelMessage::User(UserContent::text("Hi")),
                ModelMessage::Opaque(OpaqueMessage::new(
                    "turn:1",
                    model_content("Hello!".to_owned()),
                )),
                ModelMessage::User(
                    UserContent::text("What is this?").with_image(
                        ImageAttachment::new("image/png", &b"\x89PNG"[..]),
                    ),
                ),
            ],
            generation_config: Default::default(),
            safety_settings,
        };

        let body = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "systemInstruction": {
                    "parts": [{ "text": "You are a helpful assistant." }]
                },
                "contents": [
                    { "role": "user", "parts": [{ "text": "Hi" }] },
                    { "role": "model", "parts": [{ "text": "Hello!" }] },
                    {
                        "role": "user",
                        "parts": [
                            {
                                "inlineData": {
                                    "mimeType": "image/png",
                                    "data": "iVBORw=="
                                }
                            },
                            { "text": "What is this?" }
                        ]
                    }
                ],
                "generationConfig": {
                    "maxOutputTokens": 3000,
                    "temperature": 0.1f32,
                    "topP": 0.7f32,
                    "topK": 20
                },
                "safetySettings": [
                    {
                        "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
                        "threshold": "BLOCK_NONE"
                    },
                    {
                        "category": "HARM_CATEGORY_HARASSMENT",
                        "threshold": "BLOCK_MEDIUM_AND_ABOVE"
                    },
                    {
                        "category": "HARM_CATEGORY_HATE_SPEECH",
                        "threshold": "BLOCK_NONE"
                    },
                    {
                        "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT",
                        "threshold": "BLOCK_NONE"
                    }
                ]
            })
        );
    }

    #[test]
    fn test_parse_chunk() {
        let chunk: GenerateContentChunk = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Ha"}, {"text": "noi"}],"role": "model"},"finishReason": "STOP","index": 0}],"usageMetadata": {"promptTokenCount": 8}}"#,
        )
        .unwrap();
        assert_eq!(chunk.candidates[0].text(), "Hanoi");
        assert_eq!(chunk.candidates[0].finish_reason.as_deref(), Some("STOP"));
        assert!(chunk.prompt_feedback.is_none());

        let blocked: GenerateContentChunk = serde_json::from_str(
            r#"{"promptFeedback": {"blockReason": "SAFETY","safetyRatings": []}}"#,
        )
        .unwrap();
        assert!(blocked.candidates.is_empty());
        assert_eq!(
            blocked.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }
}
