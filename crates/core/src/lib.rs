//! Core logic of the chat client: the transcript, the conversation with
//! the model, the typing presenter, the output artifacts, and the
//! controller that runs a submission from prompt to saved audio.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chat;
mod controller;
pub mod conversation;
mod error;
pub mod language;
mod model_client;
mod output;
mod presenter;
mod speech;
mod translation;

pub use chat::{ChatSession, Fragments, RemoteConversation, ReplyStream};
pub use controller::{
    SYSTEM_INSTRUCTION, SessionBuilder, SessionController, SessionParameters,
    SessionState, Submission,
};
pub use error::{Error, ErrorKind, ServiceError, Stage};
pub use model_client::{ModelClient, ModelClientResponse};
pub use output::{ArtifactKind, OutputStore};
pub use presenter::{
    CURSOR, NoPacing, Pacing, Presenter, RenderSink, THINKING, TypingPacing,
};
pub use speech::{
    FALLBACK_SPEECH_LANGUAGE, SPEECH_LANGUAGES, SpeechSynthesizer,
    speak_to_store, speech_language_for,
};
pub use translation::Translator;
