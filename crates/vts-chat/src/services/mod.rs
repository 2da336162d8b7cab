//! HTTP backends for translation and speech.

mod chunk;
mod translate;
mod tts;

pub use translate::MyMemoryTranslator;
pub use tts::GoogleTts;
