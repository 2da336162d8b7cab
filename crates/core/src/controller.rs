mod builder;
mod state;

use std::path::PathBuf;

use vts_chat_model::{ImageAttachment, UserContent};

use crate::conversation::{Transcript, Turn};
use crate::error::{Error, Stage};
use crate::output::OutputStore;
use crate::presenter::{Presenter, RenderSink};
use crate::speech::{SpeechSynthesizer, speak_to_store};
use crate::translation::Translator;
pub use builder::SessionBuilder;
pub use state::{SessionParameters, SessionState};

/// The instruction every conversation starts from.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant and \
    are talkative, proficient in both English and Vietnamese languages, and \
    provide lots of specific details from your context. If you do not know \
    the answer to a question, you truthfully say you do not know.";

/// What a successful [`SessionController::submit`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// The reply as the model sent it.
    pub reply: String,
    /// The text shown last and saved, translated when needed.
    pub persisted_text: String,
    /// Where the text artifact was written.
    pub text_path: PathBuf,
    /// Where the audio artifact was written.
    pub audio_path: PathBuf,
}

/// Runs submissions against the session, one at a time.
///
/// A submission goes through the chat, the optional translation, and the
/// two saves in that order. The first failing step ends it; whatever the
/// earlier steps did (like recording the user turn) stays.
pub struct SessionController {
    state: SessionState,
    presenter: Presenter,
    translator: Box<dyn Translator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    store: OutputStore,
}

impl SessionController {
    /// Sends `prompt` (and `image`, if any) and persists the reply.
    ///
    /// Failures are reported to `sink` before they are returned.
    pub async fn submit(
        &mut self,
        prompt: &str,
        image: Option<ImageAttachment>,
        sink: &mut dyn RenderSink,
    ) -> Result<Submission, Error> {
        let result = self.run_submission(prompt, image, sink).await;
        if let Err(err) = &result {
            warn!("submission failed: {err}");
            sink.error(&err.to_string());
        }
        result
    }

    async fn run_submission(
        &mut self,
        prompt: &str,
        image: Option<ImageAttachment>,
        sink: &mut dyn RenderSink,
    ) -> Result<Submission, Error> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::validation().with_reason("the prompt is empty"));
        }

        let state = &mut self.state;
        state.transcript.push(Turn::user(prompt, image.clone()));
        let mut content = UserContent::text(prompt);
        if let Some(image) = image {
            content = content.with_image(image);
        }

        let mut reply_stream = state
            .chat
            .send(
                content,
                &state.params.generation_config,
                &state.params.safety_settings,
            )
            .await?;
        let reply = self.presenter.present(&mut reply_stream, sink).await?;
        drop(reply_stream);

        let language = state.params.language;
        let persisted_text = if language.is_default() {
            reply.clone()
        } else {
            debug!("translating reply to {language}");
            let translated = self
                .translator
                .translate(&reply, language.code)
                .await
                .map_err(|err| {
                    Error::service(Stage::Translation)
                        .with_reason(err.message())
                })?;
            sink.translated(language.name, &translated);
            translated
        };
        state.transcript.push(Turn::assistant(persisted_text.clone()));

        let text_path = self.store.save_text(&persisted_text).await?;
        let audio_path = speak_to_store(
            self.synthesizer.as_ref(),
            &self.store,
            &persisted_text,
            language.code,
        )
        .await?;
        info!("reply saved to {}", self.store.dir().display());

        Ok(Submission {
            reply,
            persisted_text,
            text_path,
            audio_path,
        })
    }

    /// Starts over with the greeting and a new remote conversation.
    pub fn clear_history(&mut self) {
        info!("clearing chat history");
        self.state.reset();
    }

    /// The whole session state.
    #[inline]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The visible transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    /// The parameters the next submission uses.
    #[inline]
    pub fn parameters(&self) -> &SessionParameters {
        &self.state.params
    }

    /// Mutable access to the parameters, for use between submissions.
    #[inline]
    pub fn parameters_mut(&mut self) -> &mut SessionParameters {
        &mut self.state.params
    }

    /// Where the artifacts live.
    #[inline]
    pub fn output_store(&self) -> &OutputStore {
        &self.store
    }
}
