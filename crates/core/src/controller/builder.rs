use std::path::PathBuf;

use vts_chat_model::ModelProvider;

use super::{SYSTEM_INSTRUCTION, SessionController, SessionState};
use crate::error::{Error, Stage};
use crate::model_client::ModelClient;
use crate::output::OutputStore;
use crate::presenter::{Pacing, Presenter};
use crate::speech::SpeechSynthesizer;
use crate::translation::Translator;

/// [`SessionController`] builder.
pub struct SessionBuilder {
    model_client: ModelClient,
    system_instruction: Option<String>,
    translator: Option<Box<dyn Translator>>,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    presenter: Presenter,
    output_dir: PathBuf,
}

impl SessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_instruction: Some(SYSTEM_INSTRUCTION.to_owned()),
            translator: None,
            synthesizer: None,
            presenter: Presenter::default(),
            output_dir: PathBuf::from("output"),
        }
    }

    /// Replaces the default system instruction. `None` sends none.
    #[inline]
    pub fn system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Sets the translation backend.
    #[inline]
    pub fn translator<T: Translator + 'static>(
        mut self,
        translator: T,
    ) -> Self {
        self.translator = Some(Box::new(translator));
        self
    }

    /// Sets the speech backend.
    #[inline]
    pub fn speech_synthesizer<S: SpeechSynthesizer + 'static>(
        mut self,
        synthesizer: S,
    ) -> Self {
        self.synthesizer = Some(Box::new(synthesizer));
        self
    }

    /// Changes how the streamed reply is paced.
    #[inline]
    pub fn pacing<P: Pacing + 'static>(mut self, pacing: P) -> Self {
        self.presenter = Presenter::new(pacing);
        self
    }

    /// Where the artifacts are written. Defaults to `output`.
    #[inline]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builds the controller, creating the output directory.
    pub fn build(self) -> Result<SessionController, Error> {
        let SessionBuilder {
            model_client,
            system_instruction,
            translator,
            synthesizer,
            presenter,
            output_dir,
        } = self;

        let translator = translator.ok_or_else(|| {
            Error::service(Stage::Translation)
                .with_reason("no translator configured")
        })?;
        let synthesizer = synthesizer.ok_or_else(|| {
            Error::service(Stage::Speech)
                .with_reason("no speech synthesizer configured")
        })?;
        let store = OutputStore::open(output_dir)?;

        Ok(SessionController {
            state: SessionState::new(model_client, system_instruction),
            presenter,
            translator,
            synthesizer,
            store,
        })
    }
}
