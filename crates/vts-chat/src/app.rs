//! Applies REPL commands to a session.

use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use vts_chat_core::language::{LANGUAGES, find_language};
use vts_chat_core::{ArtifactKind, RenderSink, SessionController};
use vts_chat_model::{GenerationConfig, ImageAttachment, RangeError};

use crate::actions::{Clipboard, SystemClipboard, load_image, play_audio};
use crate::commands::{Command, HELP, ImageCommand};
use crate::error::Error;

/// Whether the REPL keeps going after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the REPL.
    Quit,
}

struct AttachedImage {
    path: PathBuf,
    attachment: ImageAttachment,
}

/// The REPL state around a [`SessionController`].
pub struct App {
    controller: SessionController,
    image: Option<AttachedImage>,
    audio_player: Option<String>,
    clipboard: Box<dyn Clipboard>,
}

impl App {
    /// Wraps a controller. `audio_player` overrides the platform player.
    pub fn new(
        controller: SessionController,
        audio_player: Option<String>,
    ) -> Self {
        Self {
            controller,
            image: None,
            audio_player,
            clipboard: Box::new(SystemClipboard::default()),
        }
    }

    /// Uses `clipboard` for `/copy` instead of the system one.
    pub fn with_clipboard<C: Clipboard + 'static>(
        mut self,
        clipboard: C,
    ) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    /// The wrapped controller.
    #[inline]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// The path of the image sent with the next prompt.
    #[inline]
    pub fn image_path(&self) -> Option<&Path> {
        self.image.as_ref().map(|image| image.path.as_path())
    }

    /// Runs one command.
    ///
    /// A failed send has already been reported through `sink` and is not
    /// returned again.
    pub async fn handle(
        &mut self,
        command: Command,
        sink: &mut dyn RenderSink,
    ) -> Result<Flow, Error> {
        match command {
            Command::Send(prompt) => {
                let image = self.image.as_ref().map(|i| i.attachment.clone());
                if self.controller.submit(&prompt, image, sink).await.is_ok() {
                    self.print_actions();
                }
            }
            Command::Language(None) => self.print_languages(),
            Command::Language(Some(query)) => {
                let language = find_language(&query).ok_or_else(|| {
                    Error::invalid_input()
                        .with_reason(format!("unknown language `{query}`"))
                })?;
                self.controller.parameters_mut().language = *language;
                println!("Responses will be in {}.", language.name.bold());
            }
            Command::Image(ImageCommand::Show) => match self.image_path() {
                Some(path) => println!("Attached image: {}", path.display()),
                None => println!("No image attached."),
            },
            Command::Image(ImageCommand::Attach(path)) => {
                let attachment = load_image(&path).await?;
                println!(
                    "Attached {} ({} bytes) to following messages.",
                    path.display(),
                    attachment.data.len()
                );
                self.image = Some(AttachedImage { path, attachment });
            }
            Command::Image(ImageCommand::Clear) => {
                self.image = None;
                println!("Image removed.");
            }
            Command::Temperature(value) => {
                self.update_generation(|c| c.set_temperature(value))?;
            }
            Command::MaxTokens(value) => {
                self.update_generation(|c| c.set_max_output_tokens(value))?;
            }
            Command::TopP(value) => {
                self.update_generation(|c| c.set_top_p(value))?;
            }
            Command::TopK(value) => {
                self.update_generation(|c| c.set_top_k(value))?;
            }
            Command::Safety(None) => self.print_safety(),
            Command::Safety(Some((category, threshold))) => {
                self.controller
                    .parameters_mut()
                    .safety_settings
                    .set(category, threshold);
                println!("{}: {}", category.bold(), threshold);
            }
            Command::Params => {
                let params = self.controller.parameters();
                let config = &params.generation_config;
                println!("Language:              {}", params.language);
                println!("Temperature:           {}", config.temperature());
                println!(
                    "Maximum Output Tokens: {}",
                    config.max_output_tokens()
                );
                println!("Top-P sampling:        {}", config.top_p());
                println!("Top-K sampling:        {}", config.top_k());
                self.print_safety();
            }
            Command::Copy => {
                let store = self.controller.output_store();
                if !store.exists(ArtifactKind::Text) {
                    return Err(Error::action_failed()
                        .with_reason("there is no response to copy yet"));
                }
                let text = store.read_text().await?;
                self.clipboard.set_text(&text)?;
                println!("{}", "Response copied to the clipboard.".green());
            }
            Command::Listen => {
                let store = self.controller.output_store();
                if !store.exists(ArtifactKind::Audio) {
                    return Err(Error::action_failed()
                        .with_reason("there is no audio to play yet"));
                }
                play_audio(
                    &store.path(ArtifactKind::Audio),
                    self.audio_player.as_deref(),
                )?;
                println!("Playing {}...", ArtifactKind::Audio);
            }
            Command::Download(kind, destination) => {
                let destination =
                    destination.unwrap_or_else(|| PathBuf::from("."));
                let target = self
                    .controller
                    .output_store()
                    .copy_to(kind, &destination)
                    .await?;
                println!(
                    "Saved {kind} ({}) to {}",
                    kind.mime_type(),
                    target.display()
                );
            }
            Command::Clear => {
                self.controller.clear_history();
                self.print_transcript();
            }
            Command::History => self.print_transcript(),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn update_generation<F>(&mut self, update: F) -> Result<(), Error>
    where
        F: FnOnce(&mut GenerationConfig) -> Result<(), RangeError>,
    {
        update(&mut self.controller.parameters_mut().generation_config)
            .map_err(|err| Error::invalid_input().with_reason(err.to_string()))
    }

    /// Prints every turn of the transcript.
    pub fn print_transcript(&self) {
        for turn in self.controller.transcript().turns() {
            let role = turn.role().to_string();
            println!("{}: {}", role.bold(), turn.content());
            if let Some(image) = turn.image() {
                println!(
                    "  [{} image, {} bytes]",
                    image.mime_type,
                    image.data.len()
                );
            }
        }
    }

    fn print_languages(&self) {
        let current = self.controller.parameters().language;
        for language in LANGUAGES.iter() {
            let marker = if *language == current { "*" } else { " " };
            println!("{marker} {:<12} {}", language.name, language.code);
        }
    }

    fn print_safety(&self) {
        let safety_settings = &self.controller.parameters().safety_settings;
        for (category, threshold) in safety_settings.iter() {
            println!("{:<22} {}", format!("{category}:"), threshold);
        }
    }

    fn print_actions(&self) {
        let store = self.controller.output_store();
        let mut actions = vec!["/copy"];
        if store.exists(ArtifactKind::Text) {
            actions.push("/download-text");
        }
        if store.exists(ArtifactKind::Audio) {
            actions.extend(["/listen", "/download-mp3"]);
        }
        actions.push("/clear");
        println!("{}", actions.join("  ").dimmed());
    }
}
