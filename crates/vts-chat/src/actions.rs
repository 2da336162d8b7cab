//! Clipboard, playback and image loading.

use std::path::Path;
use std::process::Stdio;

use mime::Mime;
use tokio::process::Command;
use vts_chat_model::ImageAttachment;

use crate::error::Error;

/// Somewhere to put copied text.
pub trait Clipboard {
    /// Replaces the clipboard content with `text`.
    fn set_text(&mut self, text: &str) -> Result<(), Error>;
}

/// The system clipboard.
///
/// Opened on first use and kept open afterwards. On X11 the copied text
/// is served by this process, so it only stays pasteable while the
/// handle lives.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), Error> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(|err| {
                Error::action_failed()
                    .with_reason(format!("clipboard is unavailable: {err}"))
            })?,
        };
        let clipboard = self.inner.insert(clipboard);
        clipboard.set_text(text).map_err(|err| {
            Error::action_failed().with_reason(format!("copy failed: {err}"))
        })
    }
}

#[inline]
fn default_player() -> &'static [&'static str] {
    match std::env::consts::OS {
        "macos" => &["afplay"],
        "windows" => &["cmd", "/C", "start", ""],
        _ => &["mpg123", "-q"],
    }
}

fn player_command(
    player: Option<&str>,
    audio: &Path,
) -> Result<Command, Error> {
    let words: Vec<&str> = match player {
        Some(player) => player.split_whitespace().collect(),
        None => default_player().to_vec(),
    };
    let Some((program, args)) = words.split_first() else {
        return Err(
            Error::invalid_input().with_reason("the audio player is empty")
        );
    };
    let mut command = Command::new(program);
    command.args(args).arg(audio);
    Ok(command)
}

/// Starts playing `audio` with `player`, or a platform default, without
/// waiting for it to finish.
pub fn play_audio(audio: &Path, player: Option<&str>) -> Result<(), Error> {
    let mut command = player_command(player, audio)?;
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| {
            Error::action_failed()
                .with_reason(format!("cannot start the audio player: {err}"))
        })?;

    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!("playback finished"),
            Ok(status) => warn!("audio player exited with {status}"),
            Err(err) => warn!("failed to wait for the audio player: {err}"),
        }
    });
    Ok(())
}

fn image_mime(path: &Path) -> Option<Mime> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some(mime::IMAGE_PNG),
        "jpg" | "jpeg" => Some(mime::IMAGE_JPEG),
        _ => None,
    }
}

/// Reads a jpg or png file to send along with prompts.
pub async fn load_image(path: &Path) -> Result<ImageAttachment, Error> {
    let Some(mime) = image_mime(path) else {
        return Err(Error::invalid_input().with_reason(format!(
            "{} is not a jpg, jpeg or png file",
            path.display()
        )));
    };
    let data = tokio::fs::read(path).await.map_err(|err| {
        Error::action_failed()
            .with_reason(format!("cannot read {}: {err}", path.display()))
    })?;
    Ok(ImageAttachment::new(mime.essence_str(), data))
}
