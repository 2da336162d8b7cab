//! Parsing of the REPL input line.

use std::path::PathBuf;

use vts_chat_core::ArtifactKind;
use vts_chat_model::{HarmBlockThreshold, HarmCategory};

use crate::error::Error;

/// What to do with the image attached to following prompts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageCommand {
    /// Show the attached image, if any.
    Show,
    /// Attach the image at this path.
    Attach(PathBuf),
    /// Stop attaching an image.
    Clear,
}

/// One line of user input.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Send this prompt.
    Send(String),
    /// List the languages, or select one by name or code.
    Language(Option<String>),
    /// Manage the attached image.
    Image(ImageCommand),
    /// Set the temperature.
    Temperature(f32),
    /// Set the maximum number of output tokens.
    MaxTokens(u32),
    /// Set top-p.
    TopP(f32),
    /// Set top-k.
    TopK(u32),
    /// Show the thresholds, or set one.
    Safety(Option<(HarmCategory, HarmBlockThreshold)>),
    /// Show all parameters.
    Params,
    /// Copy the text artifact to the clipboard.
    Copy,
    /// Play the audio artifact.
    Listen,
    /// Copy an artifact somewhere else.
    Download(ArtifactKind, Option<PathBuf>),
    /// Clear Chat History.
    Clear,
    /// Show the transcript again.
    History,
    /// Show the command list.
    Help,
    /// Leave.
    Quit,
}

/// Shown by `/help`.
pub const HELP: &str = "\
Type a message to send it. Commands:
  /lang [name|code]             list languages or pick the response language
  /image [<path>|clear]         attach a jpg/png image to following messages
  /temperature <0-2>            sampling temperature
  /max-tokens <1-4096>          maximum output tokens
  /top-p <0-1>                  nucleus sampling
  /top-k <0-50>                 top-k sampling
  /safety [<category> <level>]  show or set a safety threshold
                                levels: none, low, medium, high
  /params                       show the current parameters
  /copy                         copy the last response to the clipboard
  /listen                       play the last response
  /download-text [dest]         save response.txt somewhere else
  /download-mp3 [dest]          save response.mp3 somewhere else
  /clear                        clear the chat history
  /history                      show the conversation
  /help                         show this help
  /quit                         exit";

/// Parses one input line. Blank lines give `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Send(line.to_owned())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let arg = (!args.is_empty()).then_some(args);

    let command = match name {
        "lang" | "language" => Command::Language(arg.map(str::to_owned)),
        "image" => Command::Image(match arg {
            None => ImageCommand::Show,
            Some("clear") => ImageCommand::Clear,
            Some(path) => ImageCommand::Attach(PathBuf::from(path)),
        }),
        "temperature" => Command::Temperature(parse_number(name, arg)?),
        "max-tokens" => Command::MaxTokens(parse_number(name, arg)?),
        "top-p" => Command::TopP(parse_number(name, arg)?),
        "top-k" => Command::TopK(parse_number(name, arg)?),
        "safety" => Command::Safety(match arg {
            None => None,
            Some(args) => Some(parse_threshold(args)?),
        }),
        "params" => Command::Params,
        "copy" => Command::Copy,
        "listen" => Command::Listen,
        "download-text" => {
            Command::Download(ArtifactKind::Text, arg.map(PathBuf::from))
        }
        "download-mp3" => {
            Command::Download(ArtifactKind::Audio, arg.map(PathBuf::from))
        }
        "clear" => Command::Clear,
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => {
            return Err(Error::invalid_input()
                .with_reason(format!("unknown command `/{name}`, try /help")));
        }
    };
    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(
    name: &str,
    arg: Option<&str>,
) -> Result<T, Error> {
    let Some(arg) = arg else {
        return Err(
            Error::invalid_input().with_reason(format!("/{name} needs a value"))
        );
    };
    arg.parse().map_err(|_| {
        Error::invalid_input()
            .with_reason(format!("`{arg}` is not a valid value for /{name}"))
    })
}

fn slug(label: &str) -> String {
    label.to_ascii_lowercase().replace([' ', '_'], "-")
}

fn parse_threshold(
    args: &str,
) -> Result<(HarmCategory, HarmBlockThreshold), Error> {
    let mut words = args.split_whitespace();
    let (Some(category), Some(level), None) =
        (words.next(), words.next(), words.next())
    else {
        return Err(Error::invalid_input()
            .with_reason("usage: /safety <category> <level>"));
    };

    let category_slug = slug(category);
    let matches: Vec<HarmCategory> = HarmCategory::ALL
        .into_iter()
        .filter(|c| slug(c.label()).starts_with(&category_slug))
        .collect();
    let category = match matches[..] {
        [category] => category,
        [] => {
            return Err(Error::invalid_input().with_reason(format!(
                "unknown category `{category}`, expected one of: dangerous, \
                 harassment, hate, sexual"
            )));
        }
        _ => {
            let labels: Vec<&str> = matches.iter().map(|c| c.label()).collect();
            return Err(Error::invalid_input().with_reason(format!(
                "`{category}` could be any of: {}",
                labels.join(", ")
            )));
        }
    };

    let threshold = match slug(level).as_str() {
        "none" | "allow" | "allow-all" => HarmBlockThreshold::BlockNone,
        "low" => HarmBlockThreshold::BlockLowAndAbove,
        "medium" => HarmBlockThreshold::BlockMediumAndAbove,
        "high" => HarmBlockThreshold::BlockOnlyHigh,
        _ => {
            return Err(Error::invalid_input().with_reason(format!(
                "unknown level `{level}`, expected none, low, medium or high"
            )));
        }
    };
    Ok((category, threshold))
}
