//! The `vts-chat` terminal client.

#[macro_use]
extern crate tracing;

mod terminal;

use std::io::Write as _;
use std::process::ExitCode;

use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use vts_chat::commands::parse_command;
use vts_chat::config::AppConfig;
use vts_chat::core::{NoPacing, RenderSink, SessionBuilder};
use vts_chat::services::{GoogleTts, MyMemoryTranslator};
use vts_chat::{App, Flow};
use vts_chat_gemini_model::GeminiProvider;

use crate::terminal::TerminalSink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("starting with {config:?}");

    let http_client = reqwest::Client::new();
    let provider = GeminiProvider::new(config.gemini_config());
    let mut builder = SessionBuilder::with_model_provider(provider)
        .translator(MyMemoryTranslator::new(http_client.clone()))
        .speech_synthesizer(GoogleTts::new(http_client))
        .output_dir(config.output_dir.clone());
    if !config.typing_effect {
        builder = builder.pacing(NoPacing);
    }
    let controller = match builder.build() {
        Ok(controller) => controller,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(controller, config.audio_player.clone());
    let mut sink = TerminalSink::new();
    let mut lines = BufReader::new(io::stdin()).lines();

    app.print_transcript();
    println!("{}", "Type /help for commands.".dimmed());

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut lines).await else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                sink.error(&err.to_string());
                continue;
            }
        };
        match app.handle(command, &mut sink).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => sink.error(&err.to_string()),
        }
    }
    ExitCode::SUCCESS
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    match lines.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
