use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use vts_chat::core::{CURSOR, RenderSink, THINKING};

const BAR_CHAR: &str = "▎";
// Moves back over the cursor and blanks it.
const ERASE_CURSOR: &str = "\x08 \x08";

/// Draws replies on stdout as they stream in.
pub struct TerminalSink {
    style: ProgressStyle,
    spinner: Option<ProgressBar>,
    printed: usize,
    cursor_shown: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        Self {
            style,
            spinner: None,
            printed: 0,
            cursor_shown: false,
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn write_reply(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        if self.printed == 0 && !self.cursor_shown {
            write!(stdout, "{}🤖 ", BAR_CHAR.bright_cyan()).ok();
        }
        if self.cursor_shown {
            stdout.write_all(ERASE_CURSOR.as_bytes()).ok();
        }
        let fresh = text.get(self.printed..).unwrap_or_default();
        write!(stdout, "{}", fresh.bright_white()).ok();
        self.printed = text.len();
        stdout.flush().ok();
    }

    fn reset(&mut self) {
        self.printed = 0;
        self.cursor_shown = false;
    }
}

impl Default for TerminalSink {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for TerminalSink {
    fn thinking(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(self.style.clone());
        spinner.set_message(format!("🤔 {THINKING}"));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
        self.reset();
    }

    fn partial(&mut self, text: &str) {
        self.clear_spinner();
        let text = text.strip_suffix(CURSOR).unwrap_or(text);
        self.write_reply(text);
        print!("{CURSOR}");
        std::io::stdout().flush().ok();
        self.cursor_shown = true;
    }

    fn finished(&mut self, text: &str) {
        self.clear_spinner();
        self.write_reply(text);
        println!();
        self.reset();
    }

    fn translated(&mut self, language: &str, text: &str) {
        let bar = BAR_CHAR.bright_magenta();
        println!("{bar}{}", format!("Response in {language}:").bold());
        println!("{bar}🌐 {}", text.bright_white());
    }

    fn error(&mut self, message: &str) {
        self.clear_spinner();
        if self.cursor_shown {
            print!("{ERASE_CURSOR}");
            println!();
        }
        self.reset();
        println!("{}⚠️  {}", BAR_CHAR.bright_red(), message.red());
    }
}
