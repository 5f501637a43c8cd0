//! Colored terminal output for CLI commands.
//!
//! Respects `NO_COLOR` and the `--color` flag.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer over stdout
pub struct StyledOutput {
    stdout: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stdout.set_color(&spec);
        let _ = write!(self.stdout, "{}", text);
        let _ = self.stdout.reset();
    }

    /// Bold heading followed by a newline
    pub fn heading(&mut self, text: &str) {
        self.write_styled(text, None, true);
        self.newline();
    }

    /// Green bold text.
    pub fn success(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Green), true);
    }

    /// Yellow bold text.
    pub fn warning(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Yellow), true);
    }

    /// Cyan text.
    pub fn info(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Cyan), false);
    }

    /// Plain text (no color).
    pub fn plain(&mut self, text: &str) {
        let _ = write!(self.stdout, "{}", text);
    }

    pub fn newline(&mut self) {
        let _ = writeln!(self.stdout);
    }

    pub fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}
