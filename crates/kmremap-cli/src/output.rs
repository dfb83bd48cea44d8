//! Colored terminal output
//!
//! Respects `NO_COLOR` and the `--color` flag.

use kmremap::Diagnostic;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from the CLI flag and environment.
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

/// Styled writer for status lines on stderr
pub struct StyledOutput {
    stderr: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stderr: StandardStream::stderr(choice),
        }
    }

    fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stderr.set_color(&spec);
        let _ = write!(self.stderr, "{}", text);
        let _ = self.stderr.reset();
    }

    /// `label` in green, then `text`
    pub fn success(&mut self, label: &str, text: &str) {
        self.write_styled(label, Some(Color::Green), true);
        let _ = writeln!(self.stderr, " {}", text);
    }

    /// `label` in cyan, then `text`
    pub fn info(&mut self, label: &str, text: &str) {
        self.write_styled(label, Some(Color::Cyan), true);
        let _ = writeln!(self.stderr, " {}", text);
    }

    /// One advisory diagnostic
    pub fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.write_styled("warning:", Some(Color::Yellow), true);
        let _ = writeln!(self.stderr, " {}", diagnostic);
    }
}
