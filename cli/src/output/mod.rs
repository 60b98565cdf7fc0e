//! Output formatting module

pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Leading glyph of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Step,
    Done,
    Warn,
}

impl Marker {
    fn glyph(self) -> &'static str {
        match self {
            Self::Step => "→",
            Self::Done => "✓",
            Self::Warn => "!",
        }
    }
}

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();
        Self {
            styles: if use_colors {
                Styles::colored()
            } else {
                Styles::default()
            },
            is_tty,
            quiet,
        }
    }

    /// Render `msg` behind the styled glyph for `marker`.
    #[must_use]
    pub fn status_line(&self, marker: Marker, msg: &str) -> String {
        let style = match marker {
            Marker::Step => self.styles.step,
            Marker::Done => self.styles.done,
            Marker::Warn => self.styles.warn,
        };
        format!("  {} {msg}", marker.glyph().style(style))
    }

    /// Print a status line. Suppressed when `quiet`.
    pub fn status(&self, marker: Marker, msg: &str) {
        if !self.quiet {
            println!("{}", self.status_line(marker, msg));
        }
    }

    pub fn success(&self, msg: &str) {
        self.status(Marker::Done, msg);
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.style(self.styles.title));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.label));
        }
    }

    /// Print one list item. Suppressed when `quiet`.
    pub fn item(&self, msg: &str) {
        if !self.quiet {
            println!("    {msg}");
        }
    }
}
