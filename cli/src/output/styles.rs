//! Terminal stylesheet.

use owo_colors::Style;

/// One style per kind of output. Everything is plain unless built with
/// [`Styles::colored`].
#[derive(Default, Clone, Copy)]
pub struct Styles {
    pub done: Style,
    pub warn: Style,
    pub step: Style,
    /// Keys of key/value lines.
    pub label: Style,
    pub title: Style,
}

impl Styles {
    #[must_use]
    pub fn colored() -> Self {
        Self {
            done: Style::new().green(),
            warn: Style::new().yellow(),
            step: Style::new().cyan(),
            label: Style::new().dimmed(),
            title: Style::new().bold().cyan(),
        }
    }
}
