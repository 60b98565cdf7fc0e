//! `ProgressReporter` that prints apply progress as status lines.

use crate::application::ports::ProgressReporter;
use crate::output::{Marker, OutputContext};

/// Prints each apply event through an [`OutputContext`], so quiet mode and
/// colour settings apply to progress too.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.ctx.status(Marker::Step, message);
    }

    fn success(&self, message: &str) {
        self.ctx.status(Marker::Done, message);
    }

    fn warn(&self, message: &str) {
        self.ctx.status(Marker::Warn, message);
    }
}
