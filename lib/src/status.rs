use std::borrow::Cow;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// One status line for the whole run. `update` overwrites the previous
/// message (last write wins); `finish` restyles the line by severity and
/// leaves it on screen. There is no message history.
pub struct StatusLine {
    bar: ProgressBar,
}

impl StatusLine {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner().with_style(running_style());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn update(&self, message: impl Into<Cow<'static, str>>) {
        self.bar.set_message(message);
    }

    pub fn finish(&self, severity: Severity, message: impl Into<Cow<'static, str>>) {
        self.bar.set_style(final_style(severity));
        self.bar.finish_with_message(message);
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

fn running_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .expect("always valid if tests pass")
}

fn final_style(severity: Severity) -> ProgressStyle {
    let template = match severity {
        Severity::Info => "• {msg:.cyan}",
        Severity::Success => "✓ {msg:.green}",
        Severity::Error => "✗ {msg:.red}",
    };
    ProgressStyle::with_template(template).expect("always valid if tests pass")
}
