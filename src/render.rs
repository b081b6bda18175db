//! View layer for the display state.
//!
//! [`TextView`] draws the weekly step chart as horizontal bars followed by
//! the heart-rate sentence.

use crate::core::presenter::DisplayState;
use std::io::{self, Write};

/// Title shown above the chart.
pub const TITLE: &str = "Health Data";

/// Width of the longest bar, in characters.
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Anything that can show a [`DisplayState`].
pub trait View {
    fn render(&mut self, state: &DisplayState) -> io::Result<()>;
}

/// Plain-text rendering to any writer.
pub struct TextView<W: Write> {
    out: W,
    bar_width: usize,
}

impl TextView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TextView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }

    pub fn with_bar_width(mut self, bar_width: usize) -> Self {
        self.bar_width = bar_width.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> View for TextView<W> {
    fn render(&mut self, state: &DisplayState) -> io::Result<()> {
        writeln!(self.out, "{TITLE}")?;
        writeln!(self.out, "{}", "=".repeat(TITLE.len()))?;
        writeln!(self.out)?;

        let max = state.steps.iter().map(|d| d.count).max().unwrap_or(0);
        for day in &state.steps {
            writeln!(
                self.out,
                "{} | {:<width$} {:>6}",
                day.date.format("%a %b %d"),
                bar(day.count, max, self.bar_width),
                day.count,
                width = self.bar_width
            )?;
        }
        if !state.steps.is_empty() {
            writeln!(self.out)?;
        }

        writeln!(self.out, "{}", heart_rate_line(state))?;
        self.out.flush()
    }
}

/// The heart-rate sentence; unset fields render as empty text.
pub fn heart_rate_line(state: &DisplayState) -> String {
    format!(
        "Heart Rate measured on {} was {} count per minute.",
        state.heart_rate_measured_at.as_deref().unwrap_or(""),
        state.heart_rate_value.as_deref().unwrap_or("")
    )
}

/// A bar of `width * count / max` blocks; non-zero counts get at least one.
fn bar(count: u64, max: u64, width: usize) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(len.clamp(1, width))
}
