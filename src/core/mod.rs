//! Core functionality for Vitals View.
//!
//! This module contains:
//! - Calendar arithmetic for the trailing step window
//! - The query adapter bridging store callbacks to awaitable results
//! - The presenter that sequences a fetch cycle and shapes display state

pub mod adapter;
pub mod clock;
pub mod presenter;
pub mod readings;
pub mod window;

// Re-export commonly used types
pub use adapter::QueryAdapter;
pub use clock::{Clock, FixedClock, SystemClock};
pub use presenter::{format_bpm, format_timestamp, CycleOutcome, DisplayState, Presenter};
pub use readings::{HeartRateReading, StepDay};
pub use window::{iso_week_anchor, TrailingWindow};
