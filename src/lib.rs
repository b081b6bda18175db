//! Vitals View - read-only weekly health summary.
//!
//! This library asks a platform health-data service for read access to step
//! count and heart rate, fetches the last seven days of step totals and the
//! most recent heart-rate reading, and shapes them for display.
//!
//! # Guarantees
//!
//! - **Read only**: access is requested for reading; nothing is ever written
//! - **One prompt**: a fetch cycle shows the permission prompt once
//! - **No retention**: every cycle is a full re-fetch; nothing is cached or stored
//! - **Resumed once**: each query resumes its caller exactly once, whatever
//!   the store does with its callbacks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Vitals View                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Presenter  │──▶│   Query     │──▶│ HealthStore │        │
//! │  │  (cycle)    │◀──│   Adapter   │◀──│ (callbacks) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                 │                                 │
//! │         ▼                 ▼                                 │
//! │  ┌─────────────┐   ┌─────────────┐                          │
//! │  │    View     │   │   Bridge    │                          │
//! │  │ (text/json) │   │ (resolve 1x)│                          │
//! │  └─────────────┘   └─────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vitals_view::{config::Config, core::{Presenter, QueryAdapter}, render::TextView, store};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?.validate()?;
//! let store = Arc::new(store::SimulatedStore::demo(
//!     chrono::Utc::now(),
//!     config.timezone,
//!     store::SimulatedBehavior::default(),
//! ));
//!
//! let adapter = QueryAdapter::new(store, &config);
//! let mut presenter = Presenter::new(adapter, &config);
//! presenter.present(&mut TextView::stdout()).await;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod render;
pub mod store;

// Re-export key types at crate root for convenience
pub use crate::config::{Config, ValidatedConfig};
pub use crate::core::{CycleOutcome, DisplayState, HeartRateReading, Presenter, QueryAdapter, StepDay};
pub use crate::error::{ConfigError, QueryError, StoreError};
pub use crate::render::{TextView, View};
pub use crate::store::{DataKind, HealthStore, NoopStore, SimulatedStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Access declaration that can be displayed to users.
pub const ACCESS_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║               VITALS VIEW - HEALTH DATA ACCESS                   ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This app asks once for permission to READ:                      ║
║    • Step count (daily totals for the last 7 days)               ║
║    • Heart rate (the single most recent reading)                 ║
║                                                                  ║
║  ✗ IT NEVER:                                                     ║
║    • Writes or changes any health data                           ║
║    • Stores, caches or syncs what it reads                       ║
║    • Sends health data anywhere                                  ║
║                                                                  ║
║  If access is declined, nothing is fetched and nothing is shown. ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
