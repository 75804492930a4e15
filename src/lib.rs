//! taskloom
//!
//! An embeddable application runtime: a cooperative task scheduler running on
//! named worker threads, and a filtered event bus layered on top of it.
//!
//! # Example
//!
//! ```no_run
//! use taskloom::{Event, Runtime, RuntimeConfig, Task};
//!
//! fn main() -> anyhow::Result<()> {
//!     let runtime = Runtime::new(RuntimeConfig::default())?;
//!     let io = runtime.tasks().create_thread("io")?;
//!     io.add_task(Task::once("greet", |_| println!("hello")));
//!
//!     runtime.events().create_event_type("ping")?;
//!     runtime.events().add_callback("ping", |_| true)?;
//!     assert!(runtime.events().trigger_event(&Event::new("ping"))?);
//!     Ok(())
//! }
//! ```
//!
//! # Crate Features
//!
//! - `debug`: trace every task step

#![doc(html_root_url = "https://docs.rs/taskloom")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use runtime::{
    Event, EventManager, EventType, Listener, Result, Runtime, RuntimeError, Task, TaskManager,
    TaskStatus, Value, WorkerThread,
};
pub use util::config::RuntimeConfig;

use anyhow::Context;
use std::path::Path;
use tracing::debug;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "taskloom";

/// Install the default subscriber at the configured level and build a
/// [`Runtime`].
pub fn start(config: RuntimeConfig) -> anyhow::Result<Runtime> {
    util::logger::try_init_with_level(config.log.level);
    debug!("{} {} starting", NAME, VERSION);
    Runtime::new(config).context("Failed to start runtime")
}

/// Like [`start`], reading the configuration from a TOML file when it exists.
pub fn start_from_file(path: &Path) -> anyhow::Result<Runtime> {
    let config = RuntimeConfig::load_or_default(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    start(config)
}
