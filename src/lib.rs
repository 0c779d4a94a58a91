//! Mockup Schemes - persistence for saved app-store listing mock-ups.
//!
//! The editor lets a user snapshot the mock-up they are working on as a named
//! "scheme" and come back to it later. This crate stores those schemes:
//! 1. A key-value adapter over a persistent string store (`storage`)
//! 2. A repository keeping an ordered id index plus one blob per scheme,
//!    with a one-time migration from the older single-blob format (`schemes`)
//! 3. The save/load/rename/delete workflows the editor drives (`features`)
//!
//! Storage failures never reach the editor as errors: unreadable data is
//! treated as absent and logged.
//!
//! # Example
//!
//! ```
//! use mockup_schemes::core::models::{MockupConfig, SavedScheme};
//! use mockup_schemes::schemes::{SchemeRepository, SchemeStore};
//! use mockup_schemes::storage::MemoryStore;
//!
//! # async fn demo() {
//! let repo = SchemeRepository::new(MemoryStore::new());
//!
//! let scheme = SavedScheme::capture("Launch draft", &MockupConfig::default());
//! repo.add_scheme(&scheme).await;
//!
//! let schemes = repo.list_schemes().await;
//! assert_eq!(schemes[0].name, "Launch draft");
//! # }
//! ```
pub mod core;
pub mod errors;
pub mod features;
pub mod schemes;
pub mod storage;

pub use errors::{SchemeError, StorageError};

/// Configure structured logging with JSON output.
///
/// Safe to call more than once; only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// mockup_schemes::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
