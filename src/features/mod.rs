//! Feature-level workflows built on the persistence layer.

pub mod schemes;

pub use schemes::{AlwaysConfirm, Confirm, Prompt, SchemeService};
