/*
[INPUT]:  Public API exports for grindery-safe-embed crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod embed;
pub mod runner;

pub use config::EmbedConfig;
pub use embed::{View, WAITING_TEXT};
pub use runner::{RunOutcome, run};
