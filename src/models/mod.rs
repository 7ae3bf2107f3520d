#![allow(unused_imports)]
// file: src/models/mod.rs

// Declare modules
pub mod prayer;
pub mod settings;

// Re-export all public types to keep imports flat for external callers,
// e.g. `use openathan::models::Prayer`.
pub use prayer::{Prayer, PrayerDay};
pub use settings::AthanSettings;
