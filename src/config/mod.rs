//! Configuration module for Kino.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{GeneralSettings, LlmSettings, SearchSettings, Settings};
