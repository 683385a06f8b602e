//! Tercüman - English to Turkish news translation
//!
//! Normalizes raw news text, translates it through an ordered chain of
//! providers, filters out results that still look like English, and produces
//! short Turkish summaries with a sentiment label.

pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod language;
pub mod normalize;
pub mod providers;
pub mod retry;
pub mod server;
pub mod service;
pub mod summary;
pub mod validate;
