//! Command handlers for the `parlance` binary.

pub mod config;
pub mod models;
pub mod serve;
pub mod translate;
