//! Robot-level configuration and mode types.

pub mod config;
pub mod state;
