//! Mecha Common Library
//!
//! Shared constants, configuration loading and hardware capability traits
//! for the mecha robot control core.
//!
//! # Module Structure
//!
//! - [`consts`] - Cycle, capacity and state-machine constants
//! - [`config`] - Configuration loading traits and types
//! - [`robot`] - Robot configuration and mode types
//! - [`hal`] - Narrow hardware capabilities consumed by the control core
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use mecha_common::prelude::*;
//! use mecha_common::robot::config::RobotConfig;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod robot;
