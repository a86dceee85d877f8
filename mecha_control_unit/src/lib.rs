//! # Mecha Control Unit Library
//!
//! Cooperative control core for a small competition robot. One logical
//! thread runs a fixed-period tick; every component is a [`task::Task`]
//! invoked in a fixed phase order, and nothing ever blocks.
//!
//! ## Per-Tick Data Flow
//!
//! 1. **Pre-periodic**: edge dispatchers sample digital words and notify
//!    listeners; the state machine evaluates its pending wait.
//! 2. **Periodic**: application tasks.
//! 3. **Mode handler**: the autonomous or teleop routine issues targets.
//! 4. **Post-periodic**: PID motors and the PID drive compute outputs,
//!    write actuators and signal completion events.
//!
//! Completion events raised in step 4 are consumed by the state machine in
//! step 1 of the next tick.

pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod event;
pub mod inert;
pub mod input;
pub mod params;
pub mod robot;
pub mod state;
pub mod task;
