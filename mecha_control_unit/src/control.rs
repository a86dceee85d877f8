//! Closed-loop control: PID core, single-motor and drivetrain wrappers,
//! and the drivetrain kinematics they share.
//!
//! Controllers are computed once per tick in the post-periodic phase, after
//! the application has issued its targets.

pub mod drive;
pub mod kinematics;
pub mod motor;
pub mod pid;
