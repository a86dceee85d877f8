//! Sequencing state machines.

pub mod machine;
