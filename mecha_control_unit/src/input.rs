//! Digital input processing: bit-level change detection, joystick reads and
//! the line-following light array.

pub mod edge;
pub mod joystick;
pub mod line;
