//! Runtime-tunable parameters addressed by name.
//!
//! A component that exposes tunables implements [`ConfigurableParams`].
//! Lookups of an unknown name return [`ParamError::UnknownParam`], whose
//! [`code`](ParamError::code) is what a configuration front-end reports.
//! A failed `set_param` leaves the component unchanged.

use std::fmt;

use crate::control::pid::PidGains;
use crate::error::ParamError;

/// Value read back from a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Scalar(f64),
    Gains(PidGains),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v}"),
            Self::Gains(g) => write!(f, "Kp={} Ki={} Kd={}", g.kp, g.ki, g.kd),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub writable: bool,
}

impl ParamDescriptor {
    pub const fn read_only(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            writable: false,
        }
    }

    pub const fn writable(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            writable: true,
        }
    }
}

pub trait ConfigurableParams {
    /// Every parameter this component answers to.
    fn param_descriptors(&self) -> &'static [ParamDescriptor];

    fn get_param(&self, name: &str) -> Result<ParamValue, ParamError>;

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ParamError>;

    fn find_param(&self, name: &str) -> Result<&'static ParamDescriptor, ParamError> {
        self.param_descriptors()
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ParamError::UnknownParam(name.to_owned()))
    }
}

/// Gains must be finite and non-negative.
pub fn check_gain(name: &str, value: f64) -> Result<f64, ParamError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ParamError::InvalidValue {
            name: name.to_owned(),
            value,
        })
    }
}
