use crate::error::ParameterError;
use serde::{Deserialize, Serialize};

/// Universal mix controls shared by every effect node.
/// Node-specific parameter ids stay below 100.
pub const PARAM_WET: u32 = 100;
pub const PARAM_DRY: u32 = 101;

/// Port definition for node inputs/outputs
///
/// Every port carries interleaved stereo audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePort {
    pub name: String,
    pub index: usize,
}

impl NodePort {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Node category for diagnostics and stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    Generator,
    Effect,
    Utility,
    Output,
}

/// User-facing parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub id: u32,
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: ParameterUnit,
    /// Smoothed parameters glide toward a new value instead of jumping to it
    pub smoothed: bool,
}

impl Parameter {
    pub fn new(id: u32, name: impl Into<String>, min: f32, max: f32, default: f32, unit: ParameterUnit) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
            unit,
            smoothed: false,
        }
    }

    /// Mark the parameter as ramped rather than stepped
    pub fn smoothed(mut self) -> Self {
        self.smoothed = true;
        self
    }
}

/// Units for parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterUnit {
    Generic,
    Frequency,  // Hz
    Decibels,   // dB
    Time,       // seconds
    Semitones,
    Degrees,
    Choice,     // index into a fixed list of names
}

/// Reject NaN and infinities before they reach DSP state
pub fn check_finite(id: u32, value: f32) -> Result<f32, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NonFinite { id })
    }
}

/// Errors that can occur during graph operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid port index")]
    InvalidPort,
    #[error("node is not part of the graph")]
    UnknownNode,
    #[error("connection would create a cycle")]
    WouldCreateCycle,
}
