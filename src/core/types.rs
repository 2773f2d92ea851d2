//! Core data types for the tracker

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 3D point or vector in the local tracking frame (meters, m/s)
pub type Vect3 = Vector3<f32>;

/// Absolute position fix delivered by an anchor-based localization source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub position: Vect3,
    pub timestamp_ms: u64,
}

impl PositionFix {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vect3::new(x, y, z),
            timestamp_ms: 0,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Kind of velocity measurement accepted by the (unsupported) speed update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedKind {
    Ground,
    Air,
    Vertical,
}

/// Snapshot of the tracker estimate, suitable for output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Number of prediction ticks since start
    pub tick: u64,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// 1-sigma position uncertainty per axis (meters)
    pub position_sigma: [f32; 3],
    /// 1-sigma velocity uncertainty per axis (m/s)
    pub velocity_sigma: [f32; 3],
}

impl Estimate {
    pub fn from_vectors(tick: u64, position: Vect3, velocity: Vect3, position_sigma: Vect3, velocity_sigma: Vect3) -> Self {
        Self {
            tick,
            position: position.into(),
            velocity: velocity.into(),
            position_sigma: position_sigma.into(),
            velocity_sigma: velocity_sigma.into(),
        }
    }

    pub fn position(&self) -> Vect3 {
        Vect3::from(self.position)
    }

    pub fn velocity(&self) -> Vect3 {
        Vect3::from(self.velocity)
    }
}
