//! Anchor Tracking
//!
//! Constant-velocity Kalman filter estimating 3-axis position and velocity
//! of a vehicle from absolute position fixes, plus the tracking loop,
//! configuration and output plumbing around it.

pub mod core;
pub mod processing;
pub mod utils;
pub mod hardware;
pub mod api;

// Re-export commonly used types
pub use crate::core::{Vect3, PositionFix, SpeedKind, Estimate};
pub use processing::{
    PositionKalmanFilter, CorrectionOutcome, SkipReason,
    AnchorTracker, TrackHealth, TrackerStats, TickReport, TrackerError, TrackerResult,
};
pub use utils::{ConfigurationManager, ConfigError, FilterConfig, TrackerConfig};
pub use hardware::{PositionSource, MockPositionSource, SourceError, SourceResult};
pub use api::{EstimateFormatter, EstimateRecord, OutputFormat};
