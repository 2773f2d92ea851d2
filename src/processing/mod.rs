//! Position estimation and the tracking loop

pub mod kalman;
pub mod tracker;

pub use kalman::{PositionKalmanFilter, CorrectionOutcome, SkipReason};
pub use tracker::{AnchorTracker, TrackHealth, TrackerStats, TickReport, TrackerError, TrackerResult};
