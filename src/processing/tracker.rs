//! Periodic tracking loop around the position filter
//!
//! One [`AnchorTracker::tick`] equals one sample period: the filter is
//! predicted once, then every fix the source has ready is applied.

use crate::core::{Estimate, PositionFix, Vect3};
use crate::hardware::{PositionSource, SourceError};
use crate::processing::kalman::{CorrectionOutcome, PositionKalmanFilter};
use crate::utils::config::{ConfigError, TrackerConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Upper bound on fixes consumed in a single tick
const MAX_FIXES_PER_TICK: usize = 4;

/// Errors surfaced by the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    Config(ConfigError),
    Source(SourceError),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Config(e) => write!(f, "Tracker configuration error: {}", e),
            TrackerError::Source(e) => write!(f, "Position source error: {}", e),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Config(e) => Some(e),
            TrackerError::Source(e) => Some(e),
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(error: ConfigError) -> Self {
        TrackerError::Config(error)
    }
}

impl From<SourceError> for TrackerError {
    fn from(error: SourceError) -> Self {
        TrackerError::Source(error)
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Coarse state of the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackHealth {
    /// No working point has been set yet
    Uninitialized,
    /// Last tick applied a correction
    Tracking,
    /// Running on prediction only, within configured limits
    Coasting,
    /// Fixes missing or rejected for longer than configured
    Degraded,
}

/// Running counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub predictions: u64,
    pub corrections_applied: u64,
    pub corrections_skipped: u64,
    pub consecutive_missed_fixes: u32,
    pub consecutive_skips: u32,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub fixes: u32,
    pub applied: u32,
    pub skipped: u32,
    pub last_outcome: Option<CorrectionOutcome>,
}

pub struct AnchorTracker<S: PositionSource> {
    filter: PositionKalmanFilter,
    source: S,
    config: TrackerConfig,
    stats: TrackerStats,
    initialized: bool,
    degraded_reported: bool,
}

impl<S: PositionSource> AnchorTracker<S> {
    pub fn new(config: &TrackerConfig, source: S) -> TrackerResult<Self> {
        config.validate()?;
        debug!(source_id = source.get_id(), dt = config.filter.sample_period_s, "creating tracker");

        Ok(Self {
            filter: PositionKalmanFilter::from_config(&config.filter),
            source,
            config: config.clone(),
            stats: TrackerStats::default(),
            initialized: false,
            degraded_reported: false,
        })
    }

    /// Seed the filter with a known position and velocity
    pub fn set_working_point(&mut self, position: &Vect3, velocity: &Vect3) {
        self.filter.set_state(position, velocity);
        self.initialized = true;
    }

    /// Predict once, then consume the fixes the source has ready.
    ///
    /// A source error is returned after the prediction has been applied,
    /// so the track keeps coasting if the caller carries on ticking.
    pub fn tick(&mut self) -> TrackerResult<TickReport> {
        self.filter.predict();
        self.stats.predictions += 1;

        let mut report = TickReport::default();
        let mut failure = None;

        for _ in 0..MAX_FIXES_PER_TICK {
            match self.source.poll_fix() {
                Ok(Some(fix)) => {
                    let outcome = self.apply_fix(&fix);
                    report.fixes += 1;
                    if outcome.is_applied() {
                        report.applied += 1;
                    } else {
                        report.skipped += 1;
                    }
                    report.last_outcome = Some(outcome);
                }
                Ok(None) => break,
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        if report.fixes == 0 {
            self.stats.consecutive_missed_fixes = self.stats.consecutive_missed_fixes.saturating_add(1);
        } else {
            self.stats.consecutive_missed_fixes = 0;
        }
        self.check_health();

        match failure {
            Some(error) => {
                debug!(source_id = self.source.get_id(), %error, "position source failed");
                Err(error.into())
            }
            None => Ok(report),
        }
    }

    /// Correct the filter against one fix, outside of the tick schedule.
    ///
    /// The first fix seen before any working point was set seeds the
    /// position with zero velocity.
    pub fn apply_fix(&mut self, fix: &PositionFix) -> CorrectionOutcome {
        if !self.initialized {
            info!(x = fix.position.x, y = fix.position.y, z = fix.position.z, "seeding track from first fix");
            self.set_working_point(&fix.position, &Vect3::zeros());
        }

        let outcome = self.filter.correct(&fix.position);
        match outcome {
            CorrectionOutcome::Applied { .. } => {
                self.stats.corrections_applied += 1;
                self.stats.consecutive_skips = 0;
            }
            CorrectionOutcome::Skipped(reason) => {
                self.stats.corrections_skipped += 1;
                self.stats.consecutive_skips = self.stats.consecutive_skips.saturating_add(1);
                debug!(?reason, timestamp_ms = fix.timestamp_ms, "correction skipped");
            }
        }
        outcome
    }

    /// Change filter responsiveness without touching the estimate
    pub fn retune(&mut self, accel_noise_intensity: f32, measurement_variance: f32) -> TrackerResult<()> {
        let mut filter_config = self.config.filter.clone();
        filter_config.accel_noise_intensity = accel_noise_intensity;
        filter_config.measurement_variance = measurement_variance;
        filter_config.validate()?;

        self.filter.update_noise(accel_noise_intensity, measurement_variance);
        self.config.filter = filter_config;
        info!(accel_noise_intensity, measurement_variance, "filter noise retuned");
        Ok(())
    }

    pub fn health(&self) -> TrackHealth {
        if !self.initialized {
            return TrackHealth::Uninitialized;
        }
        if self.limits_exceeded() {
            return TrackHealth::Degraded;
        }
        if self.stats.consecutive_missed_fixes > 0 || self.stats.consecutive_skips > 0 {
            TrackHealth::Coasting
        } else {
            TrackHealth::Tracking
        }
    }

    pub fn estimate(&self) -> Estimate {
        Estimate::from_vectors(
            self.stats.predictions,
            self.filter.get_position(),
            self.filter.get_velocity(),
            self.filter.position_uncertainty(),
            self.filter.velocity_uncertainty(),
        )
    }

    pub fn stats(&self) -> &TrackerStats {
        &self.stats
    }

    pub fn filter(&self) -> &PositionKalmanFilter {
        &self.filter
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn limits_exceeded(&self) -> bool {
        self.stats.consecutive_missed_fixes > self.config.max_missed_fixes
            || (self.config.max_consecutive_skips > 0
                && self.stats.consecutive_skips >= self.config.max_consecutive_skips)
    }

    fn check_health(&mut self) {
        if !self.initialized {
            return;
        }
        if self.limits_exceeded() {
            if !self.degraded_reported {
                warn!(
                    missed = self.stats.consecutive_missed_fixes,
                    skipped = self.stats.consecutive_skips,
                    "track degraded, running on prediction only"
                );
                self.degraded_reported = true;
            }
        } else if self.degraded_reported {
            info!("track recovered");
            self.degraded_reported = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockPositionSource;
    use crate::processing::kalman::SkipReason;
    use crate::utils::config::FilterConfig;

    fn tracker() -> AnchorTracker<MockPositionSource> {
        AnchorTracker::new(&TrackerConfig::default(), MockPositionSource::new(1)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = TrackerConfig::default();
        config.filter.sample_period_s = 0.0;

        let result = AnchorTracker::new(&config, MockPositionSource::new(1));
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_first_fix_seeds_track() {
        let mut tracker = tracker();
        assert_eq!(tracker.health(), TrackHealth::Uninitialized);

        tracker.source_mut().push_fix(PositionFix::new(5.0, -3.0, 2.0));
        let report = tracker.tick().unwrap();

        assert_eq!(report.fixes, 1);
        assert_eq!(report.applied, 1);
        assert!(tracker.is_initialized());
        assert_eq!(tracker.health(), TrackHealth::Tracking);
        assert!((tracker.filter().get_position() - Vect3::new(5.0, -3.0, 2.0)).norm() < 1e-6);
    }

    #[test]
    fn test_tracks_constant_velocity_target() {
        let mut tracker = tracker();
        tracker.set_working_point(&Vect3::zeros(), &Vect3::zeros());
        let dt = TrackerConfig::default().filter.sample_period_s;
        let velocity = Vect3::new(1.0, -0.5, 0.2);

        for step in 1..=1500u32 {
            let p = velocity * (step as f32 * dt);
            tracker.source_mut().push_fix(PositionFix::new(p.x, p.y, p.z));
            tracker.tick().unwrap();
        }

        let estimate = tracker.estimate();
        assert_eq!(estimate.tick, 1500);
        assert!((estimate.velocity() - velocity).norm() < 0.05);
        assert_eq!(tracker.stats().corrections_applied, 1500);
        assert_eq!(tracker.stats().corrections_skipped, 0);
    }

    #[test]
    fn test_missed_fixes_degrade_and_recover() {
        let mut config = TrackerConfig::default();
        config.max_missed_fixes = 3;
        let mut tracker = AnchorTracker::new(&config, MockPositionSource::new(1)).unwrap();
        tracker.set_working_point(&Vect3::zeros(), &Vect3::zeros());

        tracker.tick().unwrap();
        assert_eq!(tracker.health(), TrackHealth::Coasting);
        for _ in 0..3 {
            tracker.tick().unwrap();
        }
        assert_eq!(tracker.stats().consecutive_missed_fixes, 4);
        assert_eq!(tracker.health(), TrackHealth::Degraded);

        tracker.source_mut().push_fix(PositionFix::new(0.1, 0.0, 0.0));
        tracker.tick().unwrap();
        assert_eq!(tracker.stats().consecutive_missed_fixes, 0);
        assert_eq!(tracker.health(), TrackHealth::Tracking);
    }

    #[test]
    fn test_skipped_corrections_are_counted() {
        let config = TrackerConfig {
            filter: FilterConfig {
                initial_position_variance: 0.0,
                initial_velocity_variance: 0.0,
                accel_noise_intensity: 0.0,
                measurement_variance: 0.0,
                sample_period_s: 0.02,
            },
            max_missed_fixes: 10,
            max_consecutive_skips: 2,
        };
        let mut tracker = AnchorTracker::new(&config, MockPositionSource::new(1)).unwrap();
        tracker.set_working_point(&Vect3::zeros(), &Vect3::zeros());

        for _ in 0..2 {
            tracker.source_mut().push_fix(PositionFix::new(1.0, 1.0, 1.0));
            let report = tracker.tick().unwrap();
            assert_eq!(report.skipped, 1);
            assert_eq!(
                report.last_outcome,
                Some(CorrectionOutcome::Skipped(SkipReason::IllConditioned))
            );
        }

        assert_eq!(tracker.stats().corrections_skipped, 2);
        assert_eq!(tracker.stats().consecutive_skips, 2);
        assert_eq!(tracker.health(), TrackHealth::Degraded);
        assert_eq!(tracker.filter().get_position(), Vect3::zeros());
    }

    #[test]
    fn test_source_error_after_predict() {
        let mut tracker = tracker();
        tracker.set_working_point(&Vect3::zeros(), &Vect3::new(1.0, 0.0, 0.0));
        tracker.source_mut().disconnect();

        let result = tracker.tick();

        assert!(matches!(result, Err(TrackerError::Source(SourceError::ConnectionLost { source_id: 1 }))));
        assert_eq!(tracker.stats().predictions, 1);
        assert!(tracker.filter().get_position().x > 0.0);
        assert_eq!(tracker.stats().consecutive_missed_fixes, 1);
    }

    #[test]
    fn test_fixes_per_tick_are_bounded() {
        let mut tracker = tracker();
        for _ in 0..(MAX_FIXES_PER_TICK + 2) {
            tracker.source_mut().push_fix(PositionFix::new(0.0, 0.0, 0.0));
        }

        let report = tracker.tick().unwrap();

        assert_eq!(report.fixes as usize, MAX_FIXES_PER_TICK);
        assert_eq!(tracker.source().queued_fix_count(), 2);
    }

    #[test]
    fn test_retune_keeps_estimate() {
        let mut tracker = tracker();
        tracker.set_working_point(&Vect3::new(1.0, 2.0, 3.0), &Vect3::new(0.5, 0.0, 0.0));
        let before = tracker.filter().get_state();
        let covariance = *tracker.filter().covariance();

        tracker.retune(4.0, 0.25).unwrap();

        assert_eq!(tracker.filter().get_state(), before);
        assert_eq!(tracker.filter().covariance(), &covariance);
        assert_eq!(tracker.filter().measurement_noise(), 0.25);
        assert!(matches!(tracker.retune(-1.0, 0.25), Err(TrackerError::Config(_))));
        assert_eq!(tracker.filter().measurement_noise(), 0.25);
    }
}
