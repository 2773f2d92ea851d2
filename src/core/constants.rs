//! Filter dimensions and numerical thresholds

/// Size of the state vector: position and velocity for three axes
pub const KALMAN_DIM: usize = 6;

/// Number of position channels observed by a fix
pub const MEASUREMENT_DIM: usize = 3;

/// Below this sum of |S_ii| the innovation covariance is not inverted
pub const INNOVATION_SINGULARITY_THRESHOLD: f32 = 1e-5;
