use nalgebra::{Matrix3, Matrix3x6, Matrix6, Matrix6x3, Vector6};
use crate::core::{Vect3, SpeedKind, KALMAN_DIM, MEASUREMENT_DIM, INNOVATION_SINGULARITY_THRESHOLD};
use crate::utils::config::FilterConfig;

/// State indices holding the position of each axis
const POSITION_INDICES: [usize; MEASUREMENT_DIM] = [0, 2, 4];

/// Why a correction left the filter untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Diagonal of the innovation covariance is too small to invert safely
    IllConditioned,
    /// Innovation covariance has a zero or non-finite determinant
    Singular,
    /// The requested measurement update has no update law
    Unsupported,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::IllConditioned => "ill-conditioned",
            SkipReason::Singular => "singular",
            SkipReason::Unsupported => "unsupported",
        }
    }
}

/// Result of a measurement update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionOutcome {
    /// State and covariance were corrected; carries the innovation `z - Hx`
    Applied { innovation: Vect3 },
    /// Nothing was changed
    Skipped(SkipReason),
}

impl CorrectionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CorrectionOutcome::Applied { .. })
    }
}

/// Constant-velocity Kalman filter over 3-axis position and velocity.
///
/// State vector: `[x, vx, y, vy, z, vz]`, axis `k` at indices `2k, 2k+1`.
/// The transition matrix is block diagonal so prediction runs per axis on
/// 2x2 blocks; correction observes the three position components jointly.
///
/// All storage is fixed size and lives inline, so the filter is a plain
/// `Copy` value. Call [`set_state`](Self::set_state) after construction,
/// the zeroed working point is only a placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionKalmanFilter {
    state: Vector6<f32>,
    covariance: Matrix6<f32>,
    process_noise: Matrix6<f32>,
    measurement_noise: f32,
    dt: f32,
}

impl PositionKalmanFilter {
    /// Create a filter and run [`init`](Self::init) on it
    pub fn new(p0_pos: f32, p0_speed: f32, q_sigma2: f32, r: f32, dt: f32) -> Self {
        let mut filter = Self {
            state: Vector6::zeros(),
            covariance: Matrix6::zeros(),
            process_noise: Matrix6::zeros(),
            measurement_noise: 0.0,
            dt: 0.0,
        };
        filter.init(p0_pos, p0_speed, q_sigma2, r, dt);
        filter
    }

    /// Create a filter from validated configuration values
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            config.initial_position_variance,
            config.initial_velocity_variance,
            config.accel_noise_intensity,
            config.measurement_variance,
            config.sample_period_s,
        )
    }

    /// Reset the filter.
    ///
    /// Zeroes the state, sets the covariance diagonal to the initial
    /// position/velocity variances and derives the process noise from the
    /// acceleration noise intensity `q_sigma2` and sample period `dt`.
    pub fn init(&mut self, p0_pos: f32, p0_speed: f32, q_sigma2: f32, r: f32, dt: f32) {
        self.state = Vector6::zeros();
        self.covariance = Matrix6::zeros();
        for i in (0..KALMAN_DIM).step_by(2) {
            self.covariance[(i, i)] = p0_pos;
            self.covariance[(i + 1, i + 1)] = p0_speed;
        }
        self.process_noise = Self::process_noise_matrix(q_sigma2, dt);
        self.measurement_noise = r;
        self.dt = dt;
    }

    /// Recompute process noise with the stored sample period and replace
    /// the measurement variance. State and covariance are kept.
    pub fn update_noise(&mut self, q_sigma2: f32, r: f32) {
        self.process_noise = Self::process_noise_matrix(q_sigma2, self.dt);
        self.measurement_noise = r;
    }

    /// Advance the model by one sample period
    pub fn predict(&mut self) {
        let dt = self.dt;
        for i in (0..KALMAN_DIM).step_by(2) {
            let v = i + 1;

            // X = F * X
            self.state[i] += self.state[v] * dt;

            // P = F * P * Ft + Q, unrolled on the 2x2 block of this axis
            let p_pp = self.covariance[(i, i)];
            let p_pv = self.covariance[(i, v)];
            let p_vp = self.covariance[(v, i)];
            let p_vv = self.covariance[(v, v)];
            let d_dt = p_vv * dt;

            self.covariance[(i, i)] = p_pp + dt * (p_vp + p_pv + d_dt) + self.process_noise[(i, i)];
            self.covariance[(i, v)] = p_pv + d_dt + self.process_noise[(i, v)];
            self.covariance[(v, i)] = p_vp + d_dt + self.process_noise[(v, i)];
            self.covariance[(v, v)] = p_vv + self.process_noise[(v, v)];
        }
    }

    /// Correct the estimate against an absolute position fix.
    ///
    /// ```text
    /// S = H P Ht + r I
    /// K = P Ht S^-1
    /// X = X + K (Z - H X)
    /// P = P - K H P
    /// ```
    ///
    /// Returns [`CorrectionOutcome::Skipped`] without touching anything when
    /// `S` cannot be inverted safely.
    pub fn correct(&mut self, measured: &Vect3) -> CorrectionOutcome {
        let mut s = Matrix3::zeros();
        for (row, &i) in POSITION_INDICES.iter().enumerate() {
            for (col, &j) in POSITION_INDICES.iter().enumerate() {
                s[(row, col)] = self.covariance[(i, j)];
            }
            s[(row, row)] += self.measurement_noise;
        }

        if s[(0, 0)].abs() + s[(1, 1)].abs() + s[(2, 2)].abs() < INNOVATION_SINGULARITY_THRESHOLD {
            return CorrectionOutcome::Skipped(SkipReason::IllConditioned);
        }

        let s_inv = match invert_3x3(&s) {
            Some(inv) => inv,
            None => return CorrectionOutcome::Skipped(SkipReason::Singular),
        };

        let snapshot = self.covariance;

        // P Ht selects the position columns, H P the position rows
        let mut p_ht = Matrix6x3::zeros();
        let mut h_p = Matrix3x6::zeros();
        for (m, &k) in POSITION_INDICES.iter().enumerate() {
            for n in 0..KALMAN_DIM {
                p_ht[(n, m)] = snapshot[(n, k)];
                h_p[(m, n)] = snapshot[(k, n)];
            }
        }

        let gain = p_ht * s_inv;
        let innovation = measured - self.get_position();

        self.state += gain * innovation;
        self.covariance = snapshot - gain * h_p;

        CorrectionOutcome::Applied { innovation }
    }

    /// Velocity measurement update.
    ///
    /// No update law is defined for speed sensors: this is a no-op that
    /// always reports [`SkipReason::Unsupported`].
    pub fn update_speed(&mut self, _speed: f32, _kind: SpeedKind) -> CorrectionOutcome {
        CorrectionOutcome::Skipped(SkipReason::Unsupported)
    }

    pub fn set_state(&mut self, position: &Vect3, velocity: &Vect3) {
        for axis in 0..MEASUREMENT_DIM {
            self.state[2 * axis] = position[axis];
            self.state[2 * axis + 1] = velocity[axis];
        }
    }

    pub fn get_state(&self) -> (Vect3, Vect3) {
        (self.get_position(), self.get_velocity())
    }

    pub fn get_position(&self) -> Vect3 {
        Vect3::new(self.state[0], self.state[2], self.state[4])
    }

    pub fn get_velocity(&self) -> Vect3 {
        Vect3::new(self.state[1], self.state[3], self.state[5])
    }

    /// Position uncertainty (standard deviations)
    pub fn position_uncertainty(&self) -> Vect3 {
        Vect3::new(
            self.covariance[(0, 0)].max(0.0).sqrt(),
            self.covariance[(2, 2)].max(0.0).sqrt(),
            self.covariance[(4, 4)].max(0.0).sqrt(),
        )
    }

    /// Velocity uncertainty (standard deviations)
    pub fn velocity_uncertainty(&self) -> Vect3 {
        Vect3::new(
            self.covariance[(1, 1)].max(0.0).sqrt(),
            self.covariance[(3, 3)].max(0.0).sqrt(),
            self.covariance[(5, 5)].max(0.0).sqrt(),
        )
    }

    /// Extrapolate the position with the current velocity, without changing the filter
    pub fn predict_future_position(&self, horizon_s: f32) -> Vect3 {
        if horizon_s <= 0.0 {
            return self.get_position();
        }
        self.get_position() + self.get_velocity() * horizon_s
    }

    pub fn state(&self) -> &Vector6<f32> {
        &self.state
    }

    pub fn covariance(&self) -> &Matrix6<f32> {
        &self.covariance
    }

    pub fn process_noise(&self) -> &Matrix6<f32> {
        &self.process_noise
    }

    pub fn measurement_noise(&self) -> f32 {
        self.measurement_noise
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Dense form of the transition used by [`predict`](Self::predict)
    ///
    /// ```text
    /// F = [ 1 dt 0 0  0 0
    ///       0 1  0 0  0 0
    ///       0 0  1 dt 0 0
    ///       0 0  0 1  0 0
    ///       0 0  0 0  1 dt
    ///       0 0  0 0  0 1  ]
    /// ```
    pub fn transition_matrix(&self) -> Matrix6<f32> {
        let mut f = Matrix6::identity();
        for i in (0..KALMAN_DIM).step_by(2) {
            f[(i, i + 1)] = self.dt;
        }
        f
    }

    /// Dense form of the position observation used by [`correct`](Self::correct)
    pub fn observation_matrix(&self) -> Matrix3x6<f32> {
        let mut h = Matrix3x6::zeros();
        for (row, &col) in POSITION_INDICES.iter().enumerate() {
            h[(row, col)] = 1.0;
        }
        h
    }

    /// Discretized constant-velocity process noise, one 2x2 block per axis
    fn process_noise_matrix(q_sigma2: f32, dt: f32) -> Matrix6<f32> {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt / 2.0;
        let dt4 = dt2 * dt2 / 4.0;

        let mut q = Matrix6::zeros();
        for i in (0..KALMAN_DIM).step_by(2) {
            q[(i, i)] = q_sigma2 * dt4;
            q[(i + 1, i)] = q_sigma2 * dt3;
            q[(i, i + 1)] = q_sigma2 * dt3;
            q[(i + 1, i + 1)] = q_sigma2 * dt2;
        }
        q
    }
}

/// Closed-form inverse through the adjugate.
/// Returns `None` for a zero or non-finite determinant.
fn invert_3x3(m: &Matrix3<f32>) -> Option<Matrix3<f32>> {
    let c00 = m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)];
    let c01 = m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)];
    let c02 = m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)];

    let det = m[(0, 0)] * c00 + m[(0, 1)] * c01 + m[(0, 2)] * c02;
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;

    let inverse = Matrix3::new(
        c00 * inv_det,
        (m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)]) * inv_det,
        (m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)]) * inv_det,
        c01 * inv_det,
        (m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)]) * inv_det,
        (m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)]) * inv_det,
        c02 * inv_det,
        (m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)]) * inv_det,
        (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]) * inv_det,
    );

    if inverse.iter().all(|v| v.is_finite()) {
        Some(inverse)
    } else {
        None
    }
}
