use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Noise and timing parameters of the position filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Initial position variance per axis (m^2)
    pub initial_position_variance: f32,
    /// Initial velocity variance per axis ((m/s)^2)
    pub initial_velocity_variance: f32,
    /// Acceleration noise intensity driving the process noise
    pub accel_noise_intensity: f32,
    /// Variance of each position fix channel (m^2)
    pub measurement_variance: f32,
    /// Fixed prediction period (seconds)
    pub sample_period_s: f32,
}

/// Tracker configuration: filter parameters plus degradation limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub filter: FilterConfig,
    /// Ticks without any fix before the track is reported degraded
    pub max_missed_fixes: u32,
    /// Consecutive skipped corrections before the track is reported degraded
    pub max_consecutive_skips: u32,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Parameter cannot be changed in the current state
    LockedParameter { parameter: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            initial_position_variance: 1.0,
            initial_velocity_variance: 1.0,
            accel_noise_intensity: 0.5,
            measurement_variance: 0.01,
            sample_period_s: 0.02, // 50 Hz
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            max_missed_fixes: 50,
            max_consecutive_skips: 10,
        }
    }
}

fn check_variance(parameter: &str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: "Must be a finite, non-negative variance".to_string(),
        });
    }
    Ok(())
}

fn check_sample_period(value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidParameter {
            parameter: "sample_period_s".to_string(),
            value: value.to_string(),
            reason: "Sample period must be positive".to_string(),
        });
    }
    Ok(())
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_variance("initial_position_variance", self.initial_position_variance)?;
        check_variance("initial_velocity_variance", self.initial_velocity_variance)?;
        check_variance("accel_noise_intensity", self.accel_noise_intensity)?;
        check_variance("measurement_variance", self.measurement_variance)?;
        check_sample_period(self.sample_period_s)
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()?;
        if self.max_missed_fixes == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_missed_fixes".to_string(),
                value: "0".to_string(),
                reason: "At least one tick without a fix must be tolerated".to_string(),
            });
        }
        Ok(())
    }
}

/// Main configuration manager
pub struct ConfigurationManager {
    config: TrackerConfig,
    config_file_path: Option<String>,
    is_modified: bool,
    /// Set once a filter has been built from this configuration
    period_locked: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
            config_file_path: None,
            is_modified: false,
            period_locked: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn get_config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the whole configuration after validation
    pub fn update_config(&mut self, config: TrackerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.period_locked && config.filter.sample_period_s != self.config.filter.sample_period_s {
            return Err(ConfigError::LockedParameter {
                parameter: "sample_period_s".to_string(),
            });
        }
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::IoError {
                message: format!("Failed to read config file '{}': {}", path_str, e),
            })?;

        let config: TrackerConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        config.validate()?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config)
            .map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&path, content)
            .map_err(|e| ConfigError::IoError {
                message: format!("Failed to write config file '{}': {}", path_str, e),
            })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = self.config_file_path.clone() {
            self.save_to_file(path)
        } else {
            Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            })
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime Parameter Adjustment Methods

    /// Update both noise parameters, returning the previous `(accel, measurement)` pair
    pub fn set_noise(&mut self, accel_noise_intensity: f32, measurement_variance: f32) -> Result<(f32, f32), ConfigError> {
        check_variance("accel_noise_intensity", accel_noise_intensity)?;
        check_variance("measurement_variance", measurement_variance)?;

        let filter = &mut self.config.filter;
        let old = (filter.accel_noise_intensity, filter.measurement_variance);
        filter.accel_noise_intensity = accel_noise_intensity;
        filter.measurement_variance = measurement_variance;
        self.is_modified = true;
        Ok(old)
    }

    /// Change the sample period. Rejected once a filter runs on this configuration.
    pub fn set_sample_period(&mut self, sample_period_s: f32) -> Result<f32, ConfigError> {
        if self.period_locked {
            return Err(ConfigError::LockedParameter {
                parameter: "sample_period_s".to_string(),
            });
        }
        check_sample_period(sample_period_s)?;

        let old_value = self.config.filter.sample_period_s;
        self.config.filter.sample_period_s = sample_period_s;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Freeze the sample period; called when a filter is built from this configuration
    pub fn lock_sample_period(&mut self) {
        self.period_locked = true;
    }

    pub fn is_sample_period_locked(&self) -> bool {
        self.period_locked
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
            ConfigError::LockedParameter { parameter } => {
                write!(f, "Parameter '{}' is fixed while the filter runs", parameter)
            }
            ConfigError::IoError { message } => {
                write!(f, "I/O error: {}", message)
            }
            ConfigError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
