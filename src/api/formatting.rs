//! Estimate output formatting
//!
//! Human-readable, JSON and CSV renderings of tracker estimates.

use crate::core::Estimate;
use crate::processing::tracker::TrackHealth;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{}', expected text, json or csv", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        };
        write!(f, "{}", name)
    }
}

/// One output line: estimate plus track health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRecord {
    #[serde(flatten)]
    pub estimate: Estimate,
    pub health: TrackHealth,
}

/// Formats estimates in the configured format
pub struct EstimateFormatter {
    format: OutputFormat,
    /// Number of decimal places
    precision: usize,
}

impl Default for EstimateFormatter {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            precision: 3,
        }
    }
}

impl EstimateFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Header line for formats that have one
    pub fn header(&self) -> Option<String> {
        match self.format {
            OutputFormat::Csv => Some(
                "tick,x,y,z,vx,vy,vz,sigma_x,sigma_y,sigma_z,sigma_vx,sigma_vy,sigma_vz,health".to_string(),
            ),
            OutputFormat::Text | OutputFormat::Json => None,
        }
    }

    pub fn format_record(&self, record: &EstimateRecord) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(self.format_text(record)),
            OutputFormat::Json => serde_json::to_string(record),
            OutputFormat::Csv => Ok(self.format_csv(record)),
        }
    }

    fn format_text(&self, record: &EstimateRecord) -> String {
        let e = &record.estimate;
        let p = self.precision;
        format!(
            "[{:>6}] pos=({:.p$}, {:.p$}, {:.p$}) m  vel=({:.p$}, {:.p$}, {:.p$}) m/s  sigma=({:.p$}, {:.p$}, {:.p$}) m  {:?}",
            e.tick,
            e.position[0], e.position[1], e.position[2],
            e.velocity[0], e.velocity[1], e.velocity[2],
            e.position_sigma[0], e.position_sigma[1], e.position_sigma[2],
            record.health,
            p = p,
        )
    }

    fn format_csv(&self, record: &EstimateRecord) -> String {
        let e = &record.estimate;
        let p = self.precision;
        let values: Vec<String> = e.position.iter()
            .chain(e.velocity.iter())
            .chain(e.position_sigma.iter())
            .chain(e.velocity_sigma.iter())
            .map(|v| format!("{:.p$}", v, p = p))
            .collect();
        format!("{},{},{:?}", e.tick, values.join(","), record.health)
    }
}
