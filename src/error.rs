use std::fmt;

use thiserror::Error;

/// Load channel produced from the hydrodynamic databank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Radiation,
    Diffraction,
    DifferenceFrequency,
    SumFrequency,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Radiation => "radiation",
            Channel::Diffraction => "diffraction",
            Channel::DifferenceFrequency => "difference-frequency",
            Channel::SumFrequency => "sum-frequency",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum HydroError {
    #[error("malformed {channel} coefficient table for body {body}: {reason}")]
    MalformedCoefficientTable {
        body: usize,
        channel: Channel,
        reason: String,
    },

    #[error("body {body}: heading {requested} deg outside supplied set, using nearest {used} deg")]
    HeadingExtrapolated {
        body: usize,
        requested: f64,
        used: f64,
    },

    #[error("body {body}: {channel} frequency {requested} rad/s outside [{min}, {max}], clamped")]
    FrequencyOutOfRange {
        body: usize,
        channel: Channel,
        requested: f64,
        min: f64,
        max: f64,
    },

    #[error("body {body}: {channel} kernel contains non-finite values")]
    NumericDegenerate { body: usize, channel: Channel },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unable to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unable to write CSV output: {0}")]
    Csv(#[from] csv::Error),
}

impl HydroError {
    pub(crate) fn malformed(body: usize, channel: Channel, reason: impl Into<String>) -> Self {
        HydroError::MalformedCoefficientTable {
            body,
            channel,
            reason: reason.into(),
        }
    }

    /// Returns true if the condition was recovered from and only needs reporting
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            HydroError::HeadingExtrapolated { .. } | HydroError::FrequencyOutOfRange { .. }
        )
    }
}
