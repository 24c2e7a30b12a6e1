use faer::prelude::*;
use serde::Deserialize;

use crate::error::HydroError;

pub fn read_config_from_file(file_path: &str) -> Result<HydroConfig, HydroError> {
    let yaml_file = std::fs::read_to_string(file_path)?;
    HydroConfig::from_yaml(&yaml_file)
}

/// Second-order wave load evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecondOrderMode {
    #[default]
    Off,
    Full,
    Newman,
    MeanDrift,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HydroConfig {
    pub radiation_frequency_step: f64,   // Radiation frequency step (rad/s)
    pub diffraction_frequency_step: f64, // Diffraction frequency step (rad/s)
    pub heading_step: f64,               // Uniform heading grid step (deg)
    pub heading_tolerance: f64,          // Headings closer than this are merged (deg)
    pub radiation_cutoff_time: f64,      // Radiation kernel truncation time (s)
    pub diffraction_cutoff_time: f64,    // Diffraction kernel half-window (s)
    pub time_step: f64,                  // Convolution time step (s)
    pub second_order: SecondOrderMode,
    pub water_density: f64,              // Sea water density (kg/m^3) for dimensional coefficients
    pub gravity: f64,                    // Gravitational acceleration (m/s^2) for wave dispersion
    pub bodies: Vec<BodyConfig>,
}

impl Default for HydroConfig {
    fn default() -> Self {
        HydroConfig {
            radiation_frequency_step: 0.05,
            diffraction_frequency_step: 0.05,
            heading_step: 10.,
            heading_tolerance: 1e-3,
            radiation_cutoff_time: 60.,
            diffraction_cutoff_time: 30.,
            time_step: 0.05,
            second_order: SecondOrderMode::Off,
            water_density: 1025.,
            gravity: 9.80665,
            bodies: vec![],
        }
    }
}

impl HydroConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, HydroError> {
        let config: HydroConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that grid steps and truncation times describe usable kernels
    pub fn validate(&self) -> Result<(), HydroError> {
        let positive = [
            ("radiation_frequency_step", self.radiation_frequency_step),
            ("diffraction_frequency_step", self.diffraction_frequency_step),
            ("heading_step", self.heading_step),
            ("radiation_cutoff_time", self.radiation_cutoff_time),
            ("diffraction_cutoff_time", self.diffraction_cutoff_time),
            ("time_step", self.time_step),
            ("water_density", self.water_density),
            ("gravity", self.gravity),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.)) {
            return Err(HydroError::InvalidConfig(format!(
                "{name} must be positive, got {value}"
            )));
        }
        if self.heading_tolerance < 0. {
            return Err(HydroError::InvalidConfig(
                "heading_tolerance must not be negative".to_string(),
            ));
        }
        if self.heading_step > 360. {
            return Err(HydroError::InvalidConfig(
                "heading_step must not exceed 360 deg".to_string(),
            ));
        }
        if self.time_step > self.radiation_cutoff_time
            || self.time_step > self.diffraction_cutoff_time
        {
            return Err(HydroError::InvalidConfig(
                "time_step must not exceed the kernel truncation times".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of convolution steps spanned by the radiation kernel
    pub fn radiation_steps(&self) -> usize {
        (self.radiation_cutoff_time / self.time_step).round() as usize
    }

    /// Number of convolution steps spanned by each half of the diffraction kernel
    pub fn diffraction_half_steps(&self) -> usize {
        (self.diffraction_cutoff_time / self.time_step).round() as usize
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub name: String,
    pub center_of_gravity: [f64; 3],
    pub reference_point: [f64; 3], // Hydrodynamic reference point, loads are produced here
    pub interface_point: [f64; 3], // Structural interface point for the hand-off
    pub restoring: RestoringConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestoringConfig {
    pub neutral_position: [f64; 6],
    pub constant_load: [f64; 6],
    pub stiffness: [[f64; 6]; 6],
    pub linear_damping: [[f64; 6]; 6],
    pub quadratic_damping: [[f64; 6]; 6],
}

/// Converts a row-major nested array into a matrix
pub fn matrix_from_rows(rows: &[[f64; 6]; 6]) -> Mat<f64> {
    Mat::from_fn(6, 6, |i, j| rows[i][j])
}
