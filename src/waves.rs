use std::f64::consts::PI;

use itertools::Itertools;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::kernels::HeadingGrid;

//------------------------------------------------------------------------------
// Wave components
//------------------------------------------------------------------------------

/// Single linear wave `a cos(w t - k (x cos(theta) + y sin(theta)) + eps)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveComponent {
    pub amplitude: f64,   // Elevation amplitude (m)
    pub omega: f64,       // Angular frequency (rad/s)
    pub phase: f64,       // Phase at the global origin (rad)
    pub heading: f64,     // Propagation direction (deg)
    pub wave_number: f64, // Deep-water wave number (rad/m)
}

impl WaveComponent {
    pub fn new(amplitude: f64, omega: f64, phase: f64, heading: f64, gravity: f64) -> Self {
        WaveComponent {
            amplitude,
            omega,
            phase,
            heading,
            wave_number: omega * omega / gravity,
        }
    }

    /// Phase of the component at horizontal position `position`
    pub fn phase_at(&self, position: &[f64; 3]) -> f64 {
        let theta = self.heading.to_radians();
        self.phase - self.wave_number * (position[0] * theta.cos() + position[1] * theta.sin())
    }

    pub fn elevation(&self, position: &[f64; 3], t: f64) -> f64 {
        self.amplitude * (self.omega * t + self.phase_at(position)).cos()
    }
}

//------------------------------------------------------------------------------
// Wave field
//------------------------------------------------------------------------------

/// Deterministic incident wave realization queried by the load engine. The
/// engine only reads it; any time may be requested, including times ahead of
/// the current simulation step.
pub trait WaveField {
    /// Linear components making up the realization
    fn components(&self) -> &[WaveComponent];

    /// Free-surface elevation at `position` and time `t`
    fn elevation(&self, position: &[f64; 3], t: f64) -> f64 {
        self.components()
            .iter()
            .map(|c| c.elevation(position, t))
            .sum()
    }

    /// Elevation split by heading bucket; each component is assigned to the
    /// nearest heading of `grid`.
    fn directional_elevation(
        &self,
        position: &[f64; 3],
        t: f64,
        grid: &HeadingGrid,
        out: &mut [f64],
    ) {
        out.fill(0.);
        self.components().iter().for_each(|c| {
            out[grid.nearest(c.heading)] += c.elevation(position, t);
        });
    }
}

/// Sum of linear wave components with fixed random phases
#[derive(Debug, Clone, Default)]
pub struct IrregularWaves {
    pub components: Vec<WaveComponent>,
}

impl WaveField for IrregularWaves {
    fn components(&self) -> &[WaveComponent] {
        &self.components
    }
}

impl IrregularWaves {
    pub fn new(components: Vec<WaveComponent>) -> Self {
        IrregularWaves { components }
    }

    /// Flat water with no components
    pub fn still_water() -> Self {
        IrregularWaves::default()
    }

    /// Single regular wave
    pub fn regular(amplitude: f64, omega: f64, heading: f64, phase: f64, gravity: f64) -> Self {
        IrregularWaves {
            components: vec![WaveComponent::new(amplitude, omega, phase, heading, gravity)],
        }
    }

    /// Unidirectional sea sampled from `spectrum` at `n` equally spaced
    /// frequencies between `omega_min` and `omega_max` (cell midpoints).
    /// Amplitudes are `sqrt(2 S(w) dw)`, phases are uniform and drawn from a
    /// generator seeded with `seed` so the realization is reproducible.
    pub fn from_spectrum(
        spectrum: &impl WaveSpectrum,
        omega_min: f64,
        omega_max: f64,
        n: usize,
        heading: f64,
        seed: u64,
        gravity: f64,
    ) -> Self {
        let d_omega = (omega_max - omega_min) / n as f64;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let components = (0..n)
            .map(|k| {
                let omega = omega_min + (k as f64 + 0.5) * d_omega;
                let amplitude = (2. * spectrum.density(omega) * d_omega).sqrt();
                let phase = rng.gen::<f64>() * 2. * PI;
                WaveComponent::new(amplitude, omega, phase, heading, gravity)
            })
            .collect_vec();

        debug!(
            "irregular sea: {n} components in [{omega_min}, {omega_max}] rad/s, heading {heading} deg, seed {seed}"
        );

        IrregularWaves { components }
    }

    /// Significant wave height 4 sqrt(m0) of the discretized sea
    pub fn significant_height(&self) -> f64 {
        4. * (self
            .components
            .iter()
            .map(|c| 0.5 * c.amplitude * c.amplitude)
            .sum::<f64>())
        .sqrt()
    }
}

//------------------------------------------------------------------------------
// Spectra
//------------------------------------------------------------------------------

/// One-sided wave energy spectrum S(w) in m^2 s / rad
pub trait WaveSpectrum {
    fn density(&self, omega: f64) -> f64;
}

/// JONSWAP spectrum with the Pierson-Moskowitz spectrum as the `gamma = 1` case
#[derive(Debug, Clone, Copy)]
pub struct Jonswap {
    pub hs: f64,    // Significant wave height (m)
    pub tp: f64,    // Peak period (s)
    pub gamma: f64, // Peak enhancement factor
}

impl Jonswap {
    pub fn pierson_moskowitz(hs: f64, tp: f64) -> Self {
        Jonswap { hs, tp, gamma: 1. }
    }
}

impl WaveSpectrum for Jonswap {
    fn density(&self, omega: f64) -> f64 {
        if omega <= 0. {
            return 0.;
        }
        let wp = 2. * PI / self.tp;
        let pm = 5. / 16. * self.hs.powi(2) * wp.powi(4) * omega.powi(-5)
            * (-1.25 * (omega / wp).powi(-4)).exp();

        // Normalization keeps Hs close to the requested value
        let a_gamma = 1. - 0.287 * self.gamma.ln();
        let sigma = if omega <= wp { 0.07 } else { 0.09 };
        let r = (-(omega - wp).powi(2) / (2. * sigma * sigma * wp * wp)).exp();
        a_gamma * pm * self.gamma.powf(r)
    }
}
