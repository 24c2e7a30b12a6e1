use std::f64::consts::PI;

use faer::prelude::*;
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use crate::{
    error::{Channel, HydroError},
    history::VelocityHistory,
    spectrum::TwoSidedSpectrum,
    util::{mat_is_finite, mat_vec_accumulate},
};

/// Causal radiation impulse response, `values[k]` is the 6x6 matrix K(k dt)
/// for k = 0..=n. Negative times are not represented.
#[derive(Debug, Clone)]
pub struct RadiationKernel {
    pub dt: f64,
    pub values: Vec<Mat<f64>>,
}

impl RadiationKernel {
    /// Cosine transform of the damping spectrum,
    /// K(t) = (2/pi) int_0^inf B(w) cos(w t) dw = (1/pi) int_-inf^inf B(w) cos(w t) dw,
    /// by trapezoidal quadrature over the two-sided grid for t = 0, dt, ..., n_steps dt.
    pub fn new(damping: &TwoSidedSpectrum<Mat<f64>>, dt: f64, n_steps: usize) -> Self {
        let quadrature = damping.quadrature();

        // Each time sample reads the shared spectrum and owns its output slot
        let values = (0..=n_steps)
            .into_par_iter()
            .map(|k| {
                let t = k as f64 * dt;
                let weights = quadrature
                    .points
                    .iter()
                    .zip(quadrature.weights.iter())
                    .map(|(&w, &q)| q * (w * t).cos() / PI)
                    .collect_vec();

                let mut kt = Mat::<f64>::zeros(6, 6);
                damping
                    .values
                    .iter()
                    .zip(weights.iter())
                    .for_each(|(b, &c)| {
                        for j in 0..6 {
                            for i in 0..6 {
                                kt[(i, j)] += c * b[(i, j)];
                            }
                        }
                    });
                kt
            })
            .collect::<Vec<_>>();

        debug!(
            "radiation kernel: {} samples, dt = {dt} s, {} frequencies",
            values.len(),
            damping.omega.len()
        );

        RadiationKernel { dt, values }
    }

    /// Number of time samples, equal to the velocity history capacity
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(mat_is_finite)
    }

    /// Radiation load on the body, `-dt * sum_k K(k) v(k)`, with `v(0)` the
    /// current velocity. Only non-negative kernel times are read.
    pub fn force(&self, history: &VelocityHistory) -> [f64; 6] {
        debug_assert_eq!(self.len(), history.capacity());
        let mut f = [0.; 6];
        self.values
            .iter()
            .zip(history.iter())
            .for_each(|(k, v)| mat_vec_accumulate(&mut f, k, v, -self.dt));
        f
    }

    /// Kernel duration in seconds
    pub fn duration(&self) -> f64 {
        (self.len().saturating_sub(1)) as f64 * self.dt
    }
}

/// Build the radiation kernel and reject it if integration produced non-finite values
pub fn build_radiation_kernel(
    body: usize,
    damping: &TwoSidedSpectrum<Mat<f64>>,
    dt: f64,
    n_steps: usize,
) -> Result<RadiationKernel, HydroError> {
    let kernel = RadiationKernel::new(damping, dt, n_steps);
    if !kernel.is_finite() {
        return Err(HydroError::NumericDegenerate {
            body,
            channel: Channel::Radiation,
        });
    }
    Ok(kernel)
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;
    use crate::spectrum::resample;

    /// Damping B(w) = b0 exp(-(w/s)^2) on the diagonal
    fn gaussian_damping(b0: f64, s: f64, omega: &[f64]) -> Vec<Mat<f64>> {
        omega
            .iter()
            .map(|&w| {
                let mut b = Mat::<f64>::zeros(6, 6);
                (0..6).for_each(|i| b[(i, i)] = b0 * (-(w / s).powi(2)).exp());
                b
            })
            .collect()
    }

    #[test]
    fn test_gaussian_damping_kernel() {
        // K(t) = (2/pi) int_0^inf b0 exp(-(w/s)^2) cos(w t) dw = b0 s / sqrt(pi) exp(-(s t / 2)^2)
        let (b0, s) = (2.0, 1.0);
        let omega = (1..=160).map(|k| 0.025 * k as f64).collect_vec();
        let spectrum = resample(&omega, &gaussian_damping(b0, s, &omega), 0.025).two_sided();
        let kernel = build_radiation_kernel(0, &spectrum, 0.1, 50).unwrap();

        assert_eq!(kernel.len(), 51);
        assert_relative_eq!(kernel.duration(), 5.0, epsilon = 1e-12);
        for k in [0, 5, 10, 20, 40] {
            let t = k as f64 * 0.1;
            let exact = b0 * s / PI.sqrt() * (-(s * t / 2.).powi(2)).exp();
            assert_relative_eq!(kernel.values[k][(2, 2)], exact, epsilon = 1e-3);
            assert_eq!(kernel.values[k][(2, 3)], 0.);
        }
    }

    #[test]
    fn test_non_finite_kernel_is_rejected() {
        let omega = vec![0.5, 1.0];
        let mut damping = gaussian_damping(1.0, 1.0, &omega);
        damping[1][(0, 0)] = f64::INFINITY;
        let spectrum = resample(&omega, &damping, 0.25).two_sided();
        match build_radiation_kernel(4, &spectrum, 0.1, 10) {
            Err(HydroError::NumericDegenerate { body, channel }) => {
                assert_eq!(body, 4);
                assert_eq!(channel, Channel::Radiation);
            }
            _ => panic!("expected NumericDegenerate"),
        }
    }
}
