use faer::prelude::*;
use itertools::Itertools;
use num_complex::Complex64;

use crate::{interp::linear_weights, quadrature::Quadrature};

/// Frequency-domain quantity that can be resampled and mirrored to negative frequency
pub trait Spectral: Clone + Send + Sync {
    /// Linear blend `(1 - w) * a + w * b`
    fn lerp(a: &Self, b: &Self, w: f64) -> Self;

    /// Value at `-omega` given the value at `omega`
    fn negative_frequency(&self) -> Self;

    /// Value at `omega = 0` consistent with the mirror symmetry
    fn zero_frequency(&self) -> Self;
}

/// Radiation damping is even in frequency: B(-w) = B(w)
impl Spectral for Mat<f64> {
    fn lerp(a: &Self, b: &Self, w: f64) -> Self {
        Mat::from_fn(a.nrows(), a.ncols(), |i, j| {
            (1. - w) * a[(i, j)] + w * b[(i, j)]
        })
    }

    fn negative_frequency(&self) -> Self {
        self.clone()
    }

    fn zero_frequency(&self) -> Self {
        self.clone()
    }
}

/// Excitation for all headings at one frequency `[n_heading][6]`.
/// Conjugate symmetric in frequency: X(-w) = conj(X(w)).
#[derive(Debug, Clone, PartialEq)]
pub struct ExcitationSample(pub Vec<[Complex64; 6]>);

impl Spectral for ExcitationSample {
    fn lerp(a: &Self, b: &Self, w: f64) -> Self {
        ExcitationSample(
            a.0.iter()
                .zip(b.0.iter())
                .map(|(xa, xb)| std::array::from_fn(|d| xa[d] * (1. - w) + xb[d] * w))
                .collect(),
        )
    }

    fn negative_frequency(&self) -> Self {
        ExcitationSample(
            self.0
                .iter()
                .map(|x| std::array::from_fn(|d| x[d].conj()))
                .collect(),
        )
    }

    fn zero_frequency(&self) -> Self {
        ExcitationSample(
            self.0
                .iter()
                .map(|x| std::array::from_fn(|d| Complex64::new(x[d].re, 0.)))
                .collect(),
        )
    }
}

/// Samples on a uniform grid `omega[k] = (k + 1) * d_omega`
#[derive(Debug, Clone)]
pub struct OneSidedSpectrum<T> {
    pub d_omega: f64,
    pub omega: Vec<f64>,
    pub values: Vec<T>,
    /// Zero-frequency value, clamped to the lowest supplied sample
    pub dc: T,
    /// Grid frequencies that fell outside the supplied band and were clamped
    pub out_of_range: Vec<f64>,
}

/// Samples on `-omega_n..=omega_n` including zero at index `n`
#[derive(Debug, Clone)]
pub struct TwoSidedSpectrum<T> {
    pub omega: Vec<f64>,
    pub values: Vec<T>,
}

/// Uniform grid `d_omega, 2 d_omega, ...` up to and including `omega_max`
pub fn uniform_frequency_grid(d_omega: f64, omega_max: f64) -> Vec<f64> {
    let n = ((omega_max / d_omega + 1e-9).floor() as usize).max(1);
    (1..=n).map(|k| k as f64 * d_omega).collect()
}

/// Linearly interpolate `values` sampled at ascending `omega` onto a uniform
/// grid of step `d_omega`. Requests outside the supplied band take the
/// boundary sample; no extrapolation.
pub fn resample<T: Spectral>(omega: &[f64], values: &[T], d_omega: f64) -> OneSidedSpectrum<T> {
    let sample = |w: f64| {
        let lw = linear_weights(omega, w);
        (T::lerp(&values[lw.i0], &values[lw.i1], lw.w), lw.clamped)
    };

    let grid = uniform_frequency_grid(d_omega, omega[omega.len() - 1]);
    let mut out_of_range = vec![];
    let resampled = grid
        .iter()
        .map(|&w| {
            let (v, clamped) = sample(w);
            if clamped {
                out_of_range.push(w);
            }
            v
        })
        .collect_vec();

    OneSidedSpectrum {
        d_omega,
        omega: grid,
        values: resampled,
        dc: sample(0.).0.zero_frequency(),
        out_of_range,
    }
}

impl<T: Spectral> OneSidedSpectrum<T> {
    /// Mirror into a two-sided spectrum using the symmetry of `T`
    pub fn two_sided(&self) -> TwoSidedSpectrum<T> {
        let omega = self
            .omega
            .iter()
            .rev()
            .map(|&w| -w)
            .chain(std::iter::once(0.))
            .chain(self.omega.iter().copied())
            .collect_vec();
        let values = self
            .values
            .iter()
            .rev()
            .map(|v| v.negative_frequency())
            .chain(std::iter::once(self.dc.clone()))
            .chain(self.values.iter().cloned())
            .collect_vec();
        TwoSidedSpectrum { omega, values }
    }
}

impl<T> TwoSidedSpectrum<T> {
    /// Number of positive frequencies
    pub fn n_positive(&self) -> usize {
        self.omega.len() / 2
    }

    pub fn quadrature(&self) -> Quadrature {
        Quadrature::trapezoidal(&self.omega)
    }
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;

    fn damping(w: f64) -> Mat<f64> {
        Mat::from_fn(6, 6, |i, j| (i + 1) as f64 * w * (-w).exp() + j as f64)
    }

    fn excitation(w: f64) -> ExcitationSample {
        ExcitationSample(vec![
            std::array::from_fn(|d| Complex64::from_polar(w + d as f64, -w)),
            std::array::from_fn(|d| Complex64::new(d as f64, w)),
        ])
    }

    #[test]
    fn test_uniform_frequency_grid() {
        let grid = uniform_frequency_grid(0.05, 0.2);
        assert_eq!(grid.len(), 4);
        assert_relative_eq!(grid[3], 0.2);
        assert_eq!(uniform_frequency_grid(1.0, 0.5), vec![1.0]);
    }

    #[test]
    fn test_damping_two_sided_is_even() {
        let omega = vec![0.1, 0.3, 0.6, 1.0, 2.0];
        let values = omega.iter().map(|&w| damping(w)).collect_vec();
        let two = resample(&omega, &values, 0.05).two_sided();
        let n = two.n_positive();

        assert_eq!(two.omega.len(), 2 * n + 1);
        assert_eq!(two.omega[n], 0.);
        for k in 1..=n {
            assert_relative_eq!(two.omega[n - k], -two.omega[n + k]);
            for i in 0..6 {
                for j in 0..6 {
                    assert_eq!(two.values[n - k][(i, j)], two.values[n + k][(i, j)]);
                }
            }
        }
    }

    #[test]
    fn test_excitation_two_sided_is_conjugate() {
        let omega = vec![0.2, 0.5, 1.5];
        let values = omega.iter().map(|&w| excitation(w)).collect_vec();
        let two = resample(&omega, &values, 0.1).two_sided();
        let n = two.n_positive();

        for k in 1..=n {
            assert_eq!(two.values[n - k], two.values[n + k].negative_frequency());
            two.values[n - k]
                .0
                .iter()
                .zip(two.values[n + k].0.iter())
                .for_each(|(neg, pos)| {
                    (0..6).for_each(|d| assert_eq!(neg[d], pos[d].conj()));
                });
        }

        // Zero frequency is real
        two.values[n]
            .0
            .iter()
            .for_each(|x| x.iter().for_each(|v| assert_eq!(v.im, 0.)));
    }

    #[test]
    fn test_resample_clamps_outside_band() {
        let omega = vec![0.2, 0.4];
        let values = vec![damping(0.2), damping(0.4)];
        let spectrum = resample(&omega, &values, 0.1);

        // 0.1 is below the band and takes the first sample
        assert_relative_eq!(spectrum.omega[0], 0.1);
        assert_eq!(spectrum.values[0][(2, 3)], values[0][(2, 3)]);
        assert_eq!(spectrum.out_of_range.len(), 1);
        assert_relative_eq!(spectrum.out_of_range[0], 0.1);
        assert_eq!(spectrum.dc[(1, 1)], values[0][(1, 1)]);

        // Midpoint is the average
        assert_relative_eq!(
            spectrum.values[2][(4, 0)],
            0.5 * (values[0][(4, 0)] + values[1][(4, 0)]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_resample_round_trip() {
        // Refine to a grid containing every input sample, then decimate back
        let omega = (1..=10).map(|k| 0.1 * k as f64).collect_vec();
        let values = omega.iter().map(|&w| damping(w)).collect_vec();
        let fine = resample(&omega, &values, 0.025);
        assert_eq!(fine.omega.len(), 40);

        fine.values
            .iter()
            .skip(3)
            .step_by(4)
            .zip(values.iter())
            .for_each(|(v_fine, v)| {
                for i in 0..6 {
                    for j in 0..6 {
                        assert_relative_eq!(v_fine[(i, j)], v[(i, j)], epsilon = 1e-9);
                    }
                }
            });

        // Between samples the error is bounded by the linear interpolation error
        // |f''| h^2 / 8 with f = w exp(-w) scaled by row index
        let h = 0.1;
        let max_second_derivative = 2.;
        fine.omega
            .iter()
            .zip(fine.values.iter())
            .filter(|(w, _)| **w >= 0.1)
            .for_each(|(&w, v)| {
                let exact = damping(w);
                for i in 0..6 {
                    let bound = (i + 1) as f64 * max_second_derivative * h * h / 8. + 1e-12;
                    assert!((v[(i, 0)] - exact[(i, 0)]).abs() <= bound);
                }
            });
    }
}
