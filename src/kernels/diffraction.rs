use std::f64::consts::PI;

use faer::prelude::*;
use itertools::Itertools;
use log::debug;
use num_complex::Complex64;
use rayon::prelude::*;

use crate::{
    error::{Channel, HydroError},
    history::WaveAmplitudeHistory,
    interp::{heading_distance, linear_weights, wrap_heading},
    spectrum::{ExcitationSample, TwoSidedSpectrum},
    util::{mat_is_finite, mat_vec_accumulate},
};

//------------------------------------------------------------------------------
// Heading grid
//------------------------------------------------------------------------------

/// Ascending wave headings in [0, 360) degrees without duplicates
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingGrid {
    pub headings: Vec<f64>,
}

impl HeadingGrid {
    /// Uniform grid starting at 0 deg. The step is adjusted so that a whole
    /// number of buckets covers the circle.
    pub fn uniform(step: f64) -> Self {
        let n = ((360. / step).round() as usize).max(1);
        HeadingGrid {
            headings: (0..n).map(|k| k as f64 * 360. / n as f64).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.headings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
    }

    /// Index of the heading closest to `heading`, accounting for wraparound
    pub fn nearest(&self, heading: f64) -> usize {
        self.headings
            .iter()
            .position_min_by(|a, b| {
                heading_distance(**a, heading).total_cmp(&heading_distance(**b, heading))
            })
            .unwrap_or(0)
    }
}

/// Interpolation weights of a requested heading against a set of supplied headings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingWeights {
    pub i0: usize,
    pub i1: usize,
    pub w: f64,
    /// Supplied heading used in place of the request when no pair brackets it
    pub extrapolated: Option<f64>,
}

/// Linear interpolation in heading with wraparound at 0/360.
///
/// Wrapping across the seam is only used when the supplied headings cover the
/// circle, i.e. the gap across 0/360 is no wider than the widest interior gap.
/// Otherwise requests outside the supplied range take the nearest heading.
pub fn heading_weights(supplied: &[f64], heading: f64) -> HeadingWeights {
    let heading = wrap_heading(heading);
    let m = supplied.len();
    let first = supplied[0];
    let last = supplied[m - 1];

    if m == 1 {
        return HeadingWeights {
            i0: 0,
            i1: 0,
            w: 0.,
            extrapolated: (heading_distance(first, heading) > 1e-9).then_some(first),
        };
    }

    if heading >= first && heading <= last {
        let lw = linear_weights(supplied, heading);
        return HeadingWeights {
            i0: lw.i0,
            i1: lw.i1,
            w: lw.w,
            extrapolated: None,
        };
    }

    let seam_gap = first + 360. - last;
    let max_gap = supplied
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(0., f64::max);

    if seam_gap <= max_gap + 1e-9 {
        HeadingWeights {
            i0: m - 1,
            i1: 0,
            w: wrap_heading(heading - last) / seam_gap,
            extrapolated: None,
        }
    } else if heading_distance(heading, first) <= heading_distance(heading, last) {
        HeadingWeights {
            i0: 0,
            i1: 0,
            w: 0.,
            extrapolated: Some(first),
        }
    } else {
        HeadingWeights {
            i0: m - 1,
            i1: m - 1,
            w: 0.,
            extrapolated: Some(last),
        }
    }
}

//------------------------------------------------------------------------------
// Kernel
//------------------------------------------------------------------------------

/// Acausal diffraction impulse response. `values[i]` is the `[6][n_heading]`
/// matrix H(t_i) with t_i = (i - half_steps) dt, spanning -T..=T.
#[derive(Debug, Clone)]
pub struct DiffractionKernel {
    pub dt: f64,
    pub half_steps: usize,
    pub headings: HeadingGrid,
    pub values: Vec<Mat<f64>>,
}

impl DiffractionKernel {
    /// Fourier synthesis H(t, h) = Re[ sum_w X(w, h) exp(i w t) dw / (2 pi) ]
    /// over the two-sided excitation spectrum, for each supplied heading.
    pub fn new(
        excitation: &TwoSidedSpectrum<ExcitationSample>,
        headings: &[f64],
        dt: f64,
        half_steps: usize,
    ) -> Self {
        let quadrature = excitation.quadrature();
        let n_heading = headings.len();

        let values = (0..=2 * half_steps)
            .into_par_iter()
            .map(|i| {
                let t = (i as f64 - half_steps as f64) * dt;
                let phasors = quadrature
                    .points
                    .iter()
                    .zip(quadrature.weights.iter())
                    .map(|(&w, &q)| Complex64::from_polar(q / (2. * PI), w * t))
                    .collect_vec();

                let mut ht = Mat::<f64>::zeros(6, n_heading);
                excitation
                    .values
                    .iter()
                    .zip(phasors.iter())
                    .for_each(|(x, &p)| {
                        x.0.iter().enumerate().for_each(|(h, xh)| {
                            for d in 0..6 {
                                ht[(d, h)] += (xh[d] * p).re;
                            }
                        });
                    });
                ht
            })
            .collect::<Vec<_>>();

        debug!(
            "diffraction kernel: {} samples, dt = {dt} s, {n_heading} headings",
            values.len()
        );

        DiffractionKernel {
            dt,
            half_steps,
            headings: HeadingGrid {
                headings: headings.to_vec(),
            },
            values,
        }
    }

    /// Number of time samples, equal to the wave history capacity
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Half window T in seconds
    pub fn half_window(&self) -> f64 {
        self.half_steps as f64 * self.dt
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(mat_is_finite)
    }

    /// Kernel at time index `i` and heading column `h`
    #[inline]
    pub fn at(&self, i: usize, d: usize, h: usize) -> f64 {
        self.values[i][(d, h)]
    }

    /// Diffraction load `dt * sum_m sum_h H(m dt, h) eta(t - m dt, h)`.
    ///
    /// The history front holds the look-ahead sample eta(t + T), so slot `j`
    /// pairs with kernel time `(j - half_steps) dt`.
    pub fn force(&self, history: &WaveAmplitudeHistory) -> [f64; 6] {
        debug_assert_eq!(self.len(), history.capacity());
        let mut f = [0.; 6];
        self.values
            .iter()
            .zip(history.iter())
            .for_each(|(h, eta)| mat_vec_accumulate(&mut f, h, eta, self.dt));
        f
    }

    /// Linearly interpolate the kernel onto `grid`. Returns the new kernel and
    /// the `(requested, used)` headings that had to fall back to the nearest
    /// supplied heading.
    pub fn to_heading_grid(&self, grid: &HeadingGrid) -> (DiffractionKernel, Vec<(f64, f64)>) {
        let weights = grid
            .headings
            .iter()
            .map(|&h| heading_weights(&self.headings.headings, h))
            .collect_vec();

        let extrapolated = grid
            .headings
            .iter()
            .zip(weights.iter())
            .filter_map(|(&h, hw)| hw.extrapolated.map(|used| (h, used)))
            .collect_vec();

        let values = self
            .values
            .iter()
            .map(|ht| {
                Mat::from_fn(6, grid.len(), |d, g| {
                    let hw = &weights[g];
                    (1. - hw.w) * ht[(d, hw.i0)] + hw.w * ht[(d, hw.i1)]
                })
            })
            .collect_vec();

        (
            DiffractionKernel {
                dt: self.dt,
                half_steps: self.half_steps,
                headings: grid.clone(),
                values,
            },
            extrapolated,
        )
    }
}

/// Build the diffraction kernel on the supplied headings, then move it onto
/// the uniform heading grid. Extrapolated headings are returned as warnings.
pub fn build_diffraction_kernel(
    body: usize,
    excitation: &TwoSidedSpectrum<ExcitationSample>,
    headings: &[f64],
    grid: &HeadingGrid,
    dt: f64,
    half_steps: usize,
) -> Result<(DiffractionKernel, Vec<HydroError>), HydroError> {
    let kernel = DiffractionKernel::new(excitation, headings, dt, half_steps);
    if !kernel.is_finite() {
        return Err(HydroError::NumericDegenerate {
            body,
            channel: Channel::Diffraction,
        });
    }

    let (kernel, extrapolated) = kernel.to_heading_grid(grid);
    let warnings = extrapolated
        .into_iter()
        .map(|(requested, used)| HydroError::HeadingExtrapolated {
            body,
            requested,
            used,
        })
        .collect_vec();

    Ok((kernel, warnings))
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;
    use crate::spectrum::resample;

    #[test]
    fn test_uniform_heading_grid() {
        let grid = HeadingGrid::uniform(90.);
        assert_eq!(grid.headings, vec![0., 90., 180., 270.]);
        assert_eq!(grid.nearest(350.), 0);
        assert_eq!(grid.nearest(-100.), 3);
        assert_eq!(grid.nearest(134.), 1);

        // 7 deg does not divide 360, 51 buckets of 7.06 deg
        let grid = HeadingGrid::uniform(7.);
        assert_eq!(grid.len(), 51);
        assert!(grid.headings.iter().all(|&h| (0. ..360.).contains(&h)));
    }

    #[test]
    fn test_heading_weights() {
        struct Case {
            supplied: Vec<f64>,
            heading: f64,
            i0: usize,
            i1: usize,
            w: f64,
            extrapolated: Option<f64>,
        }

        let cases = vec![
            // Interior
            Case {
                supplied: vec![0., 90., 180., 270.],
                heading: 45.,
                i0: 0,
                i1: 1,
                w: 0.5,
                extrapolated: None,
            },
            // Across the seam when the circle is covered
            Case {
                supplied: vec![0., 90., 180., 270.],
                heading: 315.,
                i0: 3,
                i1: 0,
                w: 0.5,
                extrapolated: None,
            },
            Case {
                supplied: vec![30., 150., 270.],
                heading: 0.,
                i0: 2,
                i1: 0,
                w: 0.75,
                extrapolated: None,
            },
            // Partial coverage falls back to the nearest heading
            Case {
                supplied: vec![0., 30., 60.],
                heading: 90.,
                i0: 2,
                i1: 2,
                w: 0.,
                extrapolated: Some(60.),
            },
            Case {
                supplied: vec![0., 30., 60.],
                heading: 300.,
                i0: 0,
                i1: 0,
                w: 0.,
                extrapolated: Some(0.),
            },
            // Single heading
            Case {
                supplied: vec![0.],
                heading: 0.,
                i0: 0,
                i1: 0,
                w: 0.,
                extrapolated: None,
            },
            Case {
                supplied: vec![0.],
                heading: 10.,
                i0: 0,
                i1: 0,
                w: 0.,
                extrapolated: Some(0.),
            },
        ];

        for case in cases {
            let hw = heading_weights(&case.supplied, case.heading);
            assert_eq!((hw.i0, hw.i1), (case.i0, case.i1), "heading {}", case.heading);
            assert_relative_eq!(hw.w, case.w, epsilon = 1e-12);
            assert_eq!(hw.extrapolated, case.extrapolated);
        }
    }

    /// Excitation with a Gaussian envelope around 1 rad/s and a linear phase
    fn excitation_sample(w: f64, n_heading: usize) -> ExcitationSample {
        ExcitationSample(
            (0..n_heading)
                .map(|h| {
                    std::array::from_fn(|d| {
                        Complex64::from_polar(
                            (1. + d as f64 + h as f64) * (-((w - 1.) / 0.3).powi(2)).exp(),
                            -2. * w,
                        )
                    })
                })
                .collect(),
        )
    }

    #[test]
    fn test_kernel_recovers_excitation() {
        // sum_t H(t) exp(-i w0 t) dt reproduces X(w0)
        let omega = (1..=100).map(|k| 0.025 * k as f64).collect_vec();
        let values = omega.iter().map(|&w| excitation_sample(w, 2)).collect_vec();
        let spectrum = resample(&omega, &values, 0.025).two_sided();

        let dt = 0.05;
        let kernel = DiffractionKernel::new(&spectrum, &[0., 180.], dt, 600);
        assert_eq!(kernel.len(), 1201);
        assert_relative_eq!(kernel.half_window(), 30.);

        let w0 = 1.0;
        for h in 0..2 {
            for d in [0, 3] {
                let x = (0..kernel.len())
                    .map(|i| {
                        let t = (i as f64 - 600.) * dt;
                        Complex64::from_polar(kernel.at(i, d, h) * dt, -w0 * t)
                    })
                    .sum::<Complex64>();
                let x_exp = excitation_sample(w0, 2).0[h][d];
                assert_relative_eq!(x.re, x_exp.re, epsilon = 1e-3 * x_exp.norm());
                assert_relative_eq!(x.im, x_exp.im, epsilon = 1e-3 * x_exp.norm());
            }
        }
    }

    #[test]
    fn test_kernel_on_heading_grid() {
        let omega = vec![0.5, 1.0, 1.5];
        let values = omega.iter().map(|&w| excitation_sample(w, 2)).collect_vec();
        let spectrum = resample(&omega, &values, 0.25).two_sided();

        // Headings 0 and 90 only: the grid beyond 90 falls back to nearest
        let grid = HeadingGrid::uniform(45.);
        let (kernel, warnings) =
            build_diffraction_kernel(1, &spectrum, &[0., 90.], &grid, 0.1, 20).unwrap();
        assert_eq!(kernel.headings.len(), 8);
        assert_eq!(kernel.values[0].ncols(), 8);

        let raw = DiffractionKernel::new(&spectrum, &[0., 90.], 0.1, 20);
        for i in [0, 10, 20, 40] {
            assert_relative_eq!(kernel.at(i, 2, 0), raw.at(i, 2, 0), epsilon = 1e-12);
            assert_relative_eq!(
                kernel.at(i, 2, 1),
                0.5 * (raw.at(i, 2, 0) + raw.at(i, 2, 1)),
                epsilon = 1e-12
            );
            assert_relative_eq!(kernel.at(i, 2, 2), raw.at(i, 2, 1), epsilon = 1e-12);
            // 315 deg is nearest to 0 deg
            assert_relative_eq!(kernel.at(i, 2, 7), raw.at(i, 2, 0), epsilon = 1e-12);
        }

        // 135, 180, 225, 270, 315
        assert_eq!(warnings.len(), 5);
        assert!(warnings.iter().all(|w| matches!(
            w,
            HydroError::HeadingExtrapolated { body: 1, .. }
        )));
    }
}
