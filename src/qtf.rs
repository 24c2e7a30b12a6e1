use itertools::Itertools;
use log::debug;
use num_complex::Complex64;

use crate::{
    config::SecondOrderMode,
    databank::{QtfMatrix, QtfTable},
    error::HydroError,
    interp::{linear_weights, BilinearWeights, LinearWeights},
    waves::WaveComponent,
};

/// Difference-frequency term prepared for the selected evaluation mode
#[derive(Debug, Clone)]
enum DifferenceTerm {
    /// QTF on every component pair, one matrix per DOF
    Full(Vec<QtfMatrix>),
    /// Diagonal QTF per DOF `[6][n_component]`
    Newman(Vec<Vec<f64>>),
    /// Constant mean drift load
    MeanDrift([f64; 6]),
}

/// Second-order wave load on one body for a fixed wave realization. Table
/// entries are interpolated onto the component frequencies once at
/// construction; evaluation only combines them with the component phasors.
#[derive(Debug, Clone)]
pub struct SecondOrderForce {
    pub mode: SecondOrderMode,
    omega: Vec<f64>,
    amplitude: Vec<f64>,
    phase: Vec<f64>,
    difference: Option<DifferenceTerm>,
    sum: Option<Vec<QtfMatrix>>,
    components: Vec<WaveComponent>, // Realization the tables were interpolated for
}

/// Interpolate the difference and sum tables onto the wave components and
/// prepare them for `mode`. Returns `None` when the mode is off or no table
/// was supplied, together with frequency range warnings (one per channel).
///
/// `Newman` and `MeanDrift` only change the difference-frequency term; a sum
/// table, when present, is always evaluated in full.
pub fn build_second_order(
    body: usize,
    mode: SecondOrderMode,
    difference: Option<&QtfTable>,
    sum: Option<&QtfTable>,
    components: &[WaveComponent],
    reference_point: &[f64; 3],
) -> (Option<SecondOrderForce>, Vec<HydroError>) {
    let mut warnings = vec![];
    if mode == SecondOrderMode::Off || (difference.is_none() && sum.is_none()) {
        return (None, warnings);
    }

    let omega = components.iter().map(|c| c.omega).collect_vec();
    let amplitude = components.iter().map(|c| c.amplitude).collect_vec();
    let phase = components
        .iter()
        .map(|c| c.phase_at(reference_point))
        .collect_vec();

    // Interpolation weights of each component frequency on a table's grid
    let mut weights = |table: &QtfTable| {
        let lw = omega
            .iter()
            .map(|&w| linear_weights(&table.omega, w))
            .collect_vec();
        if let Some((&requested, _)) = omega.iter().zip(lw.iter()).find(|(_, w)| w.clamped) {
            let e = HydroError::FrequencyOutOfRange {
                body,
                channel: table.kind.channel(),
                requested,
                min: table.omega[0],
                max: table.omega[table.omega.len() - 1],
            };
            warnings.push(e);
        }
        lw
    };

    let difference = difference.map(|table| {
        let lw = weights(table);
        match mode {
            SecondOrderMode::Newman => DifferenceTerm::Newman(diagonal(table, &lw)),
            SecondOrderMode::MeanDrift => {
                let q = diagonal(table, &lw);
                DifferenceTerm::MeanDrift(std::array::from_fn(|d| {
                    amplitude
                        .iter()
                        .zip(q[d].iter())
                        .map(|(a, q)| a * a * q)
                        .sum()
                }))
            }
            _ => DifferenceTerm::Full(interpolate(table, &lw)),
        }
    });
    let sum = sum.map(|table| interpolate(table, &weights(table)));

    debug!(
        "body {body}: second-order {mode:?} on {} components, difference={} sum={}",
        omega.len(),
        difference.is_some(),
        sum.is_some()
    );

    let force = SecondOrderForce {
        mode,
        omega,
        amplitude,
        phase,
        difference,
        sum,
        components: components.to_vec(),
    };
    (Some(force), warnings)
}

/// Bilinear interpolation of every DOF matrix onto the component pairs
fn interpolate(table: &QtfTable, lw: &[LinearWeights]) -> Vec<QtfMatrix> {
    table
        .dofs
        .iter()
        .map(|q| {
            QtfMatrix::from_fn(lw.len(), |i, j| {
                BilinearWeights { x: lw[i], y: lw[j] }.apply(|a, b| q.get(a, b))
            })
        })
        .collect()
}

/// Real diagonal of every DOF matrix at the component frequencies
fn diagonal(table: &QtfTable, lw: &[LinearWeights]) -> Vec<Vec<f64>> {
    table
        .dofs
        .iter()
        .map(|q| {
            lw.iter()
                .map(|&w| BilinearWeights { x: w, y: w }.apply(|a, b| q.get(a, b)).re)
                .collect()
        })
        .collect()
}

impl SecondOrderForce {
    /// Returns true if the tables were interpolated onto `components`
    pub fn is_built_for(&self, components: &[WaveComponent]) -> bool {
        self.components == components
    }

    /// Mean drift load, when the difference term is evaluated in that mode
    pub fn mean_drift(&self) -> Option<[f64; 6]> {
        match &self.difference {
            Some(DifferenceTerm::MeanDrift(f)) => Some(*f),
            _ => None,
        }
    }

    /// Second-order load at time `t`
    pub fn force(&self, t: f64) -> [f64; 6] {
        // Component phasors a_i exp(i (w_i t + eps_i))
        let z = self
            .amplitude
            .iter()
            .zip(self.omega.iter())
            .zip(self.phase.iter())
            .map(|((&a, &w), &eps)| Complex64::from_polar(a, w * t + eps))
            .collect_vec();

        let mut f = [0.; 6];

        match &self.difference {
            Some(DifferenceTerm::Full(q)) => {
                q.iter().zip(f.iter_mut()).for_each(|(q, f)| {
                    *f += double_sum(&z, |zi, zj, i, j| zi * zj.conj() * q.get(i, j));
                });
            }
            Some(DifferenceTerm::Newman(q)) => {
                q.iter().zip(f.iter_mut()).for_each(|(q, f)| {
                    let (signed, plain) = z.iter().zip(q.iter()).fold(
                        (Complex64::new(0., 0.), Complex64::new(0., 0.)),
                        |(s, p), (&zi, &qi)| {
                            let r = qi.abs().sqrt();
                            (s + zi * (qi.signum() * r), p + zi * r)
                        },
                    );
                    *f += (signed * plain.conj()).re;
                });
            }
            Some(DifferenceTerm::MeanDrift(m)) => {
                f.iter_mut().zip(m.iter()).for_each(|(f, m)| *f += m);
            }
            None => (),
        }

        if let Some(q) = &self.sum {
            q.iter().zip(f.iter_mut()).for_each(|(q, f)| {
                *f += double_sum(&z, |zi, zj, i, j| zi * zj * q.get(i, j));
            });
        }

        f
    }
}

/// Real part of `sum_i sum_j term(z_i, z_j, i, j)`
#[inline]
fn double_sum(
    z: &[Complex64],
    term: impl Fn(Complex64, Complex64, usize, usize) -> Complex64,
) -> f64 {
    let mut acc = Complex64::new(0., 0.);
    for (i, &zi) in z.iter().enumerate() {
        for (j, &zj) in z.iter().enumerate() {
            acc += term(zi, zj, i, j);
        }
    }
    acc.re
}
