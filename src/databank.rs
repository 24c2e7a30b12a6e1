use faer::prelude::*;
use itertools::Itertools;
use log::{debug, error};
use num_complex::Complex64;

use crate::{
    error::{Channel, HydroError},
    interp::wrap_heading,
};

//------------------------------------------------------------------------------
// Tokenized input records
//------------------------------------------------------------------------------

/// Radiation row `{omega, i, j, added_mass_ij, damping_ij}`; `i` and `j` are
/// 1-based degree-of-freedom indices as written by panel-method solvers.
#[derive(Debug, Clone, Copy)]
pub struct RadiationRecord {
    pub omega: f64,
    pub i: usize,
    pub j: usize,
    pub added_mass: f64,
    pub damping: f64,
}

/// Excitation row `{omega, heading, dof, magnitude, phase}`; heading and phase in degrees
#[derive(Debug, Clone, Copy)]
pub struct ExcitationRecord {
    pub omega: f64,
    pub heading: f64,
    pub dof: usize,
    pub magnitude: f64,
    pub phase_deg: f64,
}

/// Second-order transfer function row `{omega_i, omega_j, dof, magnitude, phase}`
#[derive(Debug, Clone, Copy)]
pub struct QtfRecord {
    pub omega_i: f64,
    pub omega_j: f64,
    pub dof: usize,
    pub magnitude: f64,
    pub phase_deg: f64,
}

/// All coefficient rows supplied for one body
#[derive(Debug, Clone, Default)]
pub struct BodyCoefficients {
    pub radiation: Vec<RadiationRecord>,
    pub excitation: Vec<ExcitationRecord>,
    pub qtf_difference: Vec<QtfRecord>,
    pub qtf_sum: Vec<QtfRecord>,
}

//------------------------------------------------------------------------------
// Normalized tables
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RadiationTable {
    pub omega: Vec<f64>,         // Ascending frequencies (rad/s)
    pub added_mass: Vec<Mat<f64>>, // 6x6 added mass per frequency
    pub damping: Vec<Mat<f64>>,  // 6x6 radiation damping per frequency
}

impl RadiationTable {
    /// Added mass at the highest supplied frequency, used as the infinite-frequency limit
    pub fn added_mass_inf(&self) -> &Mat<f64> {
        &self.added_mass[self.added_mass.len() - 1]
    }
}

#[derive(Debug, Clone)]
pub struct ExcitationTable {
    pub omega: Vec<f64>,                  // Ascending frequencies (rad/s)
    pub headings: Vec<f64>,               // Ascending, deduplicated headings in [0, 360) deg
    pub values: Vec<Vec<[Complex64; 6]>>, // Excitation `[n_freq][n_heading][6]`
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QtfKind {
    /// Hermitian: Q(j,i) = conj(Q(i,j))
    Difference,
    /// Symmetric: Q(j,i) = Q(i,j)
    Sum,
}

impl QtfKind {
    pub fn channel(&self) -> Channel {
        match self {
            QtfKind::Difference => Channel::DifferenceFrequency,
            QtfKind::Sum => Channel::SumFrequency,
        }
    }
}

/// Square complex matrix indexed by a pair of frequencies
#[derive(Debug, Clone)]
pub struct QtfMatrix {
    n: usize,
    data: Vec<Complex64>,
    supplied: Vec<bool>,
}

impl QtfMatrix {
    pub fn zeros(n: usize) -> Self {
        QtfMatrix {
            n,
            data: vec![Complex64::new(0., 0.); n * n],
            supplied: vec![false; n * n],
        }
    }

    /// Fully populated matrix with entries `f(i, j)`
    pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> Complex64) -> Self {
        QtfMatrix {
            n,
            data: (0..n * n).map(|k| f(k / n, k % n)).collect(),
            supplied: vec![true; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.n + j]
    }

    /// Set an upstream-supplied entry
    pub fn set(&mut self, i: usize, j: usize, value: Complex64) {
        self.data[i * self.n + j] = value;
        self.supplied[i * self.n + j] = true;
    }

    pub fn is_supplied(&self, i: usize, j: usize) -> bool {
        self.supplied[i * self.n + j]
    }

    /// Fill the missing half of the matrix from the supplied half.
    ///
    /// Entries supplied on both sides of the diagonal are left as given. For
    /// difference-frequency tables the diagonal is made real.
    pub fn mirror(&mut self, kind: QtfKind) {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                match (self.is_supplied(i, j), self.is_supplied(j, i)) {
                    (true, false) => {
                        let v = self.get(i, j);
                        self.data[j * self.n + i] = mirrored(v, kind);
                    }
                    (false, true) => {
                        let v = self.get(j, i);
                        self.data[i * self.n + j] = mirrored(v, kind);
                    }
                    _ => (),
                }
            }
        }
        if kind == QtfKind::Difference {
            (0..self.n).for_each(|i| {
                let d = &mut self.data[i * self.n + i];
                d.im = 0.;
            });
        }
    }
}

#[inline]
fn mirrored(v: Complex64, kind: QtfKind) -> Complex64 {
    match kind {
        QtfKind::Difference => v.conj(),
        QtfKind::Sum => v,
    }
}

#[derive(Debug, Clone)]
pub struct QtfTable {
    pub kind: QtfKind,
    pub omega: Vec<f64>,        // Ascending frequencies shared by both indices (rad/s)
    pub dofs: Vec<QtfMatrix>,   // One matrix per force/moment component
}

//------------------------------------------------------------------------------
// Databank
//------------------------------------------------------------------------------

/// Read-only, validated coefficients for one body. A channel is `None` when
/// it was not supplied or failed validation; failures are kept in `errors`.
#[derive(Debug)]
pub struct HydroDatabank {
    pub body: usize,
    pub radiation: Option<RadiationTable>,
    pub excitation: Option<ExcitationTable>,
    pub qtf_difference: Option<QtfTable>,
    pub qtf_sum: Option<QtfTable>,
    pub errors: Vec<HydroError>,
}

impl HydroDatabank {
    /// Validate and normalize the coefficient rows of one body
    pub fn ingest(body: usize, input: &BodyCoefficients, heading_tolerance: f64) -> Self {
        let mut errors = vec![];

        // Channels without rows were not supplied and are simply absent
        let radiation = (!input.radiation.is_empty())
            .then(|| ingest_radiation(body, &input.radiation))
            .and_then(|r| {
                r.map_err(|e| {
                    error!("{e}; radiation load disabled");
                    errors.push(e);
                })
                .ok()
            });

        let excitation = (!input.excitation.is_empty())
            .then(|| ingest_excitation(body, &input.excitation, heading_tolerance))
            .and_then(|r| {
                r.map_err(|e| {
                    error!("{e}; diffraction load disabled");
                    errors.push(e);
                })
                .ok()
            });

        let mut qtf = |records: &[QtfRecord], kind: QtfKind| {
            if records.is_empty() {
                return None;
            }
            ingest_qtf(body, records, kind)
                .map_err(|e| {
                    error!("{e}; {} load disabled", kind.channel());
                    errors.push(e);
                })
                .ok()
        };
        let qtf_difference = qtf(&input.qtf_difference, QtfKind::Difference);
        let qtf_sum = qtf(&input.qtf_sum, QtfKind::Sum);

        debug!(
            "body {body}: databank radiation={} excitation={} qtf_difference={} qtf_sum={}",
            radiation.is_some(),
            excitation.is_some(),
            qtf_difference.is_some(),
            qtf_sum.is_some()
        );

        HydroDatabank {
            body,
            radiation,
            excitation,
            qtf_difference,
            qtf_sum,
            errors,
        }
    }
}

pub fn ingest_radiation(
    body: usize,
    records: &[RadiationRecord],
) -> Result<RadiationTable, HydroError> {
    let malformed = |reason: String| HydroError::malformed(body, Channel::Radiation, reason);

    if let Some(r) = records
        .iter()
        .find(|r| !(1..=6).contains(&r.i) || !(1..=6).contains(&r.j))
    {
        return Err(malformed(format!(
            "dimension mismatch: dof pair ({}, {}) outside 1..=6",
            r.i, r.j
        )));
    }
    if records
        .iter()
        .any(|r| !r.added_mass.is_finite() || !r.damping.is_finite())
    {
        return Err(malformed("non-finite coefficient".to_string()));
    }

    let (omega, freq_index) =
        index_frequencies(&records.iter().map(|r| r.omega).collect_vec()).map_err(malformed)?;

    let mut added_mass = vec![Mat::<f64>::zeros(6, 6); omega.len()];
    let mut damping = vec![Mat::<f64>::zeros(6, 6); omega.len()];
    let mut filled = vec![[[false; 6]; 6]; omega.len()];
    for (r, k) in records.iter().zip(freq_index) {
        let (i, j) = (r.i - 1, r.j - 1);
        if filled[k][i][j]
            && (added_mass[k][(i, j)] != r.added_mass || damping[k][(i, j)] != r.damping)
        {
            return Err(malformed(format!(
                "conflicting duplicate entry ({}, {}) at {} rad/s",
                r.i, r.j, omega[k]
            )));
        }
        added_mass[k][(i, j)] = r.added_mass;
        damping[k][(i, j)] = r.damping;
        filled[k][i][j] = true;
    }

    Ok(RadiationTable {
        omega,
        added_mass,
        damping,
    })
}

pub fn ingest_excitation(
    body: usize,
    records: &[ExcitationRecord],
    heading_tolerance: f64,
) -> Result<ExcitationTable, HydroError> {
    let malformed = |reason: String| HydroError::malformed(body, Channel::Diffraction, reason);

    if let Some(r) = records.iter().find(|r| !(1..=6).contains(&r.dof)) {
        return Err(malformed(format!(
            "dimension mismatch: dof {} outside 1..=6",
            r.dof
        )));
    }
    if records
        .iter()
        .any(|r| !(r.heading.is_finite() && r.magnitude.is_finite() && r.phase_deg.is_finite()))
    {
        return Err(malformed("non-finite coefficient".to_string()));
    }

    let (omega, freq_index) =
        index_frequencies(&records.iter().map(|r| r.omega).collect_vec()).map_err(malformed)?;

    let (headings, heading_index) = normalize_headings(
        &records.iter().map(|r| r.heading).collect_vec(),
        heading_tolerance,
    );

    // Later rows overwrite earlier rows mapped to the same slot
    let zero = Complex64::new(0., 0.);
    let mut values = vec![vec![[zero; 6]; headings.len()]; omega.len()];
    let mut filled = vec![vec![[false; 6]; headings.len()]; omega.len()];
    records
        .iter()
        .zip(freq_index)
        .zip(heading_index)
        .for_each(|((r, k), h)| {
            values[k][h][r.dof - 1] = Complex64::from_polar(r.magnitude, r.phase_deg.to_radians());
            filled[k][h][r.dof - 1] = true;
        });

    for (k, per_freq) in filled.iter().enumerate() {
        for (h, dofs) in per_freq.iter().enumerate() {
            let n_filled = dofs.iter().filter(|&&f| f).count();
            if n_filled != 6 {
                return Err(malformed(format!(
                    "dimension mismatch: heading {} deg at {} rad/s has {} of 6 components",
                    headings[h], omega[k], n_filled
                )));
            }
        }
    }

    Ok(ExcitationTable {
        omega,
        headings,
        values,
    })
}

pub fn ingest_qtf(
    body: usize,
    records: &[QtfRecord],
    kind: QtfKind,
) -> Result<QtfTable, HydroError> {
    let malformed = |reason: String| HydroError::malformed(body, kind.channel(), reason);

    if let Some(r) = records.iter().find(|r| !(1..=6).contains(&r.dof)) {
        return Err(malformed(format!(
            "dimension mismatch: dof {} outside 1..=6",
            r.dof
        )));
    }
    if records.iter().any(|r| {
        ![r.omega_i, r.omega_j, r.magnitude, r.phase_deg]
            .iter()
            .all(|v| v.is_finite())
            || r.omega_i <= 0.
            || r.omega_j <= 0.
    }) {
        return Err(malformed(
            "frequencies must be positive and coefficients finite".to_string(),
        ));
    }

    // Frequency pairs share one grid built from both indices
    let omega = records
        .iter()
        .flat_map(|r| [r.omega_i, r.omega_j])
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup_by(|a, b| same_frequency(*a, *b))
        .collect_vec();
    if omega.len() < 2 {
        return Err(malformed(format!(
            "{} frequency points, at least 2 required",
            omega.len()
        )));
    }

    let find = |w: f64| omega.iter().position(|&o| same_frequency(o, w));
    let mut dofs = vec![QtfMatrix::zeros(omega.len()); 6];
    for r in records {
        // Every record frequency came from the grid above
        let (Some(i), Some(j)) = (find(r.omega_i), find(r.omega_j)) else {
            unreachable!("QTF frequency missing from its own grid")
        };
        dofs[r.dof - 1].set(i, j, Complex64::from_polar(r.magnitude, r.phase_deg.to_radians()));
    }
    dofs.iter_mut().for_each(|m| m.mirror(kind));

    Ok(QtfTable { kind, omega, dofs })
}

//------------------------------------------------------------------------------
// Frequencies and headings
//------------------------------------------------------------------------------

fn same_frequency(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.)
}

/// Assign each row to a frequency. Rows may come in any order; the returned
/// frequencies are ascending and distinct.
fn index_frequencies(omegas: &[f64]) -> Result<(Vec<f64>, Vec<usize>), String> {
    if let Some(w) = omegas.iter().find(|w| !(w.is_finite() && **w > 0.)) {
        return Err(format!("frequency {w} rad/s is not positive and finite"));
    }

    let freqs = omegas
        .iter()
        .copied()
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup_by(|a, b| same_frequency(*a, *b))
        .collect_vec();
    if freqs.len() < 2 {
        return Err(format!(
            "{} frequency points, at least 2 required",
            freqs.len()
        ));
    }

    // Nearest sorted neighbour of each row lies within the merge tolerance
    let index = omegas
        .iter()
        .map(|&w| {
            let k = freqs.partition_point(|&f| f < w && !same_frequency(f, w));
            k.min(freqs.len() - 1)
        })
        .collect_vec();

    Ok((freqs, index))
}

/// Wrap headings into [0, 360), sort them, and merge entries closer than
/// `tolerance` degrees (including across 0/360). The last supplied heading of
/// each merged group is kept. Returns the ascending heading list and, for each
/// input entry, the index of the heading it maps to.
pub fn normalize_headings(raw: &[f64], tolerance: f64) -> (Vec<f64>, Vec<usize>) {
    if raw.is_empty() {
        return (vec![], vec![]);
    }

    let wrapped = raw.iter().map(|&h| wrap_heading(h)).collect_vec();
    let order = (0..raw.len())
        .sorted_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]))
        .collect_vec();

    // Group consecutive sorted entries within tolerance
    let mut groups: Vec<Vec<usize>> = vec![];
    for &k in &order {
        match groups.last_mut() {
            Some(g) if wrapped[k] - wrapped[*g.last().unwrap_or(&k)] <= tolerance => g.push(k),
            _ => groups.push(vec![k]),
        }
    }

    // Merge the group ending near 360 into the one starting near 0
    if groups.len() > 1 {
        let first = wrapped[groups[0][0]];
        let last = wrapped[*groups[groups.len() - 1].last().unwrap_or(&0)];
        if first + 360. - last <= tolerance {
            let tail = groups.pop().unwrap_or_default();
            groups[0].extend(tail);
        }
    }

    // Representative is the last supplied entry of each group
    let mut representatives = groups
        .iter()
        .enumerate()
        .map(|(g, members)| {
            let k = members.iter().copied().max().unwrap_or(0);
            (wrapped[k], g)
        })
        .collect_vec();
    representatives.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut index = vec![0; raw.len()];
    representatives
        .iter()
        .enumerate()
        .for_each(|(column, &(_, g))| {
            groups[g].iter().for_each(|&k| index[k] = column);
        });

    (representatives.iter().map(|&(h, _)| h).collect(), index)
}
