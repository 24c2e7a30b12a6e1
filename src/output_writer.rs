use std::io::Write;

use itertools::Itertools;

use crate::{components::hydro::HydroBody, error::HydroError, kernels::RadiationKernel};

const DOF_NAMES: [&str; 6] = ["fx", "fy", "fz", "mx", "my", "mz"];
const CONTRIBUTIONS: [&str; 5] = ["restoring", "radiation", "diffraction", "second_order", "total"];

/// CSV time series of the per-DOF load breakdown of every body, one column
/// per body, contribution and DOF
pub struct OutputWriter<W: Write> {
    writer: csv::Writer<W>,
    n_bodies: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create the writer and write the header record
    pub fn new(writer: W, bodies: &[HydroBody]) -> Result<Self, HydroError> {
        let mut writer = csv::WriterBuilder::new().from_writer(writer);

        let columns = bodies.iter().flat_map(|body| {
            CONTRIBUTIONS.iter().flat_map(move |c| {
                DOF_NAMES
                    .iter()
                    .map(move |d| format!("{}_{c}_{d}", body.name))
            })
        });
        writer.write_record(std::iter::once("time".to_string()).chain(columns))?;

        Ok(Self {
            writer,
            n_bodies: bodies.len(),
        })
    }

    /// Write the loads from the last evaluation at time `t`
    pub fn write(&mut self, t: f64, bodies: &[HydroBody]) -> Result<(), HydroError> {
        debug_assert_eq!(bodies.len(), self.n_bodies);
        let values = bodies.iter().flat_map(|body| {
            let l = &body.loads;
            [l.restoring, l.radiation, l.diffraction, l.second_order, l.total]
                .into_iter()
                .flatten()
        });
        self.writer
            .write_record(std::iter::once(t).chain(values).map(|v| v.to_string()))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), HydroError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W, HydroError> {
        self.writer
            .into_inner()
            .map_err(|e| HydroError::Io(e.into_error()))
    }
}

/// Write the radiation kernel as CSV records of `time, K11, K12, ..., K66`
pub fn write_radiation_kernel(
    writer: impl Write,
    kernel: &RadiationKernel,
) -> Result<(), HydroError> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);

    let header = (1..=6)
        .cartesian_product(1..=6)
        .map(|(i, j)| format!("K{i}{j}"));
    writer.write_record(std::iter::once("time".to_string()).chain(header))?;

    for (k, m) in kernel.values.iter().enumerate() {
        let row = (0..6).cartesian_product(0..6).map(|(i, j)| m[(i, j)]);
        writer.write_record(
            std::iter::once(k as f64 * kernel.dt)
                .chain(row)
                .map(|v| v.to_string()),
        )?;
    }
    writer.flush()?;
    Ok(())
}
