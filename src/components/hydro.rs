use faer::prelude::*;
use itertools::Itertools;
use log::{error, info, warn};

use crate::{
    components::body_data::BodyData,
    config::{BodyConfig, HydroConfig},
    databank::{BodyCoefficients, HydroDatabank},
    error::{Channel, HydroError},
    history::{RingBuffer, VelocityHistory, WaveAmplitudeHistory},
    kernels::{
        diffraction::build_diffraction_kernel, radiation::build_radiation_kernel,
        DiffractionKernel, HeadingGrid, RadiationKernel,
    },
    qtf::{build_second_order, SecondOrderForce},
    restoring::RestoringForce,
    spectrum::{resample, ExcitationSample, OneSidedSpectrum},
    util::transfer_loads,
    waves::WaveField,
};

//------------------------------------------------------------------------------
// Component
//------------------------------------------------------------------------------

/// Potential-flow hydrodynamic loads for every floating body in the model
pub struct HydroComponent {
    pub bodies: Vec<HydroBody>,
}

impl HydroComponent {
    /// Build kernels and runtime state for each body in `config.bodies` from
    /// its coefficient rows. Channels with bad coefficients are disabled and
    /// reported on the body; only configuration errors are returned.
    pub fn new(
        config: &HydroConfig,
        coefficients: &[BodyCoefficients],
        wave: &dyn WaveField,
    ) -> Result<Self, HydroError> {
        config.validate()?;
        if coefficients.len() != config.bodies.len() {
            return Err(HydroError::InvalidConfig(format!(
                "{} bodies configured but {} coefficient sets supplied",
                config.bodies.len(),
                coefficients.len()
            )));
        }

        Ok(HydroComponent {
            bodies: config
                .bodies
                .iter()
                .zip(coefficients.iter())
                .enumerate()
                .map(|(id, (body, coeffs))| HydroBody::new(id, config, body, coeffs, wave))
                .collect(),
        })
    }

    /// Hand-off structures for the structural solver, one per body
    pub fn body_data(&self) -> Vec<BodyData> {
        self.bodies
            .iter()
            .map(|body| {
                let mut data = BodyData::new(body.id);
                data.added_mass.copy_from(&body.added_mass_inf);
                data
            })
            .collect()
    }

    /// Read each body's motion from `bodies`, calculate the hydrodynamic loads
    /// at time `t`, and write them back at the reference points (and moved to
    /// the interface points).
    ///
    /// `wave` must be the realization the component was built with: the
    /// second-order loads are interpolated onto its components once, at
    /// construction.
    pub fn calculate_loads(&mut self, t: f64, bodies: &mut [BodyData], wave: &dyn WaveField) {
        self.bodies
            .iter_mut()
            .zip(bodies.iter_mut())
            .for_each(|(body, data)| {
                let (position, velocity) = data.motion();
                body.calculate_loads(t, &position, &velocity, wave);
                data.set_loads(&body.loads.total, &body.loads_at_interface());
            });
    }
}

//------------------------------------------------------------------------------
// Body
//------------------------------------------------------------------------------

/// Load contributions at the hydrodynamic reference point from the last evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HydroLoads {
    pub restoring: [f64; 6],
    pub radiation: [f64; 6],
    pub diffraction: [f64; 6],
    pub second_order: [f64; 6],
    pub total: [f64; 6],
}

impl HydroLoads {
    fn sum(&mut self) {
        self.total = std::array::from_fn(|i| {
            self.restoring[i] + self.radiation[i] + self.diffraction[i] + self.second_order[i]
        });
    }
}

pub struct HydroBody {
    pub id: usize,
    pub name: String,

    // Geometry
    pub center_of_gravity: [f64; 3],
    pub reference_point: [f64; 3], // Loads are produced here
    pub interface_point: [f64; 3], // Loads are handed to the structure here

    // Load models
    pub radiation: Option<RadiationKernel>,
    pub diffraction: Option<DiffractionKernel>,
    pub second_order: Option<SecondOrderForce>,
    pub restoring: RestoringForce,
    pub added_mass_inf: Mat<f64>, // Infinite-frequency added mass `[6][6]`

    // Convolution state
    pub dt: f64,                            // Convolution time step
    pub velocity_history: VelocityHistory,  // Velocity at each past tick
    pub wave_history: WaveAmplitudeHistory, // Look-ahead elevation per heading bucket
    t_start: Option<f64>,                   // Time of the first tick
    n_ticks: usize,                         // Ticks pushed so far
    t_last: f64,                            // Time of the last call
    v_last: [f64; 6],                       // Velocity at the last call

    pub loads: HydroLoads,
    pub wave_mismatch: bool, // Called with a wave field other than the construction one

    pub warnings: Vec<HydroError>, // Recovered conditions found during construction
    pub disabled: Vec<HydroError>, // Conditions that disabled a load channel
}

impl HydroBody {
    pub fn new(
        id: usize,
        config: &HydroConfig,
        body: &BodyConfig,
        coefficients: &BodyCoefficients,
        wave: &dyn WaveField,
    ) -> Self {
        let dt = config.time_step;
        let mut warnings = vec![];
        let mut disabled = vec![];

        let databank = HydroDatabank::ingest(id, coefficients, config.heading_tolerance);
        disabled.extend(databank.errors);

        //----------------------------------------------------------------------
        // Radiation
        //----------------------------------------------------------------------

        let mut added_mass_inf = Mat::<f64>::zeros(6, 6);

        let radiation = databank.radiation.as_ref().and_then(|table| {
            added_mass_inf.copy_from(table.added_mass_inf());

            let spectrum = resample(&table.omega, &table.damping, config.radiation_frequency_step);
            warnings.extend(out_of_range(id, Channel::Radiation, &table.omega, &spectrum));

            build_radiation_kernel(id, &spectrum.two_sided(), dt, config.radiation_steps())
                .map_err(|e| {
                    error!("{e}; radiation load disabled");
                    disabled.push(e);
                })
                .ok()
        });

        //----------------------------------------------------------------------
        // Diffraction
        //----------------------------------------------------------------------

        let grid = HeadingGrid::uniform(config.heading_step);

        let diffraction = databank.excitation.as_ref().and_then(|table| {
            let samples = table
                .values
                .iter()
                .map(|x| ExcitationSample(x.clone()))
                .collect_vec();

            let spectrum = resample(&table.omega, &samples, config.diffraction_frequency_step);
            warnings.extend(out_of_range(id, Channel::Diffraction, &table.omega, &spectrum));

            match build_diffraction_kernel(
                id,
                &spectrum.two_sided(),
                &table.headings,
                &grid,
                dt,
                config.diffraction_half_steps(),
            ) {
                Ok((kernel, extrapolated)) => {
                    // Only buckets the incident waves fall into are reported
                    let occupied = wave
                        .components()
                        .iter()
                        .map(|c| grid.nearest(c.heading))
                        .unique()
                        .collect_vec();
                    warnings.extend(extrapolated.into_iter().filter(|w| match w {
                        HydroError::HeadingExtrapolated { requested, .. } => {
                            occupied.contains(&grid.nearest(*requested))
                        }
                        _ => true,
                    }));
                    Some(kernel)
                }
                Err(e) => {
                    error!("{e}; diffraction load disabled");
                    disabled.push(e);
                    None
                }
            }
        });

        //----------------------------------------------------------------------
        // Second order
        //----------------------------------------------------------------------

        let (second_order, qtf_warnings) = build_second_order(
            id,
            config.second_order,
            databank.qtf_difference.as_ref(),
            databank.qtf_sum.as_ref(),
            wave.components(),
            &body.reference_point,
        );
        warnings.extend(qtf_warnings);

        //----------------------------------------------------------------------
        // Histories
        //----------------------------------------------------------------------

        let velocity_history = RingBuffer::new(config.radiation_steps() + 1, [0.; 6]);
        let wave_history = RingBuffer::new(
            2 * config.diffraction_half_steps() + 1,
            vec![0.; grid.len()],
        );

        // Kernel and history lengths must agree or the convolution reads the wrong samples
        if let Some(kernel) = &radiation {
            assert_eq!(kernel.len(), velocity_history.capacity());
        }
        if let Some(kernel) = &diffraction {
            assert_eq!(kernel.len(), wave_history.capacity());
            assert_eq!(kernel.headings.len(), grid.len());
        }

        warnings.iter().for_each(|w| warn!("{w}"));

        info!(
            "body {id} '{}': radiation {}, diffraction {}, second-order {:?}, {} warnings, {} disabled",
            body.name,
            radiation
                .as_ref()
                .map_or("off".to_string(), |k| format!("{} steps", k.len())),
            diffraction
                .as_ref()
                .map_or("off".to_string(), |k| format!(
                    "{} steps x {} headings",
                    k.len(),
                    k.headings.len()
                )),
            second_order.as_ref().map(|s| s.mode),
            warnings.len(),
            disabled.len()
        );

        HydroBody {
            id,
            name: body.name.clone(),
            center_of_gravity: body.center_of_gravity,
            reference_point: body.reference_point,
            interface_point: body.interface_point,
            radiation,
            diffraction,
            second_order,
            restoring: RestoringForce::new(&body.restoring),
            added_mass_inf,
            dt,
            velocity_history,
            wave_history,
            t_start: None,
            n_ticks: 0,
            t_last: 0.,
            v_last: [0.; 6],
            loads: HydroLoads::default(),
            wave_mismatch: false,
            warnings,
            disabled,
        }
    }

    /// Calculate the loads at time `t` for the given reference point motion.
    ///
    /// The convolutions advance on their own `dt` grid starting at the first
    /// call. Every tick that elapsed since the previous call is pushed with
    /// the velocity linearly interpolated between the two calls, and the
    /// convolution loads are held until the next tick. Calling again at the
    /// same time replaces the latest velocity sample. Times earlier than the
    /// previous call are ignored.
    ///
    /// The second-order load stays tied to the wave field given to `new`. A
    /// different `wave` here is used for diffraction only and sets
    /// `wave_mismatch`.
    pub fn calculate_loads(
        &mut self,
        t: f64,
        position: &[f64; 6],
        velocity: &[f64; 6],
        wave: &dyn WaveField,
    ) -> HydroLoads {
        let eps = 1e-6 * self.dt;

        match self.t_start {
            None => {
                self.t_start = Some(t);
                self.t_last = t;
                self.v_last = *velocity;
                self.push_tick(t, velocity, wave);
                self.update_convolution();
            }
            Some(t0) => {
                debug_assert!(t >= self.t_last - eps, "time moved backwards");
                if t < self.t_last - eps {
                    return self.loads;
                }

                let t_front = t0 + (self.n_ticks - 1) as f64 * self.dt;
                let mut pushed = false;
                loop {
                    let tk = t0 + self.n_ticks as f64 * self.dt;
                    if tk > t + eps {
                        break;
                    }
                    let w = if t - self.t_last > eps {
                        ((tk - self.t_last) / (t - self.t_last)).clamp(0., 1.)
                    } else {
                        1.
                    };
                    let v: [f64; 6] =
                        std::array::from_fn(|i| (1. - w) * self.v_last[i] + w * velocity[i]);
                    self.push_tick(tk, &v, wave);
                    pushed = true;
                }

                if !pushed && (t - t_front).abs() <= eps {
                    *self.velocity_history.front_mut() = *velocity;
                    pushed = true;
                }
                if pushed {
                    self.update_convolution();
                }

                self.t_last = t;
                self.v_last = *velocity;
            }
        }

        if let Some(second_order) = &self.second_order {
            if !self.wave_mismatch && !second_order.is_built_for(wave.components()) {
                warn!(
                    "body {}: wave field differs from the one the second-order load was built for",
                    self.id
                );
                self.wave_mismatch = true;
            }
        }

        // Instantaneous contributions
        self.loads.restoring = self.restoring.force(position, velocity);
        self.loads.second_order = self
            .second_order
            .as_ref()
            .map_or([0.; 6], |s| s.force(t));
        self.loads.sum();
        self.loads
    }

    /// Push the samples for convolution tick time `tk`
    fn push_tick(&mut self, tk: f64, velocity: &[f64; 6], wave: &dyn WaveField) {
        self.n_ticks += 1;
        self.velocity_history.push(*velocity);
        if let Some(kernel) = &self.diffraction {
            // Acausal kernel needs the elevation half a window ahead
            wave.directional_elevation(
                &self.reference_point,
                tk + kernel.half_window(),
                &kernel.headings,
                self.wave_history.advance(),
            );
        }
    }

    fn update_convolution(&mut self) {
        self.loads.radiation = self
            .radiation
            .as_ref()
            .map_or([0.; 6], |k| k.force(&self.velocity_history));
        self.loads.diffraction = self
            .diffraction
            .as_ref()
            .map_or([0.; 6], |k| k.force(&self.wave_history));
    }

    /// Total loads moved from the reference point to the interface point
    pub fn loads_at_interface(&self) -> [f64; 6] {
        transfer_loads(&self.loads.total, &self.reference_point, &self.interface_point)
    }

    /// Total loads moved from the reference point to the center of gravity
    pub fn loads_at_center_of_gravity(&self) -> [f64; 6] {
        transfer_loads(&self.loads.total, &self.reference_point, &self.center_of_gravity)
    }

    /// Returns true if `channel` produces loads for this body
    pub fn is_active(&self, channel: Channel) -> bool {
        match channel {
            Channel::Radiation => self.radiation.is_some(),
            Channel::Diffraction => self.diffraction.is_some(),
            Channel::DifferenceFrequency | Channel::SumFrequency => self.second_order.is_some(),
        }
    }
}

/// Frequency range warning for the first grid frequency that had to be clamped
fn out_of_range<T>(
    body: usize,
    channel: Channel,
    supplied: &[f64],
    spectrum: &OneSidedSpectrum<T>,
) -> Option<HydroError> {
    spectrum
        .out_of_range
        .first()
        .map(|&requested| HydroError::FrequencyOutOfRange {
            body,
            channel,
            requested,
            min: supplied[0],
            max: supplied[supplied.len() - 1],
        })
}
