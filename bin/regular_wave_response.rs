use std::{
    f64::consts::PI,
    fs::File,
    io::{BufWriter, Write},
    process,
};

use itertools::Itertools;
use log::{error, info};
use potflow::{
    components::hydro::HydroComponent,
    config::{read_config_from_file, BodyConfig, HydroConfig},
    databank::{BodyCoefficients, ExcitationRecord, RadiationRecord},
    error::HydroError,
    output_writer::{write_radiation_kernel, OutputWriter},
    waves::{IrregularWaves, WaveField},
};

const RADIUS: f64 = 5.; // Cylinder radius (m)
const DRAFT: f64 = 10.; // Cylinder draft (m)

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<(), HydroError> {
    //--------------------------------------------------------------------------
    // Configuration
    //--------------------------------------------------------------------------

    let config = match std::env::args().nth(1) {
        Some(path) => read_config_from_file(&path)?,
        None => default_config(),
    };
    if config.bodies.is_empty() {
        return Err(HydroError::InvalidConfig("no bodies configured".to_string()));
    }

    let rho = config.water_density;
    let g = config.gravity;
    let area = PI * RADIUS * RADIUS;
    let mass = rho * area * DRAFT;

    //--------------------------------------------------------------------------
    // Hydrodynamics
    //--------------------------------------------------------------------------

    let coefficients = config
        .bodies
        .iter()
        .map(|_| cylinder_coefficients(rho, g))
        .collect_vec();

    let amplitude = 1.;
    let omega = 0.8;
    let waves = IrregularWaves::regular(amplitude, omega, 0., 0., g);

    let mut hydro = HydroComponent::new(&config, &coefficients, &waves)?;
    let mut bodies = hydro.body_data();

    if let Some(kernel) = &hydro.bodies[0].radiation {
        let mut file = BufWriter::new(File::create("radiation_kernel.csv")?);
        write_radiation_kernel(&mut file, kernel)?;
        file.flush()?;
    }

    //--------------------------------------------------------------------------
    // Time integration of free heave
    //--------------------------------------------------------------------------

    let time_step = config.time_step;
    let n_steps = (200. / time_step) as usize;
    let total_mass = mass + bodies[0].added_mass[(2, 2)];

    let file = BufWriter::new(File::create("regular_wave_response.csv")?);
    let mut writer = OutputWriter::new(file, &hydro.bodies)?;

    let mut z = 0.;
    let mut w = 0.;
    for i in 0..n_steps {
        let t = i as f64 * time_step;

        bodies[0].set_motion(&[0., 0., z, 0., 0., 0.], &[0., 0., w, 0., 0., 0.]);
        hydro.calculate_loads(t, &mut bodies, &waves);
        writer.write(t, &hydro.bodies)?;

        // Semi-implicit Euler on heave only
        let f_heave = hydro.bodies[0].loads.total[2];
        w += time_step * f_heave / total_mass;
        z += time_step * w;
    }
    writer.flush()?;

    info!(
        "heave after {} s: z = {z:.4} m, wave elevation {:.4} m",
        n_steps as f64 * time_step,
        waves.elevation(&hydro.bodies[0].reference_point, n_steps as f64 * time_step)
    );
    println!("success");
    Ok(())
}

fn default_config() -> HydroConfig {
    let mut config = HydroConfig::default();
    let stiffness = config.water_density * config.gravity * PI * RADIUS * RADIUS;

    let mut body = BodyConfig {
        name: "cylinder".to_string(),
        center_of_gravity: [0., 0., -DRAFT / 2.],
        interface_point: [0., 0., 0.],
        ..Default::default()
    };
    body.restoring.stiffness[2][2] = stiffness;
    config.bodies.push(body);
    config
}

/// Approximate heave coefficients of a deep-draft vertical cylinder
fn cylinder_coefficients(rho: f64, g: f64) -> BodyCoefficients {
    let area = PI * RADIUS * RADIUS;
    let omegas = (1..=60).map(|k| 0.05 * k as f64).collect_vec();

    let radiation = omegas
        .iter()
        .map(|&omega| {
            let r = omega / 1.2;
            RadiationRecord {
                omega,
                i: 3,
                j: 3,
                added_mass: 0.6 * rho * area * RADIUS,
                damping: 0.15 * rho * area * RADIUS * omega * r * r * (1. - r * r).exp(),
            }
        })
        .collect_vec();

    // Froude-Krylov heave with the pressure decay at the keel
    let excitation = omegas
        .iter()
        .flat_map(|&omega| {
            let heave = rho * g * area * (-omega * omega / g * DRAFT).exp();
            [0., 90., 180., 270.].into_iter().flat_map(move |heading| {
                (1..=6).map(move |dof| ExcitationRecord {
                    omega,
                    heading,
                    dof,
                    magnitude: if dof == 3 { heave } else { 0. },
                    phase_deg: 0.,
                })
            })
        })
        .collect_vec();

    BodyCoefficients {
        radiation,
        excitation,
        ..Default::default()
    }
}
