use approx::assert_relative_eq;
use faer::prelude::*;
use itertools::Itertools;
use potflow::{
    components::hydro::HydroBody,
    config::{BodyConfig, HydroConfig},
    databank::{BodyCoefficients, RadiationRecord},
    history::{RingBuffer, VelocityHistory},
    kernels::RadiationKernel,
    spectrum::resample,
    waves::IrregularWaves,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Heave damping B(w) = b0 exp(-(w/s)^2) sampled every 0.01 rad/s up to 4 rad/s
fn gaussian_heave_damping(b0: f64, s: f64) -> BodyCoefficients {
    BodyCoefficients {
        radiation: (1..=400)
            .map(|k| {
                let omega = 0.01 * k as f64;
                RadiationRecord {
                    omega,
                    i: 3,
                    j: 3,
                    added_mass: 0.,
                    damping: b0 * (-(omega / s).powi(2)).exp(),
                }
            })
            .collect(),
        ..Default::default()
    }
}

fn heave_config(time_step: f64, radiation_cutoff_time: f64) -> HydroConfig {
    HydroConfig {
        radiation_frequency_step: 0.05,
        radiation_cutoff_time,
        diffraction_cutoff_time: 1.,
        time_step,
        heading_step: 90.,
        bodies: vec![BodyConfig {
            name: "buoy".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Radiation heave force after driving the body at constant heave velocity
fn steady_heave_force(config: &HydroConfig, coefficients: &BodyCoefficients, duration: f64) -> f64 {
    let waves = IrregularWaves::still_water();
    let mut body = HydroBody::new(0, config, &config.bodies[0], coefficients, &waves);
    let n_steps = (duration / config.time_step).round() as usize;
    for i in 0..=n_steps {
        let t = i as f64 * config.time_step;
        body.calculate_loads(t, &[0.; 6], &[0., 0., 1., 0., 0., 0.], &waves);
    }
    body.loads.radiation[2]
}

#[test_log::test]
fn test_constant_heave_velocity_converges_to_low_frequency_damping() {
    let b0 = 2.;
    let config = heave_config(0.05, 60.);
    let coefficients = gaussian_heave_damping(b0, 0.5);

    let f = steady_heave_force(&config, &coefficients, 80.);

    // F -> -B(0) v, the discrete sum adds dt K(0) / 2 on top of the integral
    assert_relative_eq!(f, -b0, max_relative = 1.5e-2);
}

#[test_log::test]
fn test_truncation_beyond_decay_time_does_not_change_steady_state() {
    let coefficients = gaussian_heave_damping(2., 0.5);
    let f_30 = steady_heave_force(&heave_config(0.05, 30.), &coefficients, 70.);
    let f_60 = steady_heave_force(&heave_config(0.05, 60.), &coefficients, 70.);
    assert_relative_eq!(f_30, f_60, max_relative = 1e-4);
}

#[test_log::test]
fn test_impulse_produces_no_force_before_it_is_applied() {
    let config = heave_config(0.1, 10.);
    let waves = IrregularWaves::still_water();
    let mut body = HydroBody::new(
        0,
        &config,
        &config.bodies[0],
        &gaussian_heave_damping(1., 1.),
        &waves,
    );

    let i_impulse = 20;
    let forces = (0..60)
        .map(|i| {
            let v = if i == i_impulse { 1. } else { 0. };
            let t = i as f64 * config.time_step;
            body.calculate_loads(t, &[0.; 6], &[0., 0., v, 0., 0., 0.], &waves)
                .radiation[2]
        })
        .collect_vec();

    // Nothing before the impulse
    assert!(forces[..i_impulse].iter().all(|&f| f == 0.));

    // Afterwards the force traces -dt K(t - t_impulse)
    let kernel = body.radiation.as_ref().unwrap();
    forces[i_impulse..]
        .iter()
        .enumerate()
        .for_each(|(k, &f)| {
            assert_relative_eq!(f, -config.time_step * kernel.values[k][(2, 2)], epsilon = 1e-12);
        });
    assert!(forces[i_impulse] < 0.);
}

#[test_log::test]
fn test_radiation_force_is_linear_in_velocity_history() {
    // Coupled damping with off-diagonal terms
    let omega = (1..=40).map(|k| 0.1 * k as f64).collect_vec();
    let damping = omega
        .iter()
        .map(|&w| Mat::from_fn(6, 6, |i, j| (1. + (i + j) as f64) * w * (-w).exp()))
        .collect_vec();
    let kernel = RadiationKernel::new(&resample(&omega, &damping, 0.1).two_sided(), 0.1, 50);

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let random_history = |rng: &mut ChaCha8Rng| {
        let mut h: VelocityHistory = RingBuffer::new(kernel.len(), [0.; 6]);
        (0..kernel.len() + 7)
            .for_each(|_| h.push(std::array::from_fn(|_| rng.gen_range(-1.0..1.0))));
        h
    };

    for _ in 0..10 {
        let h1 = random_history(&mut rng);
        let h2 = random_history(&mut rng);
        let c = rng.gen_range(-5.0..5.0);

        // Scaled and superposed histories share the same slot layout
        let mut scaled: VelocityHistory = RingBuffer::new(kernel.len(), [0.; 6]);
        let mut summed: VelocityHistory = RingBuffer::new(kernel.len(), [0.; 6]);
        let (v1, v2) = (h1.iter().collect_vec(), h2.iter().collect_vec());
        for k in (0..kernel.len()).rev() {
            scaled.push(std::array::from_fn(|d| c * v1[k][d]));
            summed.push(std::array::from_fn(|d| v1[k][d] + v2[k][d]));
        }

        let (f1, f2) = (kernel.force(&h1), kernel.force(&h2));
        let (fc, fs) = (kernel.force(&scaled), kernel.force(&summed));
        for d in 0..6 {
            assert_relative_eq!(fc[d], c * f1[d], epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(fs[d], f1[d] + f2[d], epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}
