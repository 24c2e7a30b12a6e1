use faer::prelude::*;

use crate::{
    config::{matrix_from_rows, RestoringConfig},
    util::mat_vec_accumulate,
};

/// Constant, linear stiffness, and linear/quadratic damping load about a
/// neutral position
#[derive(Debug, Clone)]
pub struct RestoringForce {
    pub neutral_position: [f64; 6],
    pub constant_load: [f64; 6],
    pub stiffness: Mat<f64>,
    pub linear_damping: Mat<f64>,
    pub quadratic_damping: Mat<f64>,
}

impl RestoringForce {
    pub fn new(config: &RestoringConfig) -> Self {
        RestoringForce {
            neutral_position: config.neutral_position,
            constant_load: config.constant_load,
            stiffness: matrix_from_rows(&config.stiffness),
            linear_damping: matrix_from_rows(&config.linear_damping),
            quadratic_damping: matrix_from_rows(&config.quadratic_damping),
        }
    }

    /// F = F0 - K (x - x0) - B1 v - B2 (v |v|)
    pub fn force(&self, position: &[f64; 6], velocity: &[f64; 6]) -> [f64; 6] {
        let mut f = self.constant_load;

        let dx: [f64; 6] = std::array::from_fn(|i| position[i] - self.neutral_position[i]);
        let v_abs_v: [f64; 6] = std::array::from_fn(|i| velocity[i] * velocity[i].abs());

        mat_vec_accumulate(&mut f, &self.stiffness, &dx, -1.);
        mat_vec_accumulate(&mut f, &self.linear_damping, velocity, -1.);
        mat_vec_accumulate(&mut f, &self.quadratic_damping, &v_abs_v, -1.);
        f
    }
}
