use faer::prelude::*;

use crate::util::col6;

/// Motion and loads exchanged with the structural solver for one body
pub struct BodyData {
    pub id: usize,                 // Body index in the hydrodynamic component
    pub position: Col<f64>,        // Reference point displacement, translations and small rotations
    pub velocity: Col<f64>,        // Reference point velocity in global coordinates
    pub loads: Col<f64>,           // Hydrodynamic loads at the reference point in global coordinates
    pub interface_loads: Col<f64>, // Same loads moved to the structural interface point
    pub added_mass: Mat<f64>,      // Infinite-frequency added mass `[6][6]`
}

impl BodyData {
    pub fn new(id: usize) -> Self {
        BodyData {
            id,
            position: Col::zeros(6),
            velocity: Col::zeros(6),
            loads: Col::zeros(6),
            interface_loads: Col::zeros(6),
            added_mass: Mat::zeros(6, 6),
        }
    }

    pub fn set_motion(&mut self, position: &[f64; 6], velocity: &[f64; 6]) {
        self.position.copy_from(&col6(position));
        self.velocity.copy_from(&col6(velocity));
    }

    /// Position and velocity as 6-DOF arrays
    pub fn motion(&self) -> ([f64; 6], [f64; 6]) {
        (
            std::array::from_fn(|i| self.position[i]),
            std::array::from_fn(|i| self.velocity[i]),
        )
    }

    pub fn set_loads(&mut self, loads: &[f64; 6], interface_loads: &[f64; 6]) {
        self.loads.copy_from(&col6(loads));
        self.interface_loads.copy_from(&col6(interface_loads));
    }
}
