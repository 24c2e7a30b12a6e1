pub mod diffraction;
pub mod radiation;

pub use diffraction::{DiffractionKernel, HeadingGrid};
pub use radiation::RadiationKernel;
