pub mod components;
pub mod config;
pub mod databank;
pub mod error;
pub mod history;
pub mod interp;
pub mod kernels;
pub mod output_writer;
pub mod qtf;
pub mod quadrature;
pub mod restoring;
pub mod spectrum;
pub mod util;
pub mod waves;
