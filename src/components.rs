pub mod body_data;
pub mod hydro;
