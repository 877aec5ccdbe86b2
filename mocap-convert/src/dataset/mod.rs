//! Dataset specific converters.

pub mod mpi_inf_3dhp;
pub mod pw3d;
pub mod video;

pub use mpi_inf_3dhp::*;
pub use pw3d::*;
