//! Core traits
//!
//! - [`Registrar`]: The remote registrar, one API call per method
//! - [`RegistrarFactory`]: Builds a registrar from configuration

pub mod registrar;

pub use registrar::{Registrar, RegistrarFactory};
