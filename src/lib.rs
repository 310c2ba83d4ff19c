//! Complex arithmetic for power-tower (tetration) fractals
//!
//! - complex: power, subtract, magnitude, random_int
//! - backend: the same operations through a lazily loaded numeric provider
//! - fractal: escape-time classification of the viewport
//! - state: render settings and cached renders
//! - config / logging: ambient setup for the CLI

pub mod backend;
pub mod complex;
pub mod config;
pub mod fractal;
pub mod logging;
pub mod state;
