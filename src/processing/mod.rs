// src/processing/mod.rs
pub mod expr;
pub mod parallel;
pub mod params;

use crate::error::EngineError;

// Re-export main components
pub use expr::Formula;
pub use parallel::ParallelProcessor;
pub use params::{CalcParams, OutputType, Slot};

/// A raster-algebra engine that evaluates a formula over up to six bands
/// and writes the result to `params.output`.
///
/// The call blocks until the output is written.
pub trait RasterEngine {
    fn run(&self, params: &CalcParams) -> Result<(), EngineError>;
}

impl<T: RasterEngine + ?Sized> RasterEngine for &T {
    fn run(&self, params: &CalcParams) -> Result<(), EngineError> {
        (**self).run(params)
    }
}
