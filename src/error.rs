//! Error types for vegetation index processing

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which band check failed during request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandCheck {
    /// NIR or Red is not a valid band
    NirRed,
    /// Blue is not a valid band (EVI only)
    Blue,
}

impl fmt::Display for BandCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NirRed => "Please select valid bands for NIR and Red.",
            Self::Blue => "Please select a valid band for Blue.",
        })
    }
}

/// Form validation failures, detected before any engine call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a raster layer.")]
    MissingLayer,

    #[error("{0}")]
    InvalidBands(BandCheck),

    #[error("Please select an output file.")]
    MissingOutput,

    #[error("Please select exactly one index to calculate (NDVI or EVI).")]
    IndexSelection,
}

impl ValidationError {
    /// Short title shown with the warning.
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingLayer => "No Raster Layer",
            Self::InvalidBands(_) => "Invalid Band Selection",
            Self::MissingOutput => "No Output File",
            Self::IndexSelection => "Index Selection",
        }
    }
}

/// Failures raised by the raster-algebra engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("formula error at offset {offset}: {reason}")]
    Formula { offset: usize, reason: String },

    #[error("formula references {0} but no input raster was given for it")]
    MissingInput(char),

    #[error("raster size mismatch: {slot} is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        slot: char,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("band {band} does not exist in {source_path} ({count} bands)")]
    BandOutOfRange {
        source_path: String,
        band: i32,
        count: usize,
    },

    #[error("malformed creation option {0:?}, expected KEY=VALUE")]
    InvalidOption(String),

    #[error("strip reader stopped unexpectedly")]
    ReaderDisconnected,

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failures of the host's layer/project model.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("{path} could not be loaded as a raster: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a calculation request can fail with.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    EngineExecution(#[from] EngineError),

    #[error("vegetation index raster could not be loaded: {0}")]
    OutputLoad(WorkspaceError),

    #[error(transparent)]
    Workspace(WorkspaceError),

    #[error("the dialog has been closed")]
    DialogClosed,
}
