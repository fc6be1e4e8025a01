// src/indices/mod.rs
pub mod evi;
pub mod ndvi;
pub mod request;

use std::fmt;

use clap::ValueEnum;

use crate::processing::params::OutputType;

pub use evi::EVI;
pub use ndvi::NDVI;
pub use request::{build, BandInput, IndexRequest};

/// Vegetation index that can be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum IndexKind {
    /// Normalized Difference Vegetation Index: (NIR-Red)/(NIR+Red)
    Ndvi,
    /// Enhanced Vegetation Index: 2.5*(NIR-Red)/(NIR+6*Red-7.5*Blue+1)
    Evi,
}

impl IndexKind {
    /// Static formula definition for this index.
    pub fn formula(self) -> &'static FormulaSpec {
        match self {
            Self::Ndvi => &NDVI,
            Self::Evi => &EVI,
        }
    }

    /// Layer name given to the result raster.
    pub fn layer_name(self) -> &'static str {
        match self {
            Self::Ndvi => "ndvi",
            Self::Evi => "evi",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ndvi => "NDVI",
            Self::Evi => "EVI",
        })
    }
}

/// Spectral role of an input band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandRole {
    Nir,
    Red,
    Blue,
}

/// Fixed formula definition for one index kind.
///
/// `bands` lists the roles in slot order: the first role is bound to `A`,
/// the second to `B` and so on.
#[derive(Debug, PartialEq)]
pub struct FormulaSpec {
    pub kind: IndexKind,
    pub bands: &'static [BandRole],
    pub formula: &'static str,
    /// Value written where the index is undefined (zero denominator)
    pub sentinel: f64,
    pub output_type: OutputType,
}

impl FormulaSpec {
    /// Slot symbol bound to `role`, if the formula uses that role.
    pub fn symbol(&self, role: BandRole) -> Option<char> {
        self.bands
            .iter()
            .position(|r| *r == role)
            .map(|i| (b'A' + i as u8) as char)
    }
}
