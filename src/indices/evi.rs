// src/indices/evi.rs
use super::{BandRole, FormulaSpec, IndexKind};
use crate::processing::params::OutputType;

/// Enhanced Vegetation Index, MODIS coefficients (G=2.5, C1=6, C2=7.5, L=1).
pub static EVI: FormulaSpec = FormulaSpec {
    kind: IndexKind::Evi,
    bands: &[BandRole::Nir, BandRole::Red, BandRole::Blue],
    formula: "(2.5*(A-B)/(A+6.0*B-7.5*C+1.0))*((A+6.0*B-7.5*C+1.0)!=0) + ((A+6.0*B-7.5*C+1.0)==0)*-9999",
    sentinel: -9999.0,
    output_type: OutputType::Float32,
};
