// src/indices/ndvi.rs
use super::{BandRole, FormulaSpec, IndexKind};
use crate::processing::params::OutputType;

/// Normalized Difference Vegetation Index.
///
/// Zero-sum pixels get the -9999 sentinel. Pixels whose NIR+Red sum reaches
/// 10000 evaluate to 0, which is the output no-data value.
pub static NDVI: FormulaSpec = FormulaSpec {
    kind: IndexKind::Ndvi,
    bands: &[BandRole::Nir, BandRole::Red],
    formula: "((A+B)==0)*-9999 + logical_and((A+B)!=0, (A+B)<10000)*((A-B)/(A+B))",
    sentinel: -9999.0,
    output_type: OutputType::Float32,
};
