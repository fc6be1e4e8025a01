// src/indices/request.rs
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use itertools::{EitherOrBoth, Itertools};

use super::{BandRole, FormulaSpec, IndexKind};
use crate::config::EngineOptions;
use crate::error::{BandCheck, ValidationError};
use crate::processing::params::{CalcParams, Slot, NO_DATA, SLOT_COUNT, SLOT_SYMBOLS};

/// One band of one raster, bound to a formula slot by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandInput {
    pub source: String,
    pub band: u32,
}

/// A validated calculation request, built fresh for every run.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRequest {
    pub kind: IndexKind,
    pub formula: &'static FormulaSpec,
    /// Inputs in slot order (A, B, C, ...)
    pub inputs: Vec<BandInput>,
    pub output: PathBuf,
}

/// Validate the form values and build the request for the selected index.
///
/// Checks run in a fixed order and the first failure is returned:
/// layer, NIR/Red bands, output path, index selection, then the Blue band
/// when EVI is selected. `selected` is the set of ticked indices, so
/// repeated entries count once.
pub fn build(
    raster_source: Option<&str>,
    nir_band: i32,
    red_band: i32,
    blue_band: i32,
    selected: &[IndexKind],
    output_path: Option<&Path>,
) -> Result<IndexRequest, ValidationError> {
    let source = raster_source.ok_or(ValidationError::MissingLayer)?;

    if nir_band < 1 || red_band < 1 {
        return Err(ValidationError::InvalidBands(BandCheck::NirRed));
    }

    let output = match output_path {
        Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
        _ => return Err(ValidationError::MissingOutput),
    };

    let selected: BTreeSet<IndexKind> = selected.iter().copied().collect();
    let kind = match selected.into_iter().exactly_one() {
        Ok(kind) => kind,
        Err(_) => return Err(ValidationError::IndexSelection),
    };

    if kind == IndexKind::Evi && blue_band < 1 {
        return Err(ValidationError::InvalidBands(BandCheck::Blue));
    }

    let formula = kind.formula();
    let inputs = formula
        .bands
        .iter()
        .map(|role| {
            let band = match role {
                BandRole::Nir => nir_band,
                BandRole::Red => red_band,
                BandRole::Blue => blue_band,
            };
            BandInput {
                source: source.to_string(),
                band: band as u32,
            }
        })
        .collect();

    Ok(IndexRequest {
        kind,
        formula,
        inputs,
        output,
    })
}

impl IndexRequest {
    /// Map the inputs onto the calculator's six fixed slots.
    pub fn to_params(&self, options: &EngineOptions) -> CalcParams {
        let slots = SLOT_SYMBOLS
            .iter()
            .zip_longest(&self.inputs)
            .filter_map(|pair| match pair {
                EitherOrBoth::Both(_, input) => Some(Slot::bound(&input.source, input.band as i32)),
                EitherOrBoth::Left(_) => Some(Slot::unused()),
                // Formulas never bind more than six bands
                EitherOrBoth::Right(_) => None,
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(slots.len(), SLOT_COUNT);

        CalcParams::new(
            slots,
            self.formula.formula,
            NO_DATA,
            self.formula.output_type,
            &options.extra,
            &options.creation_options_string(),
            &self.output,
        )
    }
}
