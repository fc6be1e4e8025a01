// src/processing/parallel.rs
use std::thread;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use super::expr::Formula;
use super::params::{CalcParams, SLOT_COUNT, SLOT_SYMBOLS};
use super::RasterEngine;
use crate::config::EngineOptions;
use crate::error::EngineError;
use crate::io::{creation_options, read_strip, RasterWriter, SlotReader, Strip};

/// Built-in raster calculator.
///
/// A reader thread streams row strips of every referenced input band over a
/// bounded channel; each strip is evaluated on the rayon pool and written
/// before the next one is taken.
pub struct ParallelProcessor {
    pool: ThreadPool,
    strip_rows: usize,
}

impl ParallelProcessor {
    pub fn new(options: &EngineOptions) -> Result<Self, EngineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|i| format!("gipe-calc-{i}"))
            .build()?;

        Ok(Self {
            pool,
            strip_rows: options.strip_rows.max(1),
        })
    }

    fn open_inputs(params: &CalcParams, formula: &Formula) -> Result<Vec<SlotReader>, EngineError> {
        let mut readers = Vec::new();
        for (slot, symbol) in SLOT_SYMBOLS.iter().copied().enumerate() {
            if !formula.uses(slot) {
                continue;
            }
            let bound = params.slot(symbol).filter(|s| s.is_used());
            let Some(source) = bound.and_then(|s| s.input.as_deref()) else {
                return Err(EngineError::MissingInput(symbol));
            };
            readers.push(SlotReader::open(slot, symbol, source, params.band(symbol))?);
        }

        let Some(first) = readers.first() else {
            return Err(EngineError::Formula {
                offset: 0,
                reason: "formula references no input band".to_string(),
            });
        };
        let expected = first.size();
        for reader in &readers[1..] {
            if reader.size() != expected {
                return Err(EngineError::SizeMismatch {
                    slot: reader.symbol,
                    expected,
                    actual: reader.size(),
                });
            }
        }
        Ok(readers)
    }
}

/// Evaluate the formula over one strip. Pixels where any input is no-data,
/// or where the result is not finite, get `no_data`.
pub fn evaluate_strip(formula: &Formula, strip: &Strip, no_data: f64) -> Vec<f64> {
    let len = strip.bands.first().map_or(0, |b| b.data.len());
    (0..len)
        .into_par_iter()
        .map(|i| {
            let mut values = [0.0f64; SLOT_COUNT];
            for band in &strip.bands {
                let value = band.data[i];
                if band.is_nodata(value) {
                    return no_data;
                }
                values[band.slot] = value;
            }
            let result = formula.eval(&values);
            if result.is_finite() {
                result
            } else {
                no_data
            }
        })
        .collect()
}

impl RasterEngine for ParallelProcessor {
    fn run(&self, params: &CalcParams) -> Result<(), EngineError> {
        let started = Instant::now();
        let formula = Formula::parse(&params.formula)?;
        if !params.extra.is_empty() {
            warn!(extra = %params.extra, "extra calculator arguments are not supported and were ignored");
        }

        let readers = Self::open_inputs(params, &formula)?;
        let geo_info = readers[0].geo_info();
        let (width, height) = (geo_info.width, geo_info.height);
        let options = creation_options(&params.creation_options())?;

        info!(
            output = %params.output.display(),
            width,
            height,
            inputs = readers.len(),
            "running raster calculator"
        );

        let mut writer = RasterWriter::create(
            &params.output,
            &geo_info,
            params.rtype,
            params.no_data,
            &options,
            &params.formula,
        )?;

        let strip_rows = self.strip_rows;
        let (tx, rx) = flume::bounded::<Result<Strip, EngineError>>(2);
        let reader = thread::spawn(move || {
            for row in (0..height).step_by(strip_rows) {
                let rows = strip_rows.min(height - row);
                let strip = read_strip(&readers, row, rows, width);
                let failed = strip.is_err();
                if tx.send(strip).is_err() || failed {
                    break;
                }
            }
        });

        let mut written = 0;
        for strip in rx {
            let strip = strip?;
            let values = self
                .pool
                .install(|| evaluate_strip(&formula, &strip, params.no_data));
            writer.write_rows(strip.row, strip.rows, &values)?;
            written += strip.rows;
            debug!(row = strip.row, rows = strip.rows, "strip written");
        }

        reader.join().map_err(|_| EngineError::ReaderDisconnected)?;
        if written != height {
            return Err(EngineError::ReaderDisconnected);
        }
        writer.finish()?;

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "raster calculator finished");
        Ok(())
    }
}
