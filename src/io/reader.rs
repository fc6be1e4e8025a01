// src/io/reader.rs
use gdal::Dataset;

use crate::error::EngineError;

pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: Option<[f64; 6]>,
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let (width, height) = dataset.raster_size();
        Self {
            projection: dataset.projection(),
            geo_transform: dataset.geo_transform().ok(),
            width,
            height,
        }
    }
}

/// An opened input band bound to one formula slot.
pub struct SlotReader {
    pub slot: usize,
    pub symbol: char,
    dataset: Dataset,
    band: usize,
    nodata: Option<f64>,
}

/// Rows of every input band for one horizontal strip of the raster.
pub struct Strip {
    pub row: usize,
    pub rows: usize,
    pub bands: Vec<StripBand>,
}

pub struct StripBand {
    pub slot: usize,
    pub nodata: Option<f64>,
    pub data: Vec<f64>,
}

impl StripBand {
    pub fn is_nodata(&self, value: f64) -> bool {
        self.nodata
            .is_some_and(|nd| value == nd || (nd.is_nan() && value.is_nan()))
    }
}

impl SlotReader {
    /// Open `source` and check that the 1-based `band` exists.
    pub fn open(slot: usize, symbol: char, source: &str, band: i32) -> Result<Self, EngineError> {
        let dataset = Dataset::open(source)?;
        let count = dataset.raster_count() as usize;
        if band < 1 || band as usize > count {
            return Err(EngineError::BandOutOfRange {
                source_path: source.to_string(),
                band,
                count,
            });
        }

        let nodata = dataset.rasterband(band as usize)?.no_data_value();
        Ok(Self {
            slot,
            symbol,
            dataset,
            band: band as usize,
            nodata,
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    pub fn geo_info(&self) -> GeoInfo {
        GeoInfo::from_dataset(&self.dataset)
    }

    fn read_rows(&self, row: usize, rows: usize, width: usize) -> Result<StripBand, EngineError> {
        let band = self.dataset.rasterband(self.band)?;
        let buffer = band.read_as::<f64>((0, row as isize), (width, rows), (width, rows), None)?;
        Ok(StripBand {
            slot: self.slot,
            nodata: self.nodata,
            data: buffer.data().to_vec(),
        })
    }
}

/// Read `rows` rows starting at `row` from every reader.
pub fn read_strip(readers: &[SlotReader], row: usize, rows: usize, width: usize) -> Result<Strip, EngineError> {
    let bands = readers
        .iter()
        .map(|reader| reader.read_rows(row, rows, width))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Strip { row, rows, bands })
}
