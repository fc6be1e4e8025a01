// src/io/writer.rs
use std::path::Path;

use gdal::raster::{Buffer, GdalType, RasterCreationOptions};
use gdal::{Dataset, Driver, DriverManager, Metadata};

use super::reader::GeoInfo;
use crate::error::EngineError;
use crate::processing::params::OutputType;

/// Single-band GeoTIFF written strip by strip.
pub struct RasterWriter {
    dataset: Dataset,
    rtype: OutputType,
    width: usize,
}

/// Parse `KEY=VALUE` creation options.
pub fn creation_options(options: &[String]) -> Result<RasterCreationOptions, EngineError> {
    let mut list = RasterCreationOptions::new();
    for option in options {
        match option.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                list.set_name_value(key.trim(), value.trim())?;
            }
            _ => return Err(EngineError::InvalidOption(option.clone())),
        }
    }
    Ok(list)
}

fn create<T: GdalType>(
    driver: &Driver,
    path: &Path,
    geo_info: &GeoInfo,
    options: &RasterCreationOptions,
) -> Result<Dataset, EngineError> {
    Ok(driver.create_with_band_type_with_options::<T, _>(
        path,
        geo_info.width,
        geo_info.height,
        1,
        options,
    )?)
}

impl RasterWriter {
    pub fn create(
        output_path: &Path,
        geo_info: &GeoInfo,
        rtype: OutputType,
        no_data: f64,
        options: &RasterCreationOptions,
        description: &str,
    ) -> Result<Self, EngineError> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;

        let mut dataset = match rtype {
            OutputType::Byte => create::<u8>(&driver, output_path, geo_info, options)?,
            OutputType::Int16 => create::<i16>(&driver, output_path, geo_info, options)?,
            OutputType::UInt16 => create::<u16>(&driver, output_path, geo_info, options)?,
            OutputType::UInt32 => create::<u32>(&driver, output_path, geo_info, options)?,
            OutputType::Int32 => create::<i32>(&driver, output_path, geo_info, options)?,
            OutputType::Float32 => create::<f32>(&driver, output_path, geo_info, options)?,
            OutputType::Float64 => create::<f64>(&driver, output_path, geo_info, options)?,
        };

        if !geo_info.projection.is_empty() {
            dataset.set_projection(&geo_info.projection)?;
        }
        if let Some(geo_transform) = &geo_info.geo_transform {
            dataset.set_geo_transform(geo_transform)?;
        }

        {
            let mut band = dataset.rasterband(1)?;
            band.set_no_data_value(Some(no_data))?;
            band.set_description(description)?;
        }

        Ok(Self {
            dataset,
            rtype,
            width: geo_info.width,
        })
    }

    /// Write `rows` full rows starting at `row`. Values are cast to the
    /// output type, saturating for integer types.
    pub fn write_rows(&mut self, row: usize, rows: usize, data: &[f64]) -> Result<(), EngineError> {
        let window = (0, row as isize);
        let size = (self.width, rows);
        let mut band = self.dataset.rasterband(1)?;

        macro_rules! write_as {
            ($t:ty) => {{
                let mut buffer = Buffer::new(size, data.iter().map(|v| *v as $t).collect::<Vec<$t>>());
                band.write(window, size, &mut buffer)?;
            }};
        }

        match self.rtype {
            OutputType::Byte => write_as!(u8),
            OutputType::Int16 => write_as!(i16),
            OutputType::UInt16 => write_as!(u16),
            OutputType::UInt32 => write_as!(u32),
            OutputType::Int32 => write_as!(i32),
            OutputType::Float32 => write_as!(f32),
            OutputType::Float64 => write_as!(f64),
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), EngineError> {
        self.dataset.flush_cache()?;
        Ok(())
    }
}
