// src/workspace.rs
use std::fs;
use std::path::{Path, PathBuf};

use gdal::Dataset;
use tracing::info;

use crate::error::WorkspaceError;
use crate::style::PseudoColorRenderer;

/// A raster layer as the project model sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    pub name: String,
    pub source: PathBuf,
    pub band_count: usize,
    pub width: usize,
    pub height: usize,
    pub renderer: Option<PseudoColorRenderer>,
}

impl RasterLayer {
    /// Source identifier handed to the raster engine.
    pub fn source_id(&self) -> String {
        self.source.to_string_lossy().into_owned()
    }
}

/// Layer loading and the list of layers shown to the user.
pub trait Workspace {
    fn load_raster(&self, path: &Path, name: &str) -> Result<RasterLayer, WorkspaceError>;

    /// Hand a layer over to the project. The project owns it afterwards.
    fn add_map_layer(&mut self, layer: RasterLayer) -> Result<(), WorkspaceError>;

    fn layers(&self) -> &[RasterLayer];
}

/// Project backed by GeoTIFF files on disk.
///
/// Styled layers get a `.qml` style document written next to the raster,
/// which QGIS picks up when the file is opened.
#[derive(Debug, Default)]
pub struct GdalWorkspace {
    layers: Vec<RasterLayer>,
}

impl GdalWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style_path(source: &Path) -> PathBuf {
        source.with_extension("qml")
    }
}

impl Workspace for GdalWorkspace {
    fn load_raster(&self, path: &Path, name: &str) -> Result<RasterLayer, WorkspaceError> {
        let dataset = Dataset::open(path).map_err(|e| WorkspaceError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let band_count = dataset.raster_count() as usize;
        if band_count == 0 {
            return Err(WorkspaceError::Load {
                path: path.to_path_buf(),
                reason: "dataset has no raster bands".to_string(),
            });
        }
        let (width, height) = dataset.raster_size();

        Ok(RasterLayer {
            name: name.to_string(),
            source: path.to_path_buf(),
            band_count,
            width,
            height,
            renderer: None,
        })
    }

    fn add_map_layer(&mut self, layer: RasterLayer) -> Result<(), WorkspaceError> {
        if let Some(renderer) = &layer.renderer {
            let style_path = Self::style_path(&layer.source);
            fs::write(&style_path, renderer.to_qml())?;
            info!(style = %style_path.display(), "layer style written");
        }
        info!(layer = %layer.name, source = %layer.source.display(), "layer added");
        self.layers.push(layer);
        Ok(())
    }

    fn layers(&self) -> &[RasterLayer] {
        &self.layers
    }
}
