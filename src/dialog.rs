// src/dialog.rs
//! The vegetation index form and its calculate flow.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::EngineOptions;
use crate::error::ProcessingError;
use crate::indices::{self, IndexKind, IndexRequest};
use crate::processing::RasterEngine;
use crate::style;
use crate::workspace::{RasterLayer, Workspace};

/// User-facing messages, one call per message box.
pub trait Notifier {
    fn warning(&mut self, title: &str, message: &str);
    fn critical(&mut self, title: &str, message: &str);
    fn information(&mut self, title: &str, message: &str);
}

/// Reports messages through `tracing`.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warning(&mut self, title: &str, message: &str) {
        warn!("{title}: {message}");
    }

    fn critical(&mut self, title: &str, message: &str) {
        error!("{title}: {message}");
    }

    fn information(&mut self, title: &str, message: &str) {
        info!("{title}: {message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Idle,
    Calculating,
    Closed,
}

/// Band choice for one spectral role, limited to the current layer's bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPicker {
    band_count: usize,
    current: i32,
}

impl Default for BandPicker {
    fn default() -> Self {
        Self {
            band_count: 0,
            current: -1,
        }
    }
}

impl BandPicker {
    /// Rebind to a layer; the first band is selected when there is one.
    pub fn set_layer(&mut self, layer: Option<&RasterLayer>) {
        self.band_count = layer.map_or(0, |l| l.band_count);
        self.current = if self.band_count > 0 { 1 } else { -1 };
    }

    /// Select `band`; anything outside the layer's bands clears the choice.
    pub fn select(&mut self, band: i32) {
        self.current = if band >= 1 && band as usize <= self.band_count {
            band
        } else {
            -1
        };
    }

    /// 1-based band, or -1 when nothing valid is selected.
    pub fn current_band(&self) -> i32 {
        self.current
    }
}

pub const COMPLETE_TITLE: &str = "Calculation Complete";
pub const COMPLETE_MESSAGE: &str = "The vegetation index raster was created successfully!";
pub const LAYER_ERROR_TITLE: &str = "Layer Error";
pub const LAYER_ERROR_MESSAGE: &str = "vegetation index raster could not be loaded.";

pub struct Dialog<E, W, N> {
    engine: E,
    workspace: W,
    notifier: N,
    options: EngineOptions,
    layer: Option<RasterLayer>,
    pub nir: BandPicker,
    pub red: BandPicker,
    pub blue: BandPicker,
    ndvi: bool,
    evi: bool,
    output_path: Option<PathBuf>,
    close_after_completion: bool,
    state: DialogState,
}

impl<E: RasterEngine, W: Workspace, N: Notifier> Dialog<E, W, N> {
    pub fn new(engine: E, workspace: W, notifier: N, options: EngineOptions) -> Self {
        Self {
            engine,
            workspace,
            notifier,
            options,
            layer: None,
            nir: BandPicker::default(),
            red: BandPicker::default(),
            blue: BandPicker::default(),
            ndvi: false,
            evi: false,
            output_path: None,
            close_after_completion: true,
            state: DialogState::Idle,
        }
    }

    /// Change the selected raster layer and refresh the band pickers.
    pub fn set_layer(&mut self, layer: Option<RasterLayer>) {
        self.nir.set_layer(layer.as_ref());
        self.red.set_layer(layer.as_ref());
        self.blue.set_layer(layer.as_ref());
        self.layer = layer;
    }

    pub fn layer(&self) -> Option<&RasterLayer> {
        self.layer.as_ref()
    }

    pub fn set_index_checked(&mut self, kind: IndexKind, checked: bool) {
        match kind {
            IndexKind::Ndvi => self.ndvi = checked,
            IndexKind::Evi => self.evi = checked,
        }
    }

    /// Set the output file. The result is always a GeoTIFF, so `.tif` is
    /// appended unless the name already ends in `.tif` or `.tiff`.
    pub fn set_output_path(&mut self, path: impl AsRef<Path>) {
        self.output_path = Some(geotiff_path(path.as_ref()));
    }

    pub fn set_close_after_completion(&mut self, close: bool) {
        self.close_after_completion = close;
    }

    pub fn close_after_completion(&self) -> bool {
        self.close_after_completion
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn selected_kinds(&self) -> Vec<IndexKind> {
        let mut kinds = Vec::new();
        if self.ndvi {
            kinds.push(IndexKind::Ndvi);
        }
        if self.evi {
            kinds.push(IndexKind::Evi);
        }
        kinds
    }

    /// Validate the current form into a request.
    pub fn build_request(&self) -> Result<IndexRequest, ProcessingError> {
        let source = self.layer.as_ref().map(RasterLayer::source_id);
        Ok(indices::build(
            source.as_deref(),
            self.nir.current_band(),
            self.red.current_band(),
            self.blue.current_band(),
            &self.selected_kinds(),
            self.output_path.as_deref(),
        )?)
    }

    /// Run the selected index and hand the styled result to the workspace.
    ///
    /// Validation failures leave the dialog `Idle`. Once the engine has been
    /// called the dialog closes if close-after-completion is set, whatever
    /// the outcome.
    ///
    /// The completion notice is only shown when the styled layer was added.
    /// An output that cannot be loaded gets the layer warning alone, never
    /// a "created successfully" message after it.
    pub fn calculate(&mut self) -> Result<(), ProcessingError> {
        if self.state == DialogState::Closed {
            return Err(ProcessingError::DialogClosed);
        }
        self.state = DialogState::Calculating;

        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                if let ProcessingError::Validation(v) = &e {
                    self.notifier.warning(v.title(), &v.to_string());
                }
                self.state = DialogState::Idle;
                return Err(e);
            }
        };

        let result = self.process(&request);
        match &result {
            Ok(()) => {
                if !self.close_after_completion {
                    self.notifier.information(COMPLETE_TITLE, COMPLETE_MESSAGE);
                }
            }
            Err(ProcessingError::OutputLoad(e)) => {
                debug!(error = %e, "output load failed");
                self.notifier.warning(LAYER_ERROR_TITLE, LAYER_ERROR_MESSAGE);
            }
            Err(e) => {
                self.notifier
                    .critical("Error", &format!("vegetation index calculation failed:\n{e}"));
            }
        }

        self.state = if self.close_after_completion {
            DialogState::Closed
        } else {
            DialogState::Idle
        };
        result
    }

    fn process(&mut self, request: &IndexRequest) -> Result<(), ProcessingError> {
        let params = request.to_params(&self.options);
        if let Ok(json) = params.to_json() {
            debug!(params = %json, "raster calculator parameters");
        }
        info!(index = %request.kind, output = %request.output.display(), "calculating vegetation index");
        self.engine.run(&params)?;

        let layer_style = style::style(&request.output, request.kind);
        let mut layer = self
            .workspace
            .load_raster(&layer_style.output, layer_style.layer_name)
            .map_err(ProcessingError::OutputLoad)?;
        style::apply(&mut layer, &layer_style.spec);
        self.workspace
            .add_map_layer(layer)
            .map_err(ProcessingError::Workspace)
    }
}

/// `path` with a GeoTIFF extension. An empty path is kept so validation
/// still reports the missing output.
pub fn geotiff_path(path: &Path) -> PathBuf {
    let is_tiff = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"));
    if is_tiff || path.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".tif");
    PathBuf::from(name)
}
