// src/style.rs
//! Color ramp styling of vegetation index layers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::indices::IndexKind;
use crate::workspace::RasterLayer;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const LOW: Rgb = Rgb::new(203, 110, 15);
const MID: Rgb = Rgb::new(255, 255, 0);
const HIGH: Rgb = Rgb::new(26, 150, 65);

/// A color ramp stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RampItem {
    pub value: f64,
    pub color: Rgb,
    pub label: &'static str,
}

/// Classification range and three-stop ramp for one index kind.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpec {
    pub minimum: f64,
    pub midpoint: f64,
    pub maximum: f64,
    pub stops: [RampItem; 3],
}

impl StyleSpec {
    /// NDVI is ramped over 0..1, EVI over -1..1.
    pub fn for_kind(kind: IndexKind) -> Self {
        let (minimum, midpoint, maximum) = match kind {
            IndexKind::Ndvi => (0.0, 0.5, 1.0),
            IndexKind::Evi => (-1.0, 0.0, 1.0),
        };
        Self {
            minimum,
            midpoint,
            maximum,
            stops: [
                RampItem { value: minimum, color: LOW, label: "Low" },
                RampItem { value: midpoint, color: MID, label: "Mid" },
                RampItem { value: maximum, color: HIGH, label: "High" },
            ],
        }
    }
}

/// The layer to load from a finished run and the style to give it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    pub layer_name: &'static str,
    pub output: PathBuf,
    pub spec: StyleSpec,
}

pub fn style(output_path: &Path, kind: IndexKind) -> LayerStyle {
    LayerStyle {
        layer_name: kind.layer_name(),
        output: output_path.to_path_buf(),
        spec: StyleSpec::for_kind(kind),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRampType {
    Interpolated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorRampShader {
    pub ramp_type: ColorRampType,
    pub items: Vec<RampItem>,
}

/// Single-band pseudo-color renderer with a fixed classification range.
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoColorRenderer {
    pub band: usize,
    pub shader: ColorRampShader,
    pub classification_min: f64,
    pub classification_max: f64,
}

impl PseudoColorRenderer {
    /// QGIS layer style document for this renderer.
    pub fn to_qml(&self) -> String {
        let mut qml = String::new();
        qml.push_str("<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>\n");
        qml.push_str("<qgis styleCategories=\"Symbology\">\n  <pipe>\n");
        let _ = writeln!(
            qml,
            "    <rasterrenderer type=\"singlebandpseudocolor\" band=\"{}\" opacity=\"1\" alphaBand=\"-1\" classificationMin=\"{}\" classificationMax=\"{}\">",
            self.band, self.classification_min, self.classification_max
        );
        qml.push_str("      <rastershader>\n");
        let _ = writeln!(
            qml,
            "        <colorrampshader colorRampType=\"{}\" classificationMode=\"1\" clip=\"0\" minimumValue=\"{}\" maximumValue=\"{}\">",
            match self.shader.ramp_type {
                ColorRampType::Interpolated => "INTERPOLATED",
            },
            self.classification_min,
            self.classification_max
        );
        for item in &self.shader.items {
            let _ = writeln!(
                qml,
                "          <item alpha=\"255\" value=\"{}\" label=\"{}\" color=\"{}\"/>",
                item.value,
                item.label,
                item.color.hex()
            );
        }
        qml.push_str("        </colorrampshader>\n      </rastershader>\n    </rasterrenderer>\n  </pipe>\n</qgis>\n");
        qml
    }
}

/// Install an interpolated three-stop renderer on band 1, with the
/// classification range forced to the style bounds.
pub fn apply(layer: &mut RasterLayer, spec: &StyleSpec) {
    layer.renderer = Some(PseudoColorRenderer {
        band: 1,
        shader: ColorRampShader {
            ramp_type: ColorRampType::Interpolated,
            items: spec.stops.to_vec(),
        },
        classification_min: spec.minimum,
        classification_max: spec.maximum,
    });
}
