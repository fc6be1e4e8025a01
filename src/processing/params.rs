// src/processing/params.rs
use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Number of input slots the raster calculator accepts.
pub const SLOT_COUNT: usize = 6;

/// Slot symbols as they appear in formulas.
pub const SLOT_SYMBOLS: [char; SLOT_COUNT] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// No-data value written to every output raster.
pub const NO_DATA: f64 = 0.0;

/// Output pixel type, by raster calculator type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Byte,
    Int16,
    UInt16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl OutputType {
    pub fn code(self) -> u8 {
        match self {
            Self::Byte => 0,
            Self::Int16 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 3,
            Self::Int32 => 4,
            Self::Float32 => 5,
            Self::Float64 => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Byte,
            1 => Self::Int16,
            2 => Self::UInt16,
            3 => Self::UInt32,
            4 => Self::Int32,
            5 => Self::Float32,
            6 => Self::Float64,
            _ => return None,
        })
    }
}

impl Serialize for OutputType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// One input slot: a raster source and a 1-based band, or unused (`None`, -1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub input: Option<String>,
    pub band: i32,
}

impl Slot {
    pub fn bound(source: &str, band: i32) -> Self {
        Self {
            input: Some(source.to_string()),
            band,
        }
    }

    pub fn unused() -> Self {
        Self {
            input: None,
            band: -1,
        }
    }

    pub fn is_used(&self) -> bool {
        self.input.is_some()
    }
}

/// Parameter set of one raster calculator run.
///
/// Serializes to the calculator's flat key layout (`INPUT_A`, `BAND_A`, ...,
/// `FORMULA`, `NO_DATA`, `RTYPE`, `EXTRA`, `OPTIONS`, `OUTPUT`).
#[derive(Debug, Clone, PartialEq)]
pub struct CalcParams {
    slots: Vec<Slot>,
    pub formula: String,
    pub no_data: f64,
    pub rtype: OutputType,
    pub extra: String,
    pub options: String,
    pub output: PathBuf,
}

impl CalcParams {
    /// Missing trailing slots are filled as unused, extra ones are dropped.
    pub fn new(
        mut slots: Vec<Slot>,
        formula: &str,
        no_data: f64,
        rtype: OutputType,
        extra: &str,
        options: &str,
        output: &Path,
    ) -> Self {
        slots.resize_with(SLOT_COUNT, Slot::unused);
        Self {
            slots,
            formula: formula.to_string(),
            no_data,
            rtype,
            extra: extra.to_string(),
            options: options.to_string(),
            output: output.to_path_buf(),
        }
    }

    /// Slot bound to `symbol` (`'A'..='F'`).
    pub fn slot(&self, symbol: char) -> Option<&Slot> {
        SLOT_SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .map(|i| &self.slots[i])
    }

    /// Band of the slot bound to `symbol`, -1 when unused.
    pub fn band(&self, symbol: char) -> i32 {
        self.slot(symbol).map_or(-1, |s| s.band)
    }

    /// Used slots with their symbols, in slot order.
    pub fn used_slots(&self) -> impl Iterator<Item = (char, &Slot)> {
        SLOT_SYMBOLS
            .iter()
            .copied()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_used())
    }

    /// Creation options split on `|`, empty entries skipped.
    pub fn creation_options(&self) -> Vec<String> {
        self.options
            .split('|')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for CalcParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SLOT_COUNT * 2 + 6))?;
        for (symbol, slot) in SLOT_SYMBOLS.iter().zip(&self.slots) {
            map.serialize_entry(&format!("INPUT_{symbol}"), &slot.input)?;
            map.serialize_entry(&format!("BAND_{symbol}"), &slot.band)?;
        }
        map.serialize_entry("FORMULA", &self.formula)?;
        map.serialize_entry("NO_DATA", &self.no_data)?;
        map.serialize_entry("RTYPE", &self.rtype)?;
        map.serialize_entry("EXTRA", &self.extra)?;
        map.serialize_entry("OPTIONS", &self.options)?;
        map.serialize_entry("OUTPUT", &self.output)?;
        map.end()
    }
}
