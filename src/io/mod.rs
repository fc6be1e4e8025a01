// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_strip, GeoInfo, SlotReader, Strip};
pub use writer::{creation_options, RasterWriter};
