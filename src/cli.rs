use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::indices::IndexKind;

#[derive(Parser)]
#[command(name = "gipe")]
#[command(version, about = "Vegetation index processing (NDVI, EVI)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open VI Processing: compute a vegetation index from a raster's bands
    Calculate(CalculateArgs),

    /// Show plugin information
    About,

    /// List the registered menu actions
    Menu,
}

#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Input raster layer
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// NIR band (1-based)
    #[arg(short, long)]
    pub nir: Option<i32>,

    /// Red band (1-based)
    #[arg(short, long)]
    pub red: Option<i32>,

    /// Blue band (1-based, EVI only)
    #[arg(short, long)]
    pub blue: Option<i32>,

    /// Index to calculate; give exactly one
    #[arg(long = "index", value_enum)]
    pub indices: Vec<IndexKind>,

    /// Output GeoTIFF
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep the form open after the calculation finishes
    #[arg(long)]
    pub keep_open: bool,
}
