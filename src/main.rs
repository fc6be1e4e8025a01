// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use gipe::cli::{CalculateArgs, Cli, Commands};
use gipe::config::Settings;
use gipe::dialog::{Dialog, LogNotifier};
use gipe::plugin::{about_text, ActionId, CliMenu, GipePlugin, MENU};
use gipe::processing::ParallelProcessor;
use gipe::workspace::{GdalWorkspace, Workspace};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn calculate(args: &CalculateArgs, settings: &Settings) -> Result<()> {
    let engine = ParallelProcessor::new(&settings.engine)?;
    let workspace = GdalWorkspace::new();

    let layer = match &args.input {
        Some(path) => {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let layer = workspace
                .load_raster(path, &name)
                .with_context(|| format!("opening input raster {}", path.display()))?;
            Some(layer)
        }
        None => None,
    };

    let mut dialog = Dialog::new(engine, workspace, LogNotifier, settings.engine.clone());
    dialog.set_layer(layer);
    if let Some(band) = args.nir {
        dialog.nir.select(band);
    }
    if let Some(band) = args.red {
        dialog.red.select(band);
    }
    if let Some(band) = args.blue {
        dialog.blue.select(band);
    }
    for kind in &args.indices {
        dialog.set_index_checked(*kind, true);
    }
    if let Some(output) = &args.output {
        dialog.set_output_path(output);
    }
    dialog.set_close_after_completion(!args.keep_open);

    dialog.calculate()?;
    debug!(state = ?dialog.state(), "dialog finished");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let settings = Settings::load_or_default(cli.config.as_deref())?;

    let mut plugin = GipePlugin::new(CliMenu::default());
    plugin.init_gui();

    let result = match &cli.command {
        Commands::Calculate(args) => plugin
            .trigger(ActionId::OpenViProcessing)
            .and_then(|_| calculate(args, &settings)),
        Commands::About => plugin.trigger(ActionId::About).map(|_| {
            println!("{}", about_text());
        }),
        Commands::Menu => {
            for action in plugin.host().entries(MENU) {
                println!("{} > {}", MENU.trim_start_matches('&'), action.text);
            }
            Ok(())
        }
    };

    plugin.unload();
    result
}
