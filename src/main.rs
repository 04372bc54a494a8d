//! rig-builder - headless vehicle configurator
//!
//! Replays agent responses against a fresh scene and prints the resulting
//! vehicle configuration with its validation report.
//!
//! Usage:
//!   rig-builder response.json                     # one structured response
//!   rig-builder --config rig.json a.json b.json   # several, in order
//!   rig-builder --scene build.json response.json  # resume and persist a scene
//!   rig-builder --garage garage.json response.json # keep saved builds between runs
//!
//! Each input file holds either a structured agent response, one streamed
//! chunk, or a JSON array of those.

use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use rig_builder::commands::AgentResponse;
use rig_builder::config::ConfiguratorConfig;
use rig_builder::handlers::SceneHandlers;
use rig_builder::notify::LogNotifier;
use rig_builder::orchestrator::Orchestrator;
use rig_builder::scene::serialization::{
    load_garage_from_file, load_scene_from_file, save_garage_to_file, save_scene_to_file,
};
use rig_builder::scene::{SavedVehicleStore, SceneStore};

#[derive(Parser)]
#[command(name = "rig-builder")]
#[command(about = "Apply agent responses to a vehicle configuration")]
struct Args {
    /// Path to a JSON config file
    #[arg(long, env = "RIG_BUILDER_CONFIG")]
    config: Option<PathBuf>,

    /// Scene file restored before the responses run and rewritten afterwards
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Saved-vehicle file restored before the responses run and rewritten afterwards
    #[arg(long)]
    garage: Option<PathBuf>,

    /// Agent response files, applied in order
    responses: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    let config = match ConfiguratorConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let catalog = match config.load_catalog() {
        Ok(catalog) => Rc::new(catalog),
        Err(err) => {
            eprintln!("Error loading catalog: {}", err);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Catalog ready: {} models, {} rims, {} tires",
        catalog.vehicles.len(),
        catalog.wheels.rims.len(),
        catalog.wheels.tires.len()
    );

    let store = match args.scene.as_deref().filter(|path| path.exists()) {
        Some(path) => match load_scene_from_file(path) {
            Ok(scene) => {
                log::info!("Restored scene from {}", path.display());
                SceneStore::with_state(catalog, scene)
            }
            Err(err) => {
                eprintln!("Error loading scene {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => SceneStore::new(catalog),
    };

    let saved = match args.garage.as_deref().filter(|path| path.exists()) {
        Some(path) => match load_garage_from_file(path) {
            Ok(garage) => {
                log::info!(
                    "Restored {} saved vehicles from {}",
                    garage.vehicles.len(),
                    path.display()
                );
                SavedVehicleStore::from_saved(garage)
            }
            Err(err) => {
                eprintln!("Error loading garage {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => SavedVehicleStore::new(),
    };

    let handlers = SceneHandlers::new(store, saved, Rc::new(LogNotifier))
    .with_notification_duration(config.notification_duration_ms);
    let orchestrator = Orchestrator::new(handlers);

    let mut all_applied = true;
    for path in &args.responses {
        match apply_file(&orchestrator, path) {
            Ok(applied) => all_applied &= applied,
            Err(message) => {
                eprintln!("{}", message);
                return ExitCode::FAILURE;
            }
        }
    }

    let handlers = orchestrator.handlers();
    let vehicle = handlers.store().vehicle();
    let report = handlers.validate_configuration(&vehicle);
    let output = serde_json::json!({
        "vehicle": vehicle,
        "validation": report,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            eprintln!("Error serializing result: {}", err);
            return ExitCode::FAILURE;
        }
    }

    if let Some(path) = &args.scene {
        if let Err(err) = save_scene_to_file(&handlers.store().snapshot(), path) {
            eprintln!("Error saving scene {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
        log::info!("Saved scene to {}", path.display());
    }
    if let Some(path) = &args.garage {
        if let Err(err) = save_garage_to_file(&handlers.saved().get(), path) {
            eprintln!("Error saving garage {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
        log::info!("Saved garage to {}", path.display());
    }

    if all_applied && report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn apply_file(orchestrator: &Orchestrator, path: &Path) -> Result<bool, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("Error reading {}: {}", path.display(), err))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|err| format!("Error parsing {}: {}", path.display(), err))?;
    log::info!("Applying {}", path.display());

    let entries = match value {
        Value::Array(entries) => entries,
        single => vec![single],
    };
    let mut applied = true;
    for entry in &entries {
        applied &= apply_entry(orchestrator, entry)
            .map_err(|err| format!("Error in {}: {}", path.display(), err))?;
    }
    Ok(applied)
}

/// Streamed chunks are recognized by their envelope; anything else is read
/// as a bare structured response.
fn apply_entry(orchestrator: &Orchestrator, entry: &Value) -> Result<bool, serde_json::Error> {
    if let Some(applied) = orchestrator.process_stream_chunk(entry) {
        return Ok(applied);
    }
    let response: AgentResponse = serde_json::from_value(entry.clone())?;
    Ok(orchestrator.process_agent_response(&response))
}
