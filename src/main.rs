//! ar-persist entry point
//!
//! `demo` runs a place/save/reset/load cycle against in-memory collaborators;
//! `inspect` lists what a session directory holds.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use glam::{Quat, Vec3};

use ar_persistence::persistence::SnapshotSource;
use ar_persistence::scene::{CaptureMode, MemoryScene, MemoryTracking};
use ar_persistence::{ArSession, ObjectKind, SceneProvider, SessionStore, StoreSettings};

#[derive(Parser)]
#[command(name = "ar-persist")]
#[command(about = "Save and restore AR session placements")]
struct Cli {
    /// Session directory (overrides the settings file)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place objects, save, reset, then restore into a fresh session
    Demo {
        /// Model kinds to place
        #[arg(long, num_args = 1.., default_values = ["robot_walk_idle", "toy_car"])]
        kinds: Vec<String>,

        /// Deliver the tracking map after the pose map is written
        #[arg(long)]
        deferred: bool,
    },
    /// List stored placements
    Inspect,
}

fn settings(cli: &Cli) -> StoreSettings {
    let mut settings = match &cli.config {
        Some(path) => StoreSettings::load(path),
        None => StoreSettings::default(),
    };
    if let Some(dir) = &cli.dir {
        settings.dir = dir.clone();
    }
    settings
}

fn demo(settings: StoreSettings, kinds: &[String], deferred: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if deferred {
        CaptureMode::Deferred
    } else {
        CaptureMode::Immediate
    };
    let tracking = MemoryTracking::with_map(format!("map:{}", kinds.join(",")).into_bytes()).capture_mode(mode);
    let mut session = ArSession::new(
        MemoryScene::default(),
        tracking,
        SessionStore::new(settings.clone()),
    );

    for (i, kind) in kinds.iter().enumerate() {
        let mut placement = session.place(ObjectKind::new(kind.as_str())?)?;
        // Spread objects out as if the user had dragged them
        placement.pose = placement
            .pose
            .with_translation(Vec3::new(i as f32 * 0.5, 0.0, -1.0))
            .with_rotation(Quat::from_rotation_y(i as f32 * 0.4));
        session.scene_mut().instantiate(&placement)?;
        println!("placed  {} @ {}", placement.kind, placement.anchor);
    }

    let saved = session.save()?;
    println!("saved   {} placements (tracking: {:?})", saved.placements, saved.tracking);
    if deferred {
        session.tracking_mut().complete_captures();
    }
    println!("tracking {:?}", session.store().wait_for_tracking());

    let removed = session.reset();
    println!("reset   {removed} objects removed");

    // New store and collaborators, as a fresh process would have
    let mut fresh = ArSession::new(
        MemoryScene::default(),
        MemoryTracking::not_ready(),
        SessionStore::new(settings),
    );
    let report = fresh.load()?;
    println!(
        "loaded  {} of {} objects restored (tracking: {:?})",
        report.restored, report.total, report.tracking
    );
    for skipped in &report.skipped {
        println!("skipped {}: {:?}", skipped.key, skipped.reason);
    }
    Ok(())
}

fn inspect(settings: StoreSettings) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::new(settings);
    let snapshot = store.read_snapshot()?;
    println!("session {}", store.dir().display());

    match snapshot.source {
        SnapshotSource::Empty => println!("no saved placements"),
        SnapshotSource::Primary => println!("{} placements", snapshot.placements.len()),
        SnapshotSource::Backup => println!(
            "{} placements (from backup, primary unusable)",
            snapshot.placements.len()
        ),
    }
    if !snapshot.verified {
        println!("warning: digest mismatch, file was modified after saving");
    }
    for p in &snapshot.placements {
        println!(
            "  {} @ {}  t={:?} r={:?} s={:?}",
            p.kind,
            p.anchor,
            p.pose.translation.to_array(),
            p.pose.rotation.to_array(),
            p.pose.scale.to_array()
        );
    }
    for skipped in &snapshot.skipped {
        println!("  unreadable {}: {:?}", skipped.key, skipped.reason);
    }

    match std::fs::metadata(store.settings().tracking_path()) {
        Ok(meta) => println!("tracking map: {} bytes", meta.len()),
        Err(_) => println!("tracking map: none"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let settings = settings(&cli);
    log::info!("Session directory {}", settings.dir.display());

    let result = match &cli.command {
        Command::Demo { kinds, deferred } => demo(settings, kinds, *deferred),
        Command::Inspect => inspect(settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
