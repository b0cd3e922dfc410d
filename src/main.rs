//! Command-line entry point: the live scene viewer and the control commands.

use std::path::PathBuf;

use anyhow::Context;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::{Parser, Subcommand};
use swarm_view::control::{ControlClient, HttpTransport};
use swarm_view::map_source::{FileMapSource, HttpMapSource};
use swarm_view::{
    init_logging, FeedWorker, LoadMap, MapSourceHandle, SceneConfig, ScenePresentationPlugin,
    SnapshotChannel, SwarmScenePlugin,
};

/// Live 3D view of a swarm simulation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Scene configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Snapshot feed address, one JSON snapshot per line
    #[arg(long, default_value = "127.0.0.1:8765")]
    feed: String,
    /// Simulation server for maps and control requests
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,
    /// Map to fetch from the server at startup
    #[arg(long, conflicts_with = "map_file")]
    map: Option<String>,
    /// Map file to load at startup instead of fetching one
    #[arg(long)]
    map_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a mission statement and exit
    Mission {
        /// Mission text
        text: String,
    },
    /// Start the simulation and exit
    Start,
    /// Stop the simulation and exit
    Stop,
}

fn control(server: &str, command: &Command) -> anyhow::Result<()> {
    let client = ControlClient::new(HttpTransport::new(server)?);
    let reply = match command {
        Command::Mission { text } => client.submit_text(text)?,
        Command::Start => client.start()?,
        Command::Stop => client.stop()?,
    };
    log::info!("{reply}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(command) = &args.command {
        return control(&args.server, command);
    }

    let config = match &args.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let (source, startup_map) = match (&args.map_file, &args.map) {
        (Some(path), _) => {
            let (source, name) = FileMapSource::for_file(path);
            (MapSourceHandle::new(source), Some(name))
        }
        (None, name) => (
            MapSourceHandle::new(HttpMapSource::new(args.server.as_str())?),
            name.clone(),
        ),
    };

    let channel = SnapshotChannel::new();
    let worker = FeedWorker::spawn(args.feed.as_str(), channel.clone())
        .context("failed to start the snapshot feed worker")?;

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.build().disable::<LogPlugin>())
        .insert_resource(config)
        .insert_resource(source)
        .insert_resource(worker)
        .add_plugins(SwarmScenePlugin::with_feed(channel))
        .add_plugins(ScenePresentationPlugin);
    if let Some(name) = startup_map {
        app.add_systems(Startup, move |mut commands: Commands| {
            commands.trigger(LoadMap::new(name.clone()));
        });
    }
    app.run();
    Ok(())
}
