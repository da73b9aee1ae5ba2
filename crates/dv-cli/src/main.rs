//! delve: generate a dungeon from a name
//!
//! Prints the text map by default, or the full dungeon as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dv_core::{Config, ConfigBuilder, build};

/// Procedural dungeon generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Delve - generate a dungeon from a name", long_about = None)]
struct Args {
    /// Dungeon name; the same name and options always give the same map
    name: String,

    /// Dungeon size (fine, dimin, tiny, small, medium, large, huge, gargantuan, colossal)
    #[arg(short = 's', long = "size")]
    size: Option<String>,

    /// Outline (square, rectangle, box, cross, dagger, saltire, keep, hexagon, round)
    #[arg(short = 'l', long = "layout")]
    layout: Option<String>,

    /// Room size class (small, medium, large, huge, gargantuan, colossal)
    #[arg(long = "room-size")]
    room_size: Option<String>,

    /// Room placement (sparse, scattered, dense)
    #[arg(long = "room-layout")]
    room_layout: Option<String>,

    /// Corridor style (maze, errant, straight)
    #[arg(short = 'c', long = "corridors")]
    corridors: Option<String>,

    /// Dead-end removal (none, some, all)
    #[arg(short = 'd', long = "dead-ends")]
    dead_ends: Option<String>,

    /// Door profile (none, basic, secure, standard, deathtrap)
    #[arg(long = "doors")]
    doors: Option<String>,

    /// Stairs (no, yes, many)
    #[arg(long = "stairs")]
    stairs: Option<String>,

    /// JSON configuration file; flags override its values
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Print the dungeon as JSON instead of a map
    #[arg(long = "json")]
    json: bool,

    /// Log phases to stderr (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("dv_core=debug,delve=debug"),
        _ => EnvFilter::new("dv_core=trace,delve=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let base = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            Config::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => Config::default(),
    };

    let mut builder = ConfigBuilder::from_config(base);
    let flags = [
        ("dungeon_size", &args.size),
        ("dungeon_layout", &args.layout),
        ("room_size", &args.room_size),
        ("room_layout", &args.room_layout),
        ("corridor_layout", &args.corridors),
        ("remove_deadends", &args.dead_ends),
        ("doors", &args.doors),
        ("stairs", &args.stairs),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            builder.set(key, value)?;
        }
    }
    Ok(builder.build())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    info!(name = %args.name, ?config, "building dungeon");
    let dungeon = build(&args.name, config);

    if args.json {
        println!("{}", dungeon.to_json()?);
    } else {
        print!("{dungeon}");
    }
    Ok(())
}
