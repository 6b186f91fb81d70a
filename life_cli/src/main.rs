//! `life_cli`: a headless, text-driven front-end for Ten Second Life.

mod error;
mod geometry;
mod play;
mod script;

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use life_core::{EngineConfig, LifeCycleController};
use world_rules::{JsonFileStore, WorldBible, WorldStore};

use crate::error::CliError;
use crate::geometry::BibleGeometry;

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG: &str = "life.toml";

const USAGE: &str = "\
life_cli [--config <path>] <command>
commands:
  play [script]   run lives, reading commands from script or stdin
  status          print the saved world state and current objective
  reset           erase all progress
script commands:
  wait <secs> | move <x> <y> | use <object> <action> | die [cause]
  zone <id> | status | reset | quit";

struct Args {
    config: Option<PathBuf>,
    command: String,
    rest: Vec<String>,
}

/// Parse the command line. `None` means help was asked for.
fn parse_args(raw: &[String]) -> Result<Option<Args>, CliError> {
    let mut config = None;
    let mut positional = Vec::new();
    let mut iter = raw.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--config needs a path".to_owned()))?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(None),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let command = positional
        .next()
        .ok_or_else(|| CliError::Usage("missing command".to_owned()))?;
    Ok(Some(Args {
        config,
        command,
        rest: positional.collect(),
    }))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(EngineConfig::from_file(Path::new(DEFAULT_CONFIG))?),
        None => Ok(EngineConfig::default()),
    }
}

fn init_logging(config: &EngineConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_bible(config: &EngineConfig) -> Result<Arc<WorldBible>, CliError> {
    let bible = match &config.content.bible_path {
        Some(path) => WorldBible::from_file(path)?,
        None => WorldBible::default_bible()?,
    };
    Ok(Arc::new(bible))
}

fn open_store(config: &EngineConfig, bible: Arc<WorldBible>) -> WorldStore {
    WorldStore::open(bible, Box::new(JsonFileStore::new(&config.storage.save_path)))
}

fn run(args: Args, config: EngineConfig) -> Result<(), CliError> {
    let bible = load_bible(&config)?;

    match args.command.as_str() {
        "play" => {
            let store = open_store(&config, Arc::clone(&bible));
            let geometry = BibleGeometry::new(bible);
            let mut controller = LifeCycleController::new(store, geometry, config.life.clone());
            let mut out = io::stdout().lock();
            match args.rest.first() {
                Some(script) => {
                    let file = File::open(script)
                        .map_err(|err| CliError::Usage(format!("cannot open script {script}: {err}")))?;
                    play::run(&mut controller, BufReader::new(file), &mut out, config.life.tick_secs)
                }
                None => play::run(&mut controller, io::stdin().lock(), &mut out, config.life.tick_secs),
            }
        }
        "status" => {
            let store = open_store(&config, bible);
            play::print_status(&mut io::stdout().lock(), store.bible(), store.state())?;
            Ok(())
        }
        "reset" => {
            let mut store = open_store(&config, bible);
            store.reset().map_err(life_core::ControllerError::Reset)?;
            println!("progress reset");
            Ok(())
        }
        other => Err(CliError::Usage(format!("unknown command: {other}"))),
    }
}

fn main() {
    let raw: Vec<String> = env::args().collect();
    let args = match parse_args(&raw) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("{USAGE}");
            process::exit(err.exit_code());
        }
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(err.exit_code());
        }
    };
    init_logging(&config);
    info!(command = %args.command, save = %config.storage.save_path.display(), "life_cli starting");

    if let Err(err) = run(args, config) {
        eprintln!("error: {err}");
        if matches!(err, CliError::Usage(_)) {
            eprintln!("{USAGE}");
        }
        process::exit(err.exit_code());
    }
}
