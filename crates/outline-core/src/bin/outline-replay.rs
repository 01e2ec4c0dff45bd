use clap::Parser;
use outline_core::settings::SettingsStore;
use outline_core::sort::sorted_ids;
use outline_core::wire::{parse_todo_list, to_json};
use outline_core::{Command, Engine, OutlineList, OutlineSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replays editing commands against a to-do list and prints the result.
#[derive(Debug, Parser)]
#[command(name = "outline-replay")]
struct ReplayArgs {
    /// To-do list in backend format.
    #[arg(long)]
    list: PathBuf,
    /// JSON array of commands to apply in order.
    #[arg(long)]
    commands: PathBuf,
    /// Settings file; the per-user settings are used when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Print the visible item ids instead of the resulting list.
    #[arg(long)]
    visible: bool,
}

fn load_settings(path: Option<PathBuf>) -> OutlineSettings {
    let store = match path {
        Some(path) => SettingsStore::new(path),
        None => match SettingsStore::default_store() {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default settings");
                return OutlineSettings::default();
            }
        },
    };
    tracing::debug!(path = %store.path().display(), "loading settings");
    store.load_or_default()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ReplayArgs::parse();

    let raw = match std::fs::read_to_string(&args.list) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to read list: {err}");
            std::process::exit(1);
        }
    };
    let data = match parse_todo_list(&raw) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Invalid list: {err}");
            std::process::exit(1);
        }
    };

    let raw_commands = match std::fs::read_to_string(&args.commands) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to read commands: {err}");
            std::process::exit(1);
        }
    };
    let commands: Vec<Command> = match serde_json::from_str(&raw_commands) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Invalid commands: {err}");
            std::process::exit(1);
        }
    };

    let engine = Engine::new(load_settings(args.settings));
    let list = OutlineList::from_data(&data);
    let result = match engine.apply_all(&list, commands) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Replay failed: {err}");
            std::process::exit(1);
        }
    };

    if args.visible {
        let ids: Vec<String> = sorted_ids(&result).iter().map(ToString::to_string).collect();
        println!("{}", ids.join(" "));
        return;
    }
    match to_json(&result.to_data()) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("Failed to encode list: {err}");
            std::process::exit(1);
        }
    }
}
