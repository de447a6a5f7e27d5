//! lazymount simulator entry point.
//!
//! Drives the scheduler against an in-memory feed and a synthetic viewport.
//!
//! ## CLI Subcommands
//!
//! - `lazymount-sim simulate [--items N] [--json]` - Scroll through a synthetic feed
//! - `lazymount-sim config show` - Print the effective configuration as JSON
//! - `lazymount-sim help` / `version`

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use lazymount::config::{self as lm_config, EnvConfig};
use lazymount::telemetry::{init_logging, LogError};
use lazymount::{
    ComponentEntry, CreateError, ManualVisibilitySource, MemoryMountTarget, MountTarget, Node,
    PlaceholderElement, PlaceholderShape, PlaceholderSpec, SchedulerStats, Virtualizer,
    VisibilitySource,
};

const DEFAULT_ITEMS: usize = 24;
const VIEWPORT_ITEMS: usize = 3;
const FAIL_EVERY: usize = 11;

#[derive(Debug, Serialize)]
struct SimulationReport {
    target: String,
    items: usize,
    mounted: usize,
    placeholders_left: usize,
    elapsed_ms: u64,
    stats: SchedulerStats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("simulate");

    match command {
        "simulate" => {
            let config = lm_config::load();
            if let Err(e) = init_logging(&config.log) {
                if !matches!(e, LogError::AlreadyInitialized) {
                    eprintln!("Logging disabled: {}", e);
                }
            }
            let items = match parse_items(&args) {
                Ok(items) => items,
                Err(msg) => {
                    eprintln!("{}", msg);
                    return ExitCode::FAILURE;
                }
            };
            let json = args.iter().any(|a| a == "--json");
            tokio::select! {
                report = run_simulation(config, items) => print_report(&report, json),
                _ = tokio::signal::ctrl_c() => {
                    eprintln!("Interrupted");
                    ExitCode::FAILURE
                }
            }
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => print_json(&lm_config::load().effective_config()),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("lazymount-sim {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn parse_items(args: &[String]) -> Result<usize, String> {
    match args.iter().position(|a| a == "--items") {
        None => Ok(DEFAULT_ITEMS),
        Some(pos) => args
            .get(pos + 1)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| "--items expects a positive number".to_string()),
    }
}

fn card_placeholder() -> PlaceholderSpec {
    PlaceholderSpec::composite(
        180,
        vec![
            PlaceholderElement::new(PlaceholderShape::Circle),
            PlaceholderElement::new(PlaceholderShape::Line).spacing(6),
            PlaceholderElement::new(PlaceholderShape::Block),
        ],
    )
}

fn card_entry(index: usize, feed: Arc<dyn MountTarget>) -> ComponentEntry {
    let id = format!("card-{index}");
    let name = id.clone();
    let build_time = Duration::from_millis(20 + (index % 5) as u64 * 40);
    ComponentEntry::new(id, feed, move || {
        let name = name.clone();
        async move {
            tokio::time::sleep(build_time).await;
            if index > 0 && index % FAIL_EVERY == 0 {
                return Err(CreateError::failed(format!("{name}: backend unavailable")));
            }
            Ok(Node::element(name))
        }
    })
    .priority(index as i32)
    .with_placeholder(card_placeholder)
    .minimum_display_ms(150)
}

async fn run_simulation(config: EnvConfig, items: usize) -> SimulationReport {
    let started = tokio::time::Instant::now();
    let source = Arc::new(ManualVisibilitySource::new());
    let visibility: Arc<dyn VisibilitySource> = source.clone();
    let debounce = config.virtualizer.debounce;
    let virtualizer = Virtualizer::new(config.virtualizer, Some(visibility));
    virtualizer.init();

    let feed = Arc::new(MemoryMountTarget::new("feed"));
    let header_target: Arc<dyn MountTarget> = feed.clone();
    virtualizer.register(
        ComponentEntry::new("header", header_target, || async { Ok(Node::element("header")) })
            .eager(),
    );
    for index in 0..items {
        virtualizer.register(card_entry(index, feed.clone()));
    }

    // Warm the tail of the feed in the background.
    for index in (items.saturating_sub(2)..items).rev() {
        virtualizer.preload(&format!("card-{index}"), false);
    }

    for top in 0..items {
        for index in top..(top + VIEWPORT_ITEMS).min(items) {
            source.reveal(&format!("card-{index}"), 1.0);
        }
        tokio::time::sleep(debounce / 2).await;
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !virtualizer.stats().is_settled() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(debounce).await;
    }
    virtualizer.dispose().await;

    let placeholders_left = feed.children().iter().filter(|n| n.is_placeholder()).count();
    SimulationReport {
        target: feed.name().to_string(),
        items,
        mounted: feed.len() - placeholders_left,
        placeholders_left,
        elapsed_ms: started.elapsed().as_millis() as u64,
        stats: virtualizer.stats(),
    }
}

fn print_report(report: &SimulationReport, json: bool) -> ExitCode {
    if json {
        return print_json(report);
    }
    println!("lazymount simulation ({})", report.target);
    println!("  items:              {}", report.items);
    println!("  mounted:            {}", report.mounted);
    println!("  placeholders left:  {}", report.placeholders_left);
    println!("  constructions:      {}", report.stats.constructions_started);
    println!("  failures:           {}", report.stats.constructions_failed);
    println!("  elapsed:            {} ms", report.elapsed_ms);
    ExitCode::SUCCESS
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("lazymount-sim - lazy component scheduler simulator");
    println!();
    println!("USAGE:");
    println!("    lazymount-sim [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    simulate [--items N] [--json]   Scroll through a synthetic feed (default)");
    println!("    config show                      Print the effective configuration");
    println!("    help                             Print this message");
    println!("    version                          Print version information");
}
