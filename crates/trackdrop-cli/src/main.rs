mod commands;
mod logging;
mod progress;

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::sync::{mpsc, Arc};

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::{CliReporter, Notice};
use trackdrop_core::{
    Advance, AppConfig, Error, GpxCodec, Operation, OperationStore, PendingItem, Pipeline, Poller,
    TrackAnnotation,
};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let config = match trackdrop_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    if let Err(err) = run(args.command, config) {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

fn run(command: Option<Commands>, config: AppConfig) -> anyhow::Result<()> {
    let store = OperationStore::new(config.app_root.clone());

    match command {
        Some(Commands::NewOperation { name, start, areas }) => {
            let operation = store.create(&name, start, areas)?;
            println!(
                "{} Created '{}' at {}",
                "✓".green(),
                operation.name.bold(),
                store.manifest_path(&operation).display()
            );
        }
        Some(Commands::ListOperations) => list_operations(&store),
        Some(Commands::Watch { operation }) => run_watch(config, operation.as_deref())?,
        Some(Commands::Import { file, operation }) => {
            run_import(config, &file, operation.as_deref())?
        }
        Some(Commands::SetStart { operation, start }) => {
            let mut operation = store.find(&operation)?;
            operation.update_start_time(start);
            store.persist(&operation)?;
            println!("{} '{}' now starts {}", "✓".green(), operation.name, start);
        }
        Some(Commands::AddStoragePath { operation, path }) => {
            let mut operation = store.find(&operation)?;
            if operation.add_storage_path(path.clone()) {
                store.persist(&operation)?;
                println!(
                    "{} '{}' mirrored to {}",
                    "✓".green(),
                    operation.name,
                    path.display()
                );
            } else {
                println!("{} is already a storage path", path.display());
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn list_operations(store: &OperationStore) {
    let operations = store.load_existing_operations();
    if operations.is_empty() {
        println!("No operations under {}", store.app_root().display());
        return;
    }
    for operation in operations {
        println!(
            "{}  starts {}  {} area(s)",
            operation.name.bold(),
            operation.start_time.format("%Y-%m-%d %H:%M UTC"),
            operation.number_of_areas
        );
        for root in operation.storage_paths() {
            println!("    {}", root.display().to_string().dimmed());
        }
    }
}

/// The named operation, or the newest one when no name is given.
fn resolve_operation(store: &OperationStore, name: Option<&str>) -> anyhow::Result<Operation> {
    match name {
        Some(name) => Ok(store.find(name)?),
        None => store.load_existing_operations().into_iter().next().ok_or_else(|| {
            anyhow!("No operations found; create one with `trackdrop new-operation`")
        }),
    }
}

fn open_pipeline(config: AppConfig, operation: Option<&str>) -> anyhow::Result<Pipeline> {
    let operation = resolve_operation(&OperationStore::new(config.app_root.clone()), operation)?;
    let pipeline = Pipeline::new(config, Box::new(GpxCodec));
    println!(
        "Operation {} (start {})",
        operation.name.bold(),
        operation.start_time.format("%Y-%m-%d %H:%M UTC")
    );
    pipeline
        .activate_operation(operation)
        .context("Cannot read the operation's raw folder")?;
    Ok(pipeline)
}

fn run_watch(config: AppConfig, operation: Option<&str>) -> anyhow::Result<()> {
    let mounts = config.system_mounts();
    let interval = config.poll_interval();
    let pipeline = Arc::new(open_pipeline(config, operation)?);

    let (tx, rx) = mpsc::channel();
    let reporter = Arc::new(CliReporter::new(tx));
    let handle = Poller::spawn(
        Arc::clone(&pipeline),
        Box::new(mounts),
        interval,
        reporter.clone(),
    )
    .context("Cannot start the device poller")?;
    info!("Watching for devices every {:?}", interval);

    while let Ok(notice) = rx.recv() {
        match notice {
            Notice::ItemSurfaced => reporter.suspend(|| annotate_queue(&pipeline))?,
            Notice::PollerStopped => break,
        }
    }

    reporter.finish();
    handle.stop();
    Ok(())
}

fn run_import(config: AppConfig, file: &Path, operation: Option<&str>) -> anyhow::Result<()> {
    let pipeline = open_pipeline(config, operation)?;
    let report = pipeline.import_file(file)?;
    println!("{}", progress::format_report(&file.display().to_string(), &report));
    annotate_queue(&pipeline)
}

/// Prompts for every queued item until the queue is empty.
fn annotate_queue(pipeline: &Pipeline) -> anyhow::Result<()> {
    let mut previous: Option<TrackAnnotation> = None;

    while let Some(item) = pipeline.current() {
        print_item(&item);
        let Some(annotation) = prompt_annotation(previous.as_ref())? else {
            if let Advance::QueueEmpty = pipeline.skip_current()? {
                println!("{} Queue empty", "✓".green());
            }
            continue;
        };

        match pipeline.finalize_current(&annotation) {
            Ok(finalized) => {
                println!(
                    "{} Saved {}",
                    "✓".green(),
                    finalized.processed_filename.bold()
                );
                if finalized.next == Advance::QueueEmpty {
                    println!("{} Queue empty", "✓".green());
                }
                previous = Some(annotation);
            }
            Err(Error::InvalidAnnotation(message)) => {
                println!("{} {}", "✗".red(), message);
            }
            Err(err) => {
                println!("{} {}", "✗".red(), err);
                if !prompt_confirm("Try again?", Some(true))? {
                    pipeline.skip_current()?;
                }
            }
        }
    }
    Ok(())
}

fn print_item(item: &PendingItem) {
    println!();
    println!(
        "{} {} ({:?}, {} point(s), {} more queued)",
        "▶".cyan(),
        item.source_filename.bold(),
        item.kind,
        item.point_count,
        item.remaining
    );
    if let Some((first, last)) = item.time_span {
        println!(
            "  {} - {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }
}

/// `None` when the operator skips the item.
fn prompt_annotation(previous: Option<&TrackAnnotation>) -> io::Result<Option<TrackAnnotation>> {
    let crew_type = prompt_line(
        "Crew type (s to skip)",
        previous.map(|p| p.crew_type.clone()),
    )?;
    if crew_type.eq_ignore_ascii_case("s") {
        return Ok(None);
    }

    let crew_number = prompt_number("Crew number", previous.map(|p| p.crew_number))?;
    let crew_count = prompt_number("Crew size", previous.map(|p| p.crew_count))?;
    let areas_searched = prompt_areas(previous.map(|p| p.areas_joined(",")))?;
    let track_number = prompt_number("Track number", previous.map(|p| p.track_number + 1))?;
    let comment = prompt_line("Comment", Some(String::new()))?;

    Ok(Some(TrackAnnotation {
        crew_type,
        crew_number,
        crew_count,
        areas_searched,
        track_number,
        comment,
    }))
}

fn prompt_line(prompt: &str, default: Option<String>) -> io::Result<String> {
    let mut input = String::new();

    loop {
        input.clear();

        match default.as_deref() {
            Some(d) if !d.is_empty() => print!("{} [{}]: ", prompt, d),
            _ => print!("{}: ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        match (input.trim(), &default) {
            ("", Some(default)) => return Ok(default.clone()),
            ("", None) => continue,
            (value, _) => return Ok(value.to_string()),
        }
    }
}

fn prompt_number(prompt: &str, default: Option<u32>) -> io::Result<u32> {
    loop {
        let value = prompt_line(prompt, default.map(|d| d.to_string()))?;
        match value.parse::<u32>() {
            Ok(number) => return Ok(number),
            Err(_) => println!("{} '{}' is not a number", "✗".red(), value),
        }
    }
}

fn prompt_areas(default: Option<String>) -> io::Result<BTreeSet<u32>> {
    loop {
        let value = prompt_line("Areas searched (e.g. 1,3)", default.clone())?;
        match parse_areas(&value) {
            Ok(areas) => return Ok(areas),
            Err(bad) => println!("{} '{}' is not an area number", "✗".red(), bad),
        }
    }
}

fn parse_areas(value: &str) -> Result<BTreeSet<u32>, String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u32>().map_err(|_| part.to_string()))
        .collect()
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_areas_accepts_commas_and_spaces() {
        assert_eq!(
            parse_areas("3, 1 2,,3").unwrap(),
            [1, 2, 3].into_iter().collect::<BTreeSet<u32>>()
        );
        assert!(parse_areas("").unwrap().is_empty());
        assert_eq!(parse_areas("1,x"), Err("x".to_string()));
    }
}
