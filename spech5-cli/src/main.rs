//! spech5 CLI
//!
//! Inspects SPEC files through their HDF5-like tree.

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use serde_json::{json, Map, Value};
use spech5_core::grammar::{join, try_classify};
use spech5_core::{Attrs, Dataset, Payload};
use spech5_io::{Entry, Group, SpecFileReader, SpecH5, ViewConfig};
use spech5_specfile::ParserConfig;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] spech5_io::Error),

    #[error("{0}")]
    View(#[from] spech5_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// HDF5-like viewer for SPEC scan files.
#[derive(Parser)]
#[command(name = "spech5")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Parse scans on a single thread
    #[arg(long, global = true)]
    sequential: bool,

    /// Zone appended to start_time values without one (e.g. "+01:00")
    #[arg(long, global = true)]
    time_zone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a SPEC file
    Info {
        /// Input SPEC file
        input: PathBuf,
    },

    /// Print the tree below a group (links are not followed)
    Tree {
        /// Input SPEC file
        input: PathBuf,

        /// Group to start from
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print a group or a dataset
    Get {
        /// Input SPEC file
        input: PathBuf,

        /// Path in the tree, e.g. /1.1/measurement/det
        path: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let parser = ParserConfig::new().with_parallel(!cli.sequential);
    let mut view = ViewConfig::new();
    if let Some(zone) = cli.time_zone {
        view = view.with_time_zone(zone);
    }

    match cli.command {
        Commands::Info { input } => info(&input, parser),
        Commands::Tree { input, path } => {
            let sfh5 = SpecH5::open_with(&input, parser)?.with_config(view);
            tree(&sfh5, &path)
        }
        Commands::Get { input, path, json } => {
            let sfh5 = SpecH5::open_with(&input, parser)?.with_config(view);
            let entry = sfh5.get(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry_json(&entry)?)?);
            } else {
                print_entry(&entry)?;
            }
            Ok(())
        }
    }
}

fn info(input: &Path, parser: ParserConfig) -> Result<()> {
    let start = Instant::now();
    let reader = SpecFileReader::open(input)?.with_config(parser);
    let file_size = reader.file_size();
    let spec = reader.read()?;
    let elapsed = start.elapsed();
    let sfh5 = SpecH5::from_source(spec);

    println!("File: {}", input.display());
    println!("Size: {file_size} bytes");
    println!("Scans: {}", sfh5.len());
    println!("Parsed in {:.2} ms", elapsed.as_secs_f64() * 1000.0);
    println!();
    println!(
        "{:<8} | {:>7} | {:>5} | {:>4} | title",
        "key", "columns", "lines", "mca"
    );
    println!("{:-<60}", "");

    for key in sfh5.keys() {
        let Some(scan) = sfh5.source().scan(&key) else {
            continue;
        };
        let analysers = scan
            .analyser_count()
            .map_or_else(|_| "?".to_string(), |n| n.to_string());
        println!(
            "{:<8} | {:>7} | {:>5} | {:>4} | {}",
            key,
            scan.labels().len(),
            scan.data_lines(),
            analysers,
            scan.scan_header("S").unwrap_or("")
        );
    }
    Ok(())
}

fn tree(sfh5: &SpecH5, path: &str) -> Result<()> {
    let group = if path.is_empty() {
        sfh5.root()
    } else {
        match sfh5.get(path)? {
            Entry::Group(group) => group,
            Entry::Dataset(dataset) => {
                println!("{}", dataset.name());
                return Ok(());
            }
        }
    };

    println!("{}", group.name());
    let base = depth(group.name());
    group.visit(|name| {
        let indent = "  ".repeat(depth(name) - base - 1);
        let leaf = name.rsplit('/').next().unwrap_or(name);
        let suffix = if is_group_like(name) { "/" } else { "" };
        println!("{indent}{leaf}{suffix}");
        None::<()>
    })?;
    Ok(())
}

fn depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

fn is_group_like(path: &str) -> bool {
    try_classify(path).is_some_and(|found| found.kind.is_group_like())
}

fn print_entry(entry: &Entry<'_>) -> Result<()> {
    match entry {
        Entry::Group(group) => print_group(group),
        Entry::Dataset(dataset) => {
            print_dataset(dataset);
            Ok(())
        }
    }
}

fn print_group(group: &Group<'_>) -> Result<()> {
    println!("{group}");
    print_attrs(&group.attrs());
    for key in group.keys()? {
        let path = join(group.name(), &key);
        let Some(found) = try_classify(&path) else {
            continue;
        };
        let suffix = if found.kind.is_group_like() { "/" } else { "" };
        match found.link_target() {
            Some(target) => println!("  {key}{suffix} -> {target}"),
            None => println!("  {key}{suffix}"),
        }
    }
    Ok(())
}

fn print_dataset(dataset: &Dataset) {
    println!("{}", dataset.name());
    println!("  dtype: {}", dataset.dtype());
    println!("  shape: {:?}", dataset.shape());
    if dataset.is_link() {
        println!("  link: yes");
    }
    print_attrs(dataset.attrs());
    match dataset.value() {
        Payload::Float(values) => println!("{values}"),
        Payload::Str(values) => println!("{values}"),
        Payload::Bytes(values) => println!("{values:?}"),
    }
}

fn print_attrs(attrs: &Attrs) {
    for (key, value) in attrs {
        println!("  @{key} = {value}");
    }
}

fn attrs_json(attrs: &Attrs) -> Value {
    Value::Object(
        attrs
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect::<Map<_, _>>(),
    )
}

fn entry_json(entry: &Entry<'_>) -> Result<Value> {
    Ok(match entry {
        Entry::Group(group) => json!({
            "name": group.name(),
            "kind": "group",
            "link": group.is_link(),
            "attrs": attrs_json(&group.attrs()),
            "keys": group.keys()?,
        }),
        Entry::Dataset(dataset) => {
            let value = match dataset.value() {
                Payload::Float(values) => nested(&values.view(), &|v: &f32| json!(f64::from(*v))),
                Payload::Str(values) => nested(&values.view(), &|v: &String| json!(v)),
                Payload::Bytes(values) => nested(&values.view(), &|v: &Vec<u8>| json!(v)),
            };
            json!({
                "name": dataset.name(),
                "kind": "dataset",
                "link": dataset.is_link(),
                "attrs": attrs_json(dataset.attrs()),
                "dtype": dataset.dtype().to_string(),
                "shape": dataset.shape(),
                "value": value,
            })
        }
    })
}

/// Converts an n-dimensional array to nested JSON arrays.
fn nested<T>(array: &ndarray::ArrayViewD<'_, T>, leaf: &dyn Fn(&T) -> Value) -> Value {
    if array.ndim() == 0 {
        return array.first().map_or(Value::Null, leaf);
    }
    Value::Array(array.outer_iter().map(|sub| nested(&sub, leaf)).collect())
}
