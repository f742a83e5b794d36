//! lazysheet - evaluate the demonstration sheet from the command line

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use env_logger::{Env, Target};
use lazysheet::config::load_config;
use lazysheet::powers::{NAMES, Powers};
use lazysheet_core::storage::save_table;

fn print_usage() {
    eprintln!("Usage: lazysheet [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <NAME=VALUE>    Assign a cell (can be repeated; empty or - clears)");
    eprintln!("  -t, --table <FILE>        Assign cells from a NAME,VALUE table file");
    eprintln!("  -o, --output <FILE>       Write name,value,version rows to a table file");
    eprintln!("  --config <FILE>           Read settings from FILE instead of the default");
    eprintln!("  --stats                   Print how often each computed cell was evaluated");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Cells: {}", NAMES.join(", "));
}

struct Options {
    assignments: Vec<String>,
    table_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    stats: bool,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut options = Options {
        assignments: Vec::new(),
        table_file: None,
        output_file: None,
        config_file: None,
        stats: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-s" | "--set" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --set requires NAME=VALUE");
                    std::process::exit(1);
                }
                options.assignments.push(args[i].to_string());
            }
            "-t" | "--table" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --table requires a file path");
                    std::process::exit(1);
                }
                options.table_file = Some(PathBuf::from(&args[i]));
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                options.output_file = Some(PathBuf::from(&args[i]));
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                options.config_file = Some(PathBuf::from(&args[i]));
            }
            "--stats" => options.stats = true,
            arg => {
                eprintln!("Error: Unknown argument: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if let Err(e) = run(options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    let (config, warnings) = load_config(options.config_file.as_ref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut powers = Powers::new(config.sheet).context("building the sheet")?;

    for (name, value) in &config.seed {
        powers
            .assign(name, Some(*value))
            .with_context(|| format!("seeding {} from config", name))?;
    }

    if let Some(path) = &options.table_file {
        let applied = powers
            .assign_table(path)
            .with_context(|| format!("applying table {}", path.display()))?;
        log::info!("Applied {} assignments from {}", applied, path.display());
    }

    for assignment in &options.assignments {
        powers
            .assign_text(assignment)
            .with_context(|| format!("applying --set {}", assignment))?;
    }

    let report = powers.report();
    for row in &report {
        println!("{} = {} (v{})", row.name, row.display_value(), row.version);
    }

    if options.stats {
        println!();
        for name in NAMES {
            if let Some(count) = powers.evaluations(name) {
                println!("{}: {} evaluation(s)", name, count);
            }
        }
    }

    if let Some(path) = &options.output_file {
        let rows: Vec<_> = report.iter().map(|row| row.to_row()).collect();
        save_table(path, &rows).with_context(|| format!("writing {}", path.display()))?;
        println!("Exported to {}", path.display());
    }

    Ok(())
}
