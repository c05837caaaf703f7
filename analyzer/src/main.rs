use clap::Parser;
use env_logger::Env;
use std::io::Write;
use std::path::PathBuf;

use shardcheck::pipeline::{compute_provenance, run_pipeline, PipelineOptions};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "shardcheck",
    version,
    about = "Computes per-shard argument/result shapes and donated parameters of a module"
)]
struct Cli {
    /// Input module (.json)
    module: PathBuf,

    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// All parameters are packed into the entry computation's single tuple parameter
    #[arg(long)]
    tuple_inputs: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print analysis phases
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.verbose {
        eprintln!("shardcheck: module = {}", cli.module.display());
        eprintln!("shardcheck: format = {:?}", cli.format);
        eprintln!("shardcheck: tuple_inputs = {}", cli.tuple_inputs);
    }

    // ── Load module ──
    let loaded = match shardcheck::loader::load_module(&cli.module) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("shardcheck: error: {}", e);
            std::process::exit(2);
        }
    };
    let provenance = compute_provenance(&loaded.source);

    if cli.verbose {
        eprintln!(
            "shardcheck: loaded '{}' ({} computations, {} aliases), sha256 {}",
            loaded.module.name,
            loaded.module.computations.len(),
            loaded.module.input_output_alias.len(),
            provenance.module_hash_hex()
        );
    }

    // ── Analyses ──
    let options = PipelineOptions {
        tuple_inputs: cli.tuple_inputs,
    };
    let result = run_pipeline(&loaded.module, &options);
    for diag in &result.diagnostics {
        eprintln!("shardcheck: {}", diag);
    }
    let plan = match result.plan {
        Some(plan) if !result.diagnostics.iter().any(|d| d.is_error()) => plan,
        _ => std::process::exit(1),
    };

    if cli.verbose {
        eprintln!(
            "shardcheck: {} argument(s), {} donated",
            plan.program_shape.parameters.len(),
            plan.donated_parameters.len()
        );
    }

    // ── Emit ──
    let rendered = match cli.format {
        OutputFormat::Text => format!("{}\n", plan),
        OutputFormat::Json => {
            let report = serde_json::json!({
                "plan": plan,
                "provenance": provenance.to_json_value(),
            });
            match serde_json::to_string_pretty(&report) {
                Ok(s) => s + "\n",
                Err(e) => {
                    eprintln!("shardcheck: error: {}", e);
                    std::process::exit(2);
                }
            }
        }
    };

    let written = match &cli.output {
        Some(path) => std::fs::write(path, rendered.as_bytes())
            .map_err(|e| format!("{}: {}", path.display(), e)),
        None => std::io::stdout()
            .write_all(rendered.as_bytes())
            .map_err(|e| e.to_string()),
    };
    if let Err(e) = written {
        eprintln!("shardcheck: error: {}", e);
        std::process::exit(2);
    }
}
