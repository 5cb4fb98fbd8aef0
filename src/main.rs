use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

mod config;
mod vm;

use config::{RuntimeConfig, TimingsFormat};
use vm::{bytecode, debug, Program, Vm};

// Wrapper type for clap ValueEnum support
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum TimingsFormatArg {
    #[default]
    Human,
    Json,
}

impl From<TimingsFormatArg> for TimingsFormat {
    fn from(arg: TimingsFormatArg) -> Self {
        match arg {
            TimingsFormatArg::Human => TimingsFormat::Human,
            TimingsFormatArg::Json => TimingsFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "opal")]
#[command(about = "A polymorphic object runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a bytecode file
    Run {
        /// The bytecode file to run
        file: PathBuf,

        /// Initial operand stack capacity
        #[arg(long)]
        stack_capacity: Option<usize>,

        /// Log each executed instruction to stderr
        #[arg(long)]
        trace: bool,

        /// Print execution statistics after the run (human or json format)
        #[arg(long)]
        timings: Option<TimingsFormatArg>,

        /// Load runtime configuration from a TOML file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a human-readable listing of a bytecode file
    Dump {
        /// The bytecode file to list
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            file,
            stack_capacity,
            trace,
            timings,
            config,
        } => run_command(&file, stack_capacity, trace, timings.map(|t| t.into()), config),
        Commands::Dump { file } => dump_command(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_program(path: &Path) -> Result<Program, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    bytecode::deserialize(&bytes).map_err(|e| format!("failed to load {}: {}", path.display(), e))
}

fn run_command(
    file: &Path,
    stack_capacity: Option<usize>,
    trace: bool,
    timings: Option<TimingsFormat>,
    config_path: Option<PathBuf>,
) -> Result<(), String> {
    let mut config = match config_path {
        Some(path) => RuntimeConfig::load(&path)?,
        None => RuntimeConfig::default(),
    };
    // Command-line flags win over the configuration file.
    if let Some(capacity) = stack_capacity {
        config.stack_capacity = capacity;
    }
    if trace {
        config.trace = true;
    }

    let program = load_program(file)?;
    let mut vm = Vm::new_with_config(
        config.stack_capacity,
        config.trace,
        Box::new(std::io::stdout()),
    );

    let started = Instant::now();
    vm.run(&program).map_err(|e| format!("runtime error: {}", e))?;
    let elapsed = started.elapsed();

    if let Some(format) = timings {
        print_timings(vm.stats(), elapsed, format)?;
    }
    Ok(())
}

fn dump_command(file: &Path) -> Result<(), String> {
    let program = load_program(file)?;
    print!("{}", debug::disassemble(&program));
    Ok(())
}

/// Statistics report for `--timings`, printed to stderr so it never mixes
/// with program output.
#[derive(Serialize)]
struct TimingsReport {
    instructions: u64,
    max_stack_depth: usize,
    elapsed_us: u64,
}

fn print_timings(
    stats: &vm::ExecStats,
    elapsed: Duration,
    format: TimingsFormat,
) -> Result<(), String> {
    let report = TimingsReport {
        instructions: stats.instructions,
        max_stack_depth: stats.max_stack_depth,
        elapsed_us: elapsed.as_micros() as u64,
    };
    match format {
        TimingsFormat::Human => {
            eprintln!("instructions:    {}", report.instructions);
            eprintln!("max stack depth: {}", report.max_stack_depth);
            eprintln!("elapsed:         {}us", report.elapsed_us);
        }
        TimingsFormat::Json => {
            let json = serde_json::to_string(&report)
                .map_err(|e| format!("failed to serialize timings: {}", e))?;
            eprintln!("{}", json);
        }
    }
    Ok(())
}
