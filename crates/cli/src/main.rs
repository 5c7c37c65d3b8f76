//! Alpha AXP 21264 simulator CLI.
//!
//! A single entry point for running a flat boot image: the image's 32-bit
//! instruction words are installed at a configurable base physical address,
//! the CPU is brought through its power-up lifecycle, and simulation runs
//! until the guest halts (`CALL_PAL 0`) or a cycle budget expires. Final
//! statistics print on exit; tracing output is steered with `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use axp21264_core::sim::loader;
use axp21264_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "sim",
    author,
    version,
    about = "Alpha AXP 21264 (EV68) out-of-order processor simulator",
    long_about = "Run a flat Alpha boot image.\n\nThe image is a raw array of little-endian 32-bit instruction words; it is\ninstalled at --base, fetched in PAL mode, and executed until CALL_PAL 0\n(halt) or the cycle budget runs out.\n\nExamples:\n  sim -f image.bin\n  sim -f image.bin --base 0x10000 --max-cycles 2000000\n  sim -f image.bin --config machine.json --stats summary,memory"
)]
struct Cli {
    /// Boot image: raw little-endian 32-bit Alpha instruction words.
    #[arg(short, long)]
    file: PathBuf,

    /// Base physical address the image is installed and fetched at.
    #[arg(long, default_value = "0x0", value_parser = parse_address)]
    base: u64,

    /// Cycle budget; 0 runs until the guest halts.
    #[arg(long, default_value_t = 10_000_000)]
    max_cycles: u64,

    /// JSON configuration file overriding the architectural defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated statistics sections to print (default: all).
    #[arg(long, value_delimiter = ',')]
    stats: Vec<String>,
}

fn parse_address(s: &str) -> Result<u64, String> {
    let stripped = s.trim_start_matches("0x").trim_start_matches("0X");
    let radix = if stripped.len() == s.len() { 10 } else { 16 };
    u64::from_str_radix(stripped, radix).map_err(|e| format!("invalid address '{s}': {e}"))
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, String> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("bad config {}: {e}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins; the config's trace switch raises the default level.
    let default_level = if config.general.trace_instructions {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut sim = Simulator::new(&config);
    sim.max_cycles = cli.max_cycles;

    if let Err(e) = loader::boot_from_file(&mut sim, &cli.file, cli.base) {
        error!("boot failed: {e}");
        return ExitCode::FAILURE;
    }

    println!(
        "[*] Booted {} at {:#x}; running up to {} cycles",
        cli.file.display(),
        cli.base,
        cli.max_cycles
    );

    let halt = sim.run();
    sim.cpu.stats.print_sections(&cli.stats);

    match halt {
        Some(code) => {
            println!("\n[*] Guest halted with value {code}");
            ExitCode::from((code & 0xFF) as u8)
        }
        None => {
            println!("\n[*] Cycle budget exhausted at PC {:#x}", sim.cpu.pc);
            ExitCode::SUCCESS
        }
    }
}
