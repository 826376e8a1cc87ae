use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use fitt::{unit_for, Decoder, FitDecoder, Params, Reader};
use rayon::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "FIT activity file tools", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify that FIT files decode without errors
    Verify(VerifyArgs),
    /// Print every decoded message of a FIT file
    Print(PrintArgs),
    /// Rebuild the activity record and report its derived fields
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct VerifyArgs {
    /// FIT files to verify
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct PrintArgs {
    /// FIT file to print
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// FIT file to inspect
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Print every record as a JSON line
    #[arg(long, action = ArgAction::SetTrue)]
    records: bool,

    /// JSON file with derivation parameters
    #[arg(long, value_hint = ValueHint::FilePath)]
    params: Option<PathBuf>,

    /// Altitude smoothing window (seconds)
    #[arg(long)]
    smooth: Option<f64>,

    /// Grade window (meters)
    #[arg(long)]
    grade_window: Option<f64>,

    /// Grade edge margin (meters)
    #[arg(long)]
    grade_margin: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Verify(args) => handle_verify(args),
        Command::Print(args) => handle_print(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn handle_verify(args: VerifyArgs) -> Result<()> {
    let failures: usize = args
        .inputs
        .par_iter()
        .map(|path| usize::from(!verify_file(path)))
        .sum();

    if failures > 0 {
        return Err(anyhow!(
            "{} of {} file(s) failed verification",
            failures,
            args.inputs.len()
        ));
    }
    Ok(())
}

fn verify_file(path: &Path) -> bool {
    info!("Verifying fit file: {}", path.display());
    let decoder = match FitDecoder::from_path(path) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!("Failed to read fit file: {}", e);
            return false;
        }
    };

    let decoded = decoder.decode();
    if !decoded.errors.is_empty() {
        error!(
            "{}: verification failed with {} errors:",
            path.display(),
            decoded.errors.len()
        );
        for e in &decoded.errors {
            error!(" - {}", e);
        }
        return false;
    }
    info!(
        "{}: verification succeeded with no errors ({} messages).",
        path.display(),
        decoded.messages.len()
    );
    true
}

fn handle_print(args: PrintArgs) -> Result<()> {
    info!("Printing fit file: {}", args.input.display());
    let decoded = FitDecoder::from_path(&args.input)?.decode();
    if !decoded.errors.is_empty() {
        for e in &decoded.errors {
            error!(" - {}", e);
        }
        return Err(anyhow!("errors decoding {}", args.input.display()));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for message in &decoded.messages {
        writeln!(out, "----------")?;
        writeln!(out, "Message: {}", message.kind)?;
        let fields: BTreeMap<_, _> = message.fields.iter().collect();
        for (name, value) in fields {
            writeln!(out, "  {name}: {value}")?;
        }
    }
    Ok(())
}

fn build_params(args: &InspectArgs) -> Result<Params> {
    let mut params = match args.params.as_ref() {
        Some(path) => Params::load(path)?,
        None => Params::default(),
    };
    if let Some(smooth) = args.smooth {
        params.smooth_altitude_window_s = smooth;
    }
    if let Some(window) = args.grade_window {
        params.grade_window_m = window;
    }
    if let Some(margin) = args.grade_margin {
        params.grade_edge_margin_m = margin;
    }
    params.validate()?;
    Ok(params)
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let params = build_params(&args)?;
    let reader = Reader::open_with(&args.input, &params)
        .into_result()
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let mut present: BTreeMap<&str, usize> = BTreeMap::new();
    if !reader.is_empty() {
        present.insert(fitt::fields::TIMESTAMP, reader.len());
    }
    for (_, record) in reader.data() {
        for (name, _) in record.fields() {
            *present.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "FILE: {}", args.input.display())?;
    writeln!(out, "  records: {}", reader.len())?;
    if let (Some(start), Some(end)) = (
        reader.series().first_timestamp(),
        reader.series().last_timestamp(),
    ) {
        writeln!(out, "  start: {}", start.to_rfc3339())?;
        writeln!(
            out,
            "  elapsed_s: {:.1}",
            (end - start).num_milliseconds() as f64 / 1000.0
        )?;
    }
    if let Some((_, last)) = reader.data().last() {
        if let Some(distance) = last.get_f64(fitt::fields::TRACK_DISTANCE) {
            writeln!(out, "  track_distance_m: {:.1}", distance)?;
        }
    }
    writeln!(out, "  fields:")?;
    for (name, count) in &present {
        let unit = unit_for(name).map_or(String::new(), |u| format!(" [{u}]"));
        writeln!(out, "    - {name}{unit}: {count}")?;
    }

    if args.records {
        for (_, record) in reader.data() {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
        }
    }
    Ok(())
}
