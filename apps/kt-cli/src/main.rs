use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use kt_app::{AppError, AppResult, Script, Workbench, WorkbenchConfig, list_available_files};
use kt_model::{Choice, Inertia, Integration, Interpolation, SourceFile, TraceConfig, TraceOutcome};
use kt_sim::{MemoryTracks, NoTracks, Sample, TrackLoader, integrate};

#[derive(Parser)]
#[command(name = "kt-cli")]
#[command(about = "kinetrace CLI - rolling-body trajectory traces and charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List importable track files in a folder
    Files {
        /// Folder to scan
        folder: PathBuf,
        /// File extension to match
        #[arg(long, default_value = "txt")]
        ext: String,
    },
    /// Compute a single trace and print its diagnostics
    Compute(ComputeArgs),
    /// Replay a session script and print the resulting chart
    Run {
        /// Path to the session script YAML file
        script: PathBuf,
        /// Workbench configuration YAML file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct ComputeArgs {
    /// Mass in kg
    #[arg(long)]
    mass: f64,
    /// Domain start in seconds
    #[arg(long, default_value_t = 0.0)]
    min_x: f64,
    /// Domain end in seconds
    #[arg(long)]
    max_x: f64,
    /// Initial velocity in m/s
    #[arg(long, default_value_t = 0.0)]
    init_v: f64,
    /// Step size in seconds
    #[arg(long)]
    step: f64,
    /// Integration scheme (euler, heun, rk4)
    #[arg(long, default_value = "rk4")]
    integration: String,
    /// Interpolation scheme (linear, cubic_spline)
    #[arg(long, default_value = "linear")]
    interpolation: String,
    /// Inertia model (point_mass, solid_sphere, hollow_sphere, solid_cylinder, hollow_cylinder)
    #[arg(long, default_value = "point_mass")]
    inertia: String,
    /// YAML file with the track as a list of [x, y] pairs (flat track if omitted)
    #[arg(long)]
    track: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
    /// Include the channel data in JSON output
    #[arg(long)]
    channels: bool,
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Files { folder, ext } => cmd_files(&folder, &ext),
        Commands::Compute(args) => cmd_compute(&args),
        Commands::Run {
            script,
            config,
            json,
        } => cmd_run(&script, config.as_deref(), json),
    }
}

fn cmd_files(folder: &Path, ext: &str) -> AppResult<()> {
    let files = list_available_files(folder, ext)?;
    if files.is_empty() {
        println!("No .{} files in {}", ext.trim_start_matches('.'), folder.display());
    } else {
        for file in files {
            println!("  {}", file.name());
        }
    }
    Ok(())
}

fn load_samples(path: &Path) -> AppResult<Vec<Sample>> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let pairs: Vec<[f64; 2]> = serde_yaml::from_str(&content).map_err(|source| AppError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(pairs.into_iter().map(|[x, y]| Sample::new(x, y)).collect())
}

#[derive(Serialize)]
struct ComputeSummary<'a> {
    interpolation: &'a str,
    integration: &'a str,
    step_size: f64,
    iterations: usize,
    total_time: f64,
    compute_time: f64,
    energy_difference: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<&'a kt_model::Channels>,
}

fn cmd_compute(args: &ComputeArgs) -> AppResult<()> {
    let mut config = TraceConfig {
        integration: Some(Integration::parse_choice(&args.integration)?),
        interpolation: Some(Interpolation::parse_choice(&args.interpolation)?),
        inertia: Some(Inertia::parse_choice(&args.inertia)?),
        mass: Some(args.mass),
        min_x: Some(args.min_x),
        max_x: Some(args.max_x),
        init_v: Some(args.init_v),
        step: Some(args.step),
        ..TraceConfig::named("cli")
    };

    let tracks: Box<dyn TrackLoader> = match &args.track {
        Some(path) => {
            let mut tracks = MemoryTracks::new();
            tracks.insert(path.clone(), load_samples(path)?);
            config.file = Some(SourceFile::new(path.clone()));
            Box::new(tracks)
        }
        None => Box::new(NoTracks),
    };

    let outcome = integrate(&config, tracks.as_ref()).map_err(|err| match err {
        kt_sim::SimError::Config(source) => AppError::Config {
            trace: config.name.clone(),
            source,
        },
        other => AppError::Simulation(other),
    })?;

    if args.json {
        print_json(&summary(&outcome, args.channels))?;
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn summary(outcome: &TraceOutcome, with_channels: bool) -> ComputeSummary<'_> {
    ComputeSummary {
        interpolation: &outcome.interpolation_label,
        integration: &outcome.integration_label,
        step_size: outcome.step_size,
        iterations: outcome.iterations,
        total_time: outcome.total_time,
        compute_time: outcome.compute_time,
        energy_difference: outcome.energy_difference,
        channels: with_channels.then_some(&outcome.channels),
    }
}

fn print_outcome(outcome: &TraceOutcome) {
    println!("✓ Trace computed");
    println!("  Interpolation:     {}", outcome.interpolation_label);
    println!("  Integration:       {}", outcome.integration_label);
    println!("  Step size:         {} s", outcome.step_size);
    println!("  Iterations:        {}", outcome.iterations);
    println!("  Simulated time:    {} s", outcome.total_time);
    println!("  Compute time:      {:.3} ms", outcome.compute_time * 1e3);
    println!("  Energy difference: {:.6e} J", outcome.energy_difference);
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InvalidInput(format!("cannot encode output: {e}")))?;
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct RunOutput<'a> {
    report: &'a kt_app::ScriptReport,
    traces: Vec<TraceSummary>,
    chart: &'a kt_app::Chart,
}

#[derive(Serialize)]
struct TraceSummary {
    name: String,
    diagnostics: Option<kt_model::TraceDiagnostics>,
}

fn cmd_run(script_path: &Path, config_path: Option<&Path>, json: bool) -> AppResult<()> {
    let config = match config_path {
        Some(path) => WorkbenchConfig::load(path)?,
        None => WorkbenchConfig::default(),
    };
    let script = Script::load(script_path)?;
    debug!(
        actions = script.actions.len(),
        tracks = script.tracks.len(),
        "replaying script"
    );
    let mut workbench = Workbench::new(config, Arc::new(script.track_loader()))?;
    let report = script.run(&mut workbench)?;

    let traces: Vec<TraceSummary> = workbench
        .traces()
        .iter()
        .map(|t| TraceSummary {
            name: t.name().to_string(),
            diagnostics: t.diagnostics().cloned(),
        })
        .collect();

    if json {
        return print_json(&RunOutput {
            report: &report,
            traces,
            chart: workbench.chart(),
        });
    }

    println!("Replayed {} action(s) from {}", report.executed, script_path.display());
    for error in &report.errors {
        println!("  ✗ step {} ({}): {}", error.step, error.action, error.message);
    }

    println!("Traces:");
    for trace in &traces {
        match &trace.diagnostics {
            Some(d) => println!(
                "  {} - {} / {}, {} iterations, ΔE = {:.6e} J",
                trace.name,
                d.integration_label,
                d.interpolation_label,
                d.iterations,
                d.energy_difference
            ),
            None => println!("  {} - not computed", trace.name),
        }
    }

    let chart = workbench.chart();
    println!("Chart: {}", chart.settings.title);
    for series in &chart.series {
        println!(
            "  {} {} ({} points{})",
            series.color,
            series.name,
            series.points.len(),
            if series.visible { "" } else { ", hidden" }
        );
    }

    let stats = workbench.dispatch_stats();
    println!(
        "Computed {} trace(s) in {:.3} ms total",
        stats.completed,
        stats.total_compute_s * 1e3
    );
    Ok(())
}
