//! BEATwatch CLI
//!
//! Parse, slice and plot recordings from the BEATwatch wearable.

use anyhow::{bail, Context, Result};
use beatwatch_process::{
    config::Config,
    core::{select_period, summarize, Period},
    parser::{FileBundle, Parser as FileParser},
    plot::{render_series, TimeAxis},
    record::Timestamp,
    transparency::ParseReport,
    VERSION,
};
use chrono::{DateTime, Duration};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beatwatch")]
#[command(version = VERSION)]
#[command(about = "Parse and inspect BEATwatch recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads a recording.
#[derive(Args)]
struct ParseArgs {
    /// Recording to read
    file: PathBuf,

    /// Timezone of the recording (IANA name or UTC)
    #[arg(long)]
    timezone: Option<String>,

    /// File format version written by the device
    #[arg(long)]
    format_version: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Hr,
    Accel,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a recording and print it as JSON
    Parse {
        #[command(flatten)]
        args: ParseArgs,

        /// Write the JSON to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Select a time window from a recording
    Select {
        #[command(flatten)]
        args: ParseArgs,

        /// Window start (RFC 3339, or seconds with --relative)
        #[arg(long)]
        start: Option<String>,

        /// Window end (RFC 3339, or seconds with --relative)
        #[arg(long)]
        end: Option<String>,

        /// Window length in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Bounds are seconds since the record start
        #[arg(long)]
        relative: bool,
    },

    /// Print descriptive statistics of a recording
    Summary {
        #[command(flatten)]
        args: ParseArgs,
    },

    /// Plot one column of a table as SVG
    Plot {
        #[command(flatten)]
        args: ParseArgs,

        /// Table to plot
        #[arg(long, value_enum)]
        table: Table,

        /// Column to plot
        #[arg(long)]
        column: String,

        /// Use time_elapsed on the x axis
        #[arg(long)]
        relative: bool,

        /// Output SVG file
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { args, output } => cmd_parse(&args, output.as_deref()),
        Commands::Select {
            args,
            start,
            end,
            duration,
            relative,
        } => cmd_select(&args, start, end, duration, relative),
        Commands::Summary { args } => cmd_summary(&args),
        Commands::Plot {
            args,
            table,
            column,
            relative,
            output,
        } => cmd_plot(&args, table, &column, relative, &output),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(args: &ParseArgs) -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {}", e);
        Config::default()
    });
    if let Some(timezone) = &args.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(version) = args.format_version {
        config.format_version = version;
    }
    config
}

fn parse(args: &ParseArgs, config: &Config) -> Result<(FileParser, FileBundle, ParseReport)> {
    let parser = config.parser()?;
    let (bundle, report) = parser.parse_file_with_report(&args.file);
    if report.io_failed {
        bail!("could not read {}", args.file.display());
    }
    Ok((parser, bundle, report))
}

fn print_bundle(bundle: &FileBundle, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(bundle).context("serializing bundle")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_parse(args: &ParseArgs, output: Option<&Path>) -> Result<()> {
    let config = load_config(args);
    let (_, bundle, report) = parse(args, &config)?;

    print_bundle(&bundle, output)?;
    eprintln!("{}", report.summary());
    Ok(())
}

fn seconds(value: f64) -> Result<Duration> {
    if !value.is_finite() {
        bail!("invalid number of seconds: {value}");
    }
    Duration::try_milliseconds((value * 1000.0).round() as i64)
        .with_context(|| format!("{value} seconds is out of range"))
}

fn relative_bound(value: &str) -> Result<Duration> {
    let secs: f64 = value
        .parse()
        .with_context(|| format!("expected seconds, got {value:?}"))?;
    seconds(secs)
}

fn absolute_bound(value: &str, parser: &FileParser) -> Result<Timestamp> {
    let time = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("expected an RFC 3339 timestamp, got {value:?}"))?;
    Ok(time.with_timezone(&parser.timezone()))
}

fn cmd_select(
    args: &ParseArgs,
    start: Option<String>,
    end: Option<String>,
    duration: Option<f64>,
    relative: bool,
) -> Result<()> {
    let config = load_config(args);
    let (parser, bundle, _) = parse(args, &config)?;
    let duration = duration.map(seconds).transpose()?;

    let selected = if relative {
        let period = Period {
            time_start: start.as_deref().map(relative_bound).transpose()?,
            time_end: end.as_deref().map(relative_bound).transpose()?,
            duration,
        };
        select_period(&bundle, &period)?
    } else {
        let period = Period {
            time_start: start
                .as_deref()
                .map(|s| absolute_bound(s, &parser))
                .transpose()?,
            time_end: end
                .as_deref()
                .map(|s| absolute_bound(s, &parser))
                .transpose()?,
            duration,
        };
        select_period(&bundle, &period)?
    };

    print_bundle(&selected, None)
}

fn cmd_summary(args: &ParseArgs) -> Result<()> {
    let config = load_config(args);
    let (_, bundle, report) = parse(args, &config)?;

    println!("BEATwatch recording {}", args.file.display());
    println!();
    for (key, value) in bundle.metadata.iter() {
        println!("  {key}: {value}");
    }
    println!();
    print!("{}", summarize(&bundle).render());
    println!();
    println!("{}", report.summary());
    Ok(())
}

fn cmd_plot(
    args: &ParseArgs,
    table: Table,
    column: &str,
    relative: bool,
    output: &Path,
) -> Result<()> {
    let config = load_config(args);
    let (_, bundle, _) = parse(args, &config)?;
    let axis = if relative {
        TimeAxis::Elapsed
    } else {
        TimeAxis::Absolute
    };

    match table {
        Table::Hr => {
            let samples = bundle.hr.context("recording has no hr table")?;
            render_series(&samples, column, axis, output, config.plot_size())?;
        }
        Table::Accel => {
            let samples = bundle.accel.context("recording has no accel table")?;
            render_series(&samples, column, axis, output, config.plot_size())?;
        }
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
