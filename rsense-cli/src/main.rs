//! CLI for the rsense sensor-data codecs.
//!
//! Provides commands for converting accelerometer recordings between formats,
//! summarizing them and computing per-window magnitude features.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use rsense::codec::binary::{self, BinarySerializer};
use rsense::codec::json::{self, JsonSerializer};
use rsense::codec::text::{self, TextSerializer};
use rsense::codec::{FileSink, FileSource};
use rsense::feature::{AccelerometerFeature, MagnitudeMaximum, MagnitudeMinimum};
use rsense::{AccelerometerEvent, CodecConfig, Deserializer, Serializer, SlidingWindow};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// rsense - accelerometer recording codecs and windowed features.
#[derive(Parser)]
#[command(name = "rsense", version, about)]
struct Cli {
    /// Codec configuration file (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Re-encode a recording in another format.
    Convert {
        /// Recording to read.
        input: PathBuf,

        /// File to write. Truncated if it exists.
        output: PathBuf,

        /// Format of the input.
        #[arg(long)]
        from: Format,

        /// Format of the output.
        #[arg(long)]
        to: Format,
    },

    /// Print the event count and time span of a recording.
    Inspect {
        /// Recording to read.
        input: PathBuf,

        /// Format of the input.
        #[arg(long)]
        format: Format,
    },

    /// Compute magnitude minimum and maximum per window.
    Features {
        /// Recording to read.
        input: PathBuf,

        /// Format of the input.
        #[arg(long)]
        format: Format,

        /// Samples per window.
        #[arg(long, allow_negative_numbers = true)]
        window: i64,

        /// Output format.
        #[arg(long, default_value = "csv")]
        output: OutputFormat,
    },
}

/// Recording formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Delimited text, one event per line.
    Text,
    /// A single JSON array.
    Json,
    /// Length-delimited protobuf.
    Binary,
}

/// Output format for feature reports.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array of objects.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Convert {
            input,
            output,
            from,
            to,
        } => cmd_convert(&input, &output, from, to, &config),
        Commands::Inspect { input, format } => cmd_inspect(&input, format, &config),
        Commands::Features {
            input,
            format,
            window,
            output,
        } => cmd_features(&input, format, window, &output, &config),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let config = CodecConfig::load(path)?;
    tracing::debug!(path = %path.display(), ?config, "loaded codec config");
    Ok(config)
}

/// Implements `rsense convert`.
fn cmd_convert(
    input: &Path,
    output: &Path,
    from: Format,
    to: Format,
    config: &CodecConfig,
) -> CliResult<()> {
    let writer = EventWriter::create(to, output, config)?;
    let count = for_each_event(from, input, config, |event| Ok(writer.write(&event)?))?;
    writer.close()?;

    println!(
        "Converted {count} events: {} ({from:?}) -> {} ({to:?})",
        input.display(),
        output.display()
    );
    Ok(())
}

/// Implements `rsense inspect`.
fn cmd_inspect(input: &Path, format: Format, config: &CodecConfig) -> CliResult<()> {
    let mut first: Option<i64> = None;
    let mut last: Option<i64> = None;
    let mut with_relative = 0u64;

    let count = for_each_event(format, input, config, |event| {
        let ts = event.absolute_timestamp();
        first = Some(first.map_or(ts, |f| f.min(ts)));
        last = Some(last.map_or(ts, |l| l.max(ts)));
        if event.has_relative_timestamp() {
            with_relative += 1;
        }
        Ok(())
    })?;

    println!("Recording: {}", input.display());
    println!("  Format: {format:?}");
    println!("  Events: {count}");
    println!("  With relative timestamp: {with_relative}");
    match (first, last) {
        (Some(first), Some(last)) => {
            println!("  First timestamp (ms): {first}");
            println!("  Last timestamp (ms): {last}");
            println!("  Span: {}", format_span_ms(last.saturating_sub(first)));
        }
        _ => println!("  Span: n/a"),
    }
    Ok(())
}

/// Implements `rsense features`.
fn cmd_features(
    input: &Path,
    format: Format,
    window: i64,
    output: &OutputFormat,
    config: &CodecConfig,
) -> CliResult<()> {
    if window == 0 {
        return Err("window size must be at least 1".into());
    }

    let mut events = Vec::new();
    for_each_event(format, input, config, |event| {
        events.push(event);
        Ok(())
    })?;
    if events.is_empty() {
        return Err(format!("'{}' contains no events", input.display()).into());
    }

    let spec = SlidingWindow::builder()
        .size(window)?
        .extend(events)
        .build()?;

    let rows = spec
        .windows()
        .enumerate()
        .map(|(index, w)| -> rsense::Result<FeatureRow> {
            Ok(FeatureRow {
                index,
                samples: w.len(),
                start_ms: w[0].absolute_timestamp(),
                min: MagnitudeMinimum.compute(&w)?,
                max: MagnitudeMaximum.compute(&w)?,
            })
        })
        .collect::<rsense::Result<Vec<_>>>()?;

    match output {
        OutputFormat::Csv => {
            println!(
                "window,samples,start_ms,{},{}",
                MagnitudeMinimum.name(),
                MagnitudeMaximum.name()
            );
            for row in &rows {
                println!(
                    "{},{},{},{},{}",
                    row.index, row.samples, row.start_ms, row.min, row.max
                );
            }
        }
        OutputFormat::Json => {
            let json_rows: Vec<serde_json::Value> = rows
                .iter()
                .map(|row| {
                    serde_json::json!({
                        "window": row.index,
                        "samples": row.samples,
                        "start_ms": row.start_ms,
                        (MagnitudeMinimum.name()): row.min,
                        (MagnitudeMaximum.name()): row.max,
                    })
                })
                .collect();

            let output = serde_json::json!({
                "input": input.display().to_string(),
                "window": window,
                "count": rows.len(),
                "windows": json_rows,
            });

            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

struct FeatureRow {
    index: usize,
    samples: usize,
    start_ms: i64,
    min: f32,
    max: f32,
}

/// A serializer for any bundled format, writing to a file.
enum EventWriter {
    Text(TextSerializer<FileSink>),
    Json(JsonSerializer<AccelerometerEvent, FileSink>),
    Binary(BinarySerializer<FileSink>),
}

impl EventWriter {
    fn create(format: Format, path: &Path, config: &CodecConfig) -> rsense::Result<Self> {
        let sink = FileSink::new(path);
        Ok(match format {
            Format::Text => Self::Text(text::serializer(sink, config)?),
            Format::Json => Self::Json(json::serializer(sink, config)?),
            Format::Binary => Self::Binary(binary::serializer(sink, config)?),
        })
    }

    fn write(&self, event: &AccelerometerEvent) -> rsense::Result<()> {
        match self {
            Self::Text(s) => s.serialize(event).map(|_| ()),
            Self::Json(s) => s.serialize(event).map(|_| ()),
            Self::Binary(s) => s.serialize(event).map(|_| ()),
        }
    }

    fn close(&self) -> rsense::Result<()> {
        match self {
            Self::Text(s) => s.close(),
            Self::Json(s) => s.close(),
            Self::Binary(s) => s.close(),
        }
    }
}

/// Streams every event of `path` into `f` and returns how many there were.
fn for_each_event<F>(format: Format, path: &Path, config: &CodecConfig, f: F) -> CliResult<u64>
where
    F: FnMut(AccelerometerEvent) -> CliResult<()>,
{
    let source = FileSource::new(path);
    match format {
        Format::Text => drain(text::deserializer(source, config)?, f),
        Format::Json => drain(json::deserializer::<AccelerometerEvent, _>(source, config)?, f),
        Format::Binary => drain(binary::deserializer(source, config)?, f),
    }
}

fn drain<D, F>(mut deserializer: D, mut f: F) -> CliResult<u64>
where
    D: Deserializer<AccelerometerEvent>,
    F: FnMut(AccelerometerEvent) -> CliResult<()>,
{
    let mut count = 0u64;
    for record in deserializer.deserialize()? {
        f(record?)?;
        count += 1;
    }
    deserializer.close()?;
    Ok(count)
}

/// Formats a millisecond span as a human-readable duration.
#[allow(clippy::cast_precision_loss)] // Spans are display-only
fn format_span_ms(ms: i64) -> String {
    if ms >= 3_600_000 {
        format!("{:.2}h", ms as f64 / 3_600_000.0)
    } else if ms >= 60_000 {
        format!("{:.2}m", ms as f64 / 60_000.0)
    } else if ms >= 1_000 {
        format!("{:.2}s", ms as f64 / 1_000.0)
    } else {
        format!("{ms}ms")
    }
}
