//! Pump Diagnosis - Command Line Entry Point

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use diagnosis::{
    init_logging, ClassifierConfig, DelimitedSource, DiagnosisConfig, DiagnosisError,
    DiagnosisPipeline, Layout, LogFormat, Signal, SyntheticSource, WaveformSource,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum Output {
    /// Verdict, key statistics and features
    #[default]
    Report,
    /// Everything, including waveform, spectrum and time-frequency arrays
    Full,
    /// Feature vector under the configured vibration schema
    Features,
}

#[derive(Parser)]
#[command(
    name = "pump-diagnose",
    version,
    about = "Diagnose pump vibration or acoustic waveforms"
)]
struct Cli {
    /// Waveform files (delimited text); the synthetic reference signal if none given
    inputs: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trained model artifact; selects the model classifier
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Sampling rate of the input files (Hz), overriding the configuration
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Field delimiter of the input files
    #[arg(long, default_value_t = '\t')]
    delimiter: char,

    /// Column holding one sample per row
    #[arg(long, default_value_t = 0, conflicts_with = "row")]
    column: usize,

    /// Read the waveform from this row instead, dropping its trailing label column
    #[arg(long)]
    row: Option<usize>,

    /// Inputs have a header line
    #[arg(long)]
    headers: bool,

    #[arg(long, value_enum, default_value_t = Output::Report)]
    output: Output,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn source(&self, path: &Path, sample_rate: f64) -> Result<DelimitedSource> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character");
        }
        let layout = match self.row {
            Some(index) => Layout::Row {
                index,
                drop_last: true,
            },
            None => Layout::Column(self.column),
        };
        Ok(DelimitedSource::new(path, sample_rate)
            .delimiter(self.delimiter as u8)
            .has_headers(self.headers)
            .layout(layout))
    }
}

/// Load through a source, keeping the failure classifiable as a [`DiagnosisError`]
fn load(source: &impl WaveformSource) -> Result<Signal> {
    source
        .load()
        .map_err(|e| anyhow::Error::new(DiagnosisError::from(e)))
}

/// Failure kind of an error chain, `ERROR` when no diagnosis error is inside it
fn error_kind(error: &anyhow::Error) -> &'static str {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DiagnosisError>())
        .map(|d| d.kind().as_str())
        .unwrap_or("ERROR")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(format).map_err(|e| anyhow!("failed to initialise logging: {e}"))?;

    let mut config = DiagnosisConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.model {
        config.classifier = ClassifierConfig::Model { path: path.clone() };
    }
    if let Some(rate) = cli.sample_rate {
        config.sampling_rate = Some(rate);
    }
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!("=== Pump Diagnosis v{} ===", env!("CARGO_PKG_VERSION"));

    let pipeline = Arc::new(DiagnosisPipeline::new(config.clone())?);

    let mut signals: Vec<(String, Result<Signal>)> = Vec::new();
    if cli.inputs.is_empty() {
        info!("No inputs given, diagnosing the synthetic reference signal");
        let signal = load(&SyntheticSource::pump_reference()).context("generating reference signal");
        signals.push(("synthetic".to_string(), signal));
    } else {
        let rate = config
            .sampling_rate
            .ok_or_else(|| anyhow!("a sampling rate is required for file inputs (--sample-rate)"))?;
        for path in &cli.inputs {
            let signal = cli
                .source(path, rate)
                .and_then(|source| load(&source))
                .with_context(|| format!("loading {}", path.display()));
            signals.push((path.display().to_string(), signal));
        }
    }

    let mut tasks = Vec::with_capacity(signals.len());
    for (name, signal) in signals {
        let pipeline = Arc::clone(&pipeline);
        let output = cli.output;
        tasks.push(tokio::task::spawn_blocking(move || {
            let signal = signal?;
            let value = match output {
                Output::Report => serde_json::to_value(pipeline.diagnose(&signal)?.report())?,
                Output::Full => serde_json::to_value(pipeline.diagnose(&signal)?)?,
                Output::Features => {
                    let vector = pipeline.extract_features(&signal)?;
                    json!({
                        "input": name,
                        "schema": vector.schema().name(),
                        "features": vector.named(),
                    })
                }
            };
            Ok::<_, anyhow::Error>(value)
        }));
    }

    let total = tasks.len();
    let mut failures = 0;
    for task in tasks {
        match task.await? {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(e) => {
                failures += 1;
                let kind = error_kind(&e);
                warn!("{:#}", e);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "error": kind, "message": format!("{e:#}") }))?
                );
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {total} inputs failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_failures_keep_their_kind() {
        let missing = DelimitedSource::new("/nonexistent/trace.txt", 1000.0);
        let err = load(&missing).context("loading trace").unwrap_err();
        assert_eq!(error_kind(&err), "SOURCE_UNAVAILABLE");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.1\nnot-a-number\n0.3").unwrap();
        let garbled = DelimitedSource::new(file.path(), 1000.0);
        let err = load(&garbled).context("loading trace").unwrap_err();
        assert_eq!(error_kind(&err), "INVALID_SIGNAL");

        assert_eq!(error_kind(&anyhow!("unrelated")), "ERROR");
    }
}
