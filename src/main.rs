//! Covirisk: COVID-19 risk prediction
//!
//! Command-line entry point.
//!
//! ```bash
//! covirisk [--artifact <path>] [--model <name>] models
//! covirisk [--artifact <path>] [--model <name>] predict <form.json | ->
//! covirisk [--artifact <path>] [--model <name>] batch <in.csv> <out.csv>
//! ```

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use covirisk::adapters::sanitize::SanitizingMakeWriter;
use covirisk::adapters::{ArtifactLoader, CsvTable};
use covirisk::config::Config;
use covirisk::domain::PatientForm;
use covirisk::{BatchPredictor, PredictionService};

enum Command {
    Models,
    Predict(String),
    Batch(PathBuf, PathBuf),
}

fn usage() -> String {
    "Usage: covirisk [--artifact <path>] [--model <name>] \
     (models | predict <form.json|-> | batch <in.csv> <out.csv>)"
        .to_string()
}

fn parse_args(config: &mut Config) -> Result<Command, String> {
    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--artifact" => {
                let v = args.next().ok_or_else(usage)?;
                config.artifact_path = PathBuf::from(v);
            }
            "--model" => {
                config.model_name = Some(args.next().ok_or_else(usage)?);
            }
            "-h" | "--help" => return Err(usage()),
            _ if arg.starts_with("--") => return Err(format!("Unknown flag {arg}\n{}", usage())),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("models") => Command::Models,
        Some("predict") => Command::Predict(positional.next().ok_or_else(usage)?),
        Some("batch") => {
            let input = positional.next().ok_or_else(usage)?;
            let output = positional.next().ok_or_else(usage)?;
            Command::Batch(input.into(), output.into())
        }
        _ => return Err(usage()),
    };

    if positional.next().is_some() {
        return Err(usage());
    }
    Ok(command)
}

fn init_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let interactive = std::io::stdout().is_terminal();

    let (writer, guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: a missing directory surfaces when opening the file.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(writer, config.sanitize_max_bytes)),
        )
        .init();

    Ok(guard)
}

fn read_form(source: &str) -> Result<PatientForm> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read form from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))?
    };
    serde_json::from_str(&text).context("Form is not valid JSON")
}

fn service(config: &Config) -> Result<PredictionService> {
    let bundle = ArtifactLoader::new(config.require_manifest)
        .load(&config.artifact_path)
        .with_context(|| format!("Failed to load artifact {:?}", config.artifact_path))?;
    let bundle = Arc::new(bundle);

    let service = match &config.model_name {
        Some(name) => PredictionService::with_model(bundle, name)?,
        None => PredictionService::new(bundle)?,
    };
    Ok(service)
}

fn main() -> Result<()> {
    let mut config = Config::from_env();
    let command = match parse_args(&mut config) {
        Ok(c) => c,
        Err(msg) => bail!(msg),
    };

    let _guard = init_logging(&config)?;
    tracing::info!("Starting Covirisk...");

    let service = service(&config)?;

    match command {
        Command::Models => {
            for name in service.bundle().model_names() {
                let marker = if name == service.model_name() { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        Command::Predict(source) => {
            let record = read_form(&source)?.into_record();
            let prediction = service.predict_one(&record)?;

            println!("Model:      {}", service.model_name());
            println!("Prediction: {} ({})", prediction.label, prediction.label.description());
            match (prediction.risk_percent(), prediction.recovery_percent()) {
                (Some(risk), Some(recovery)) => {
                    println!("Risk:       {risk:.2}%");
                    println!("Recovery:   {recovery:.2}%");
                }
                _ => println!("Probability not available for this model"),
            }
        }
        Command::Batch(input, output) => {
            let rows = BatchPredictor::new(service, CsvTable::new()).run(&input, &output)?;
            println!("Annotated {rows} rows into {}", output.display());
        }
    }

    tracing::info!("Covirisk finished.");
    Ok(())
}
