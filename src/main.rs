//! migration-resilience
//!
//! Command-line front end for the resilience pipeline.
//!
//! # Commands
//!
//! ```text
//! check   <config>                        load + validate a config file
//! explain <config> <METHOD> <PATH>        show classification and layer order
//! send    <config> <URL> [--method]       perform one request through the pipeline
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use http::Method;

use migration_resilience::config::{load_config, ConfigError, ResilienceConfig};
use migration_resilience::http::{classify, ReqwestTransport};
use migration_resilience::lifecycle::Cancellation;
use migration_resilience::observability::logging::init_logging;
use migration_resilience::pipeline::{CachedPipelineBuilder, PipelineBuilder, PolicyPipeline};

#[derive(Parser)]
#[command(name = "migration-resilience")]
#[command(about = "Resilience policy pipeline for content migration traffic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a config file
    Check { config: PathBuf },
    /// Show how a request would be classified and which layers wrap it
    Explain {
        config: PathBuf,
        method: Method,
        path: String,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one request through the pipeline
    Send {
        config: PathBuf,
        url: String,
        #[arg(short, long, default_value = "GET")]
        method: Method,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Explain {
            config,
            method,
            path,
            json,
        } => explain(&config, method, &path, json),
        Commands::Send {
            config,
            url,
            method,
        } => send(&config, method, &url).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &std::path::Path) -> Result<ResilienceConfig, Box<dyn std::error::Error>> {
    match load_config(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("  - {error}");
            }
            Err(format!("{} validation error(s) in {}", errors.len(), path.display()).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn check(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    load(path)?;
    println!("{}: ok", path.display());
    Ok(())
}

fn explain(
    path: &std::path::Path,
    method: Method,
    request_path: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(path)?;
    let class = classify(&method, request_path);
    let composed = PipelineBuilder::new(config).get_policies_for(class);

    if json {
        let layers: Vec<_> = composed
            .layers()
            .iter()
            .map(|layer| {
                serde_json::json!({
                    "kind": layer.kind().as_str(),
                    "params": layer.describe(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "method": method.as_str(),
            "path": request_path,
            "is_write": class.is_write,
            "is_file_transfer": class.is_file_transfer,
            "layers": layers,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{method} {request_path}");
    println!(
        "  traffic: {}  transfer: {}",
        class.traffic(),
        class.transfer()
    );
    for (depth, layer) in composed.layers().iter().enumerate() {
        println!("  {}{} ({})", "  ".repeat(depth), layer.kind(), layer.describe());
    }
    println!("  {}send", "  ".repeat(composed.layers().len()));
    Ok(())
}

async fn send(
    path: &std::path::Path,
    method: Method,
    url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(path)?;
    init_logging(&config.observability.log_level);

    let pipeline = CachedPipelineBuilder::new(config);
    let transport = ReqwestTransport::default();
    let request = http::Request::builder()
        .method(method)
        .uri(url)
        .body(Bytes::new())?;

    let cancellation = Cancellation::new();
    let on_signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling request");
            on_signal.cancel();
        }
    });

    let composed = pipeline.get_policies(&request);
    tracing::info!(layers = ?composed.kinds(), "Sending request");
    let response = composed
        .execute(&transport, &request, &cancellation)
        .await?;

    println!("{}", response.status());
    println!("{}", String::from_utf8_lossy(response.body()));
    Ok(())
}
