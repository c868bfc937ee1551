use clap::Parser;
use startup_smoke_producer::kafka::KafkaProducer;
use startup_smoke_producer::properties::{EnvSource, FileSource, LayeredSource, MapSource};
use startup_smoke_producer::startup::{keep_alive, run_from, StartupRun};
use startup_smoke_producer::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "startup-smoke-producer")]
#[command(about = "Sends one smoke message to Kafka on startup", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", help = "Optional configuration file (toml, yaml, json, ini)")]
    config: Option<PathBuf>,

    #[arg(
        short = 'p',
        long = "property",
        value_name = "KEY=VALUE",
        help = "Property override, e.g. -p app.topic=outbox.events.test"
    )]
    properties: Vec<String>,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    info!("Starting startup-smoke-producer");

    let run = match build_sources(&args) {
        Ok(sources) => {
            debug!(layers = ?sources.layer_names(), "Configuration sources");
            run_from(&sources, |config| {
                KafkaProducer::new(&config.kafka, config.ack_timeout)
            })
            .await
        }
        Err(e) => StartupRun::failed(e),
    };

    let code = match run.outcome.exit_code() {
        Some(code) => code,
        None => idle().await,
    };

    std::process::exit(run.shutdown(code));
}

/// Command line overrides take precedence over the environment, which takes
/// precedence over the configuration file.
fn build_sources(args: &Args) -> Result<LayeredSource> {
    let cli = MapSource::from_assignments("command-line", &args.properties)?;
    let mut sources = LayeredSource::new().with(cli).with(EnvSource::from_process());

    if let Some(path) = &args.config {
        let file = FileSource::from_file(path)?;
        info!("Loaded configuration from {}", file.path().display());
        sources = sources.with(file);
    }

    Ok(sources)
}

async fn idle() -> i32 {
    match keep_alive().await {
        Err(Error::Shutdown) => {
            info!("Shutdown requested");
            0
        }
        Err(e) => {
            error!("Failed to wait for shutdown signal: {}", e);
            1
        }
        Ok(()) => 0,
    }
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("startup_smoke_producer=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("startup_smoke_producer=info,warn"))
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
