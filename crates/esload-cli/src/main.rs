use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use esload_common::config::{FailurePolicy, LoadConfig};
use esload_core::{Coordinator, RunReport};
use esload_elastic::ElasticSubmitter;
use esload_submitter::{mock::MockSubmitter, DocumentSubmitter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "esload", version, about = "Concurrent document-indexing load generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit `quota` documents keeping `pool-size` requests in flight
    Run(RunArgs),
    /// Print the version reported by the target cluster
    Info(InfoArgs),
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(short = 'c', long)]
    pool_size: Option<usize>,
    #[arg(short = 'n', long)]
    quota: Option<u64>,
    /// Cluster address; repeat to rotate across several nodes
    #[arg(short, long = "address")]
    addresses: Vec<String>,
    #[arg(short, long)]
    index: Option<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    abort_on_transport_error: bool,
    #[arg(long)]
    no_refresh: bool,
    /// Dry run against an in-process submitter
    #[arg(long)]
    mock: bool,
}

impl RunArgs {
    fn apply(&self, mut cfg: LoadConfig) -> LoadConfig {
        if let Some(v) = self.pool_size { cfg.pool_size = v; }
        if let Some(v) = self.quota { cfg.quota = v; }
        if !self.addresses.is_empty() { cfg.addresses = self.addresses.clone(); }
        if let Some(v) = &self.index { cfg.index = v.clone(); }
        if let Some(v) = self.timeout_ms { cfg.submit_timeout_ms = Some(v); }
        if self.abort_on_transport_error { cfg.failure_policy = FailurePolicy::Abort; }
        if self.no_refresh { cfg.refresh = false; }
        cfg
    }
}

#[derive(Args, Debug)]
struct InfoArgs {
    #[arg(short, long = "address")]
    addresses: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Info(args) => info(args).await?,
        Commands::Version => println!("{}", env!("CARGO_PKG_VERSION")),
    }
    Ok(())
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = args.apply(LoadConfig::load());
    cfg.validate()?;
    println!("stress test on index '{}' is starting! hit ctrl+c to stop it!", cfg.index);

    let report = if args.mock {
        drive(Arc::new(MockSubmitter::new()), &cfg).await?
    } else {
        drive(Arc::new(ElasticSubmitter::from_config(&cfg)?), &cfg).await?
    };

    println!("Stress test finished");
    println!("Current test lasted for {:?}", report.elapsed);
    println!(
        "{} submitted: {} succeeded, {} failed ({} transport), {:.1} docs/s",
        report.attempted, report.succeeded, report.failed, report.transport_failures, report.throughput()
    );
    if report.interrupted {
        println!("interrupted with {} documents left", report.remaining);
    }
    Ok(())
}

async fn drive<S: DocumentSubmitter + 'static>(submitter: Arc<S>, cfg: &LoadConfig) -> esload_common::Result<RunReport> {
    let coordinator = Coordinator::from_config(submitter, cfg)?;
    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        }
    });
    coordinator.run().await
}

async fn info(args: InfoArgs) -> anyhow::Result<()> {
    let mut cfg = LoadConfig::load();
    if !args.addresses.is_empty() { cfg.addresses = args.addresses; }
    let es = ElasticSubmitter::from_config(&cfg)?;
    let version = es.info().await?;
    println!("{} -> elasticsearch {}", es.addresses().join(", "), version);
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    let Err(env_filter) = init_otlp(env_filter) else { return };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Installs the subscriber with an OTLP layer when an exporter endpoint is configured.
/// Hands the filter back when it did not.
#[cfg(feature = "otlp")]
fn init_otlp(env_filter: EnvFilter) -> Result<(), EnvFilter> {
    use opentelemetry_otlp::WithExportConfig;
    use tracing_opentelemetry::OpenTelemetryLayer;

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else { return Err(env_filter) };
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .install_simple();
    match tracer {
        Ok(tracer) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(OpenTelemetryLayer::new(tracer))
                .init();
            Ok(())
        }
        Err(_) => Err(env_filter),
    }
}

#[cfg(not(feature = "otlp"))]
fn init_otlp(env_filter: EnvFilter) -> Result<(), EnvFilter> { Err(env_filter) }
