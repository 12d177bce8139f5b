#![warn(
    rust_2024_compatibility,
    clippy::all,
    clippy::future_not_send,
    clippy::mod_module_files,
    clippy::needless_pass_by_ref_mut,
    clippy::unused_async
)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_sdk::{resource::Resource, trace as sdktrace};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use goproxy::GoproxyClient;
use goproxy::config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(author, version, about = "Query a GOPROXY module proxy for published versions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the published versions of a Go module
    Versions {
        /// Module path, e.g. github.com/spf13/cobra
        module: String,
        /// Path to the configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Proxy specification (overrides GOPROXY and the config file)
        #[arg(long)]
        proxy: Option<String>,
        /// Print only the highest version
        #[arg(long)]
        latest: bool,
    },
    /// Show which proxy endpoint would be queried
    Resolve {
        /// Path to the configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Proxy specification (overrides GOPROXY and the config file)
        #[arg(long)]
        proxy: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Versions {
            module,
            config,
            proxy,
            latest,
        } => run_versions(config, proxy, module, latest),
        Command::Resolve { config, proxy } => run_resolve(config, proxy),
    }
}

/// Configuration plus the path that was looked for but not found, if any.
///
/// The missing path is reported after tracing is initialized, since the
/// logging settings themselves come from this file.
struct Loaded {
    config: Config,
    missing: Option<PathBuf>,
}

fn load_config(config_path: PathBuf, proxy: Option<String>) -> Result<Loaded> {
    let (mut config, missing) = match Config::read(&config_path).context("loading configuration")? {
        Some(config) => (config, None),
        None => (Config::default(), Some(config_path)),
    };
    let env_spec = std::env::var("GOPROXY").ok().filter(|spec| !spec.is_empty());
    if let Some(spec) = proxy.or(env_spec) {
        config.goproxy.proxy = spec;
    }
    config.validate().context("validating configuration")?;
    Ok(Loaded { config, missing })
}

fn start(config_path: PathBuf, proxy: Option<String>) -> Result<Config> {
    let Loaded { config, missing } = load_config(config_path, proxy)?;
    init_tracing(&config)?;
    if let Some(path) = missing {
        tracing::warn!(
            path = %path.display(),
            "configuration file not found, using defaults"
        );
    }
    Ok(config)
}

fn run_versions(
    config_path: PathBuf,
    proxy: Option<String>,
    module: String,
    latest: bool,
) -> Result<()> {
    let config = start(config_path, proxy)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("constructing runtime")?;

    let versions = rt.block_on(async {
        let endpoint = config.goproxy.endpoint()?;
        let Some(client) = GoproxyClient::from_endpoint(&endpoint, &config.goproxy)? else {
            bail!("GOPROXY is set to direct/off; there is no proxy to query");
        };

        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling");
                on_signal.cancel();
            }
        });

        client
            .get_versions(&cancel, &module)
            .await
            .with_context(|| format!("listing versions of {module}"))
    })?;

    if latest {
        if let Some(version) = versions.latest() {
            println!("{version}");
        }
    } else {
        for version in &versions {
            println!("{version}");
        }
    }

    Ok(())
}

fn run_resolve(config_path: PathBuf, proxy: Option<String>) -> Result<()> {
    let config = start(config_path, proxy)?;
    let endpoint = config
        .goproxy
        .endpoint()
        .context("resolving proxy specification")?;

    println!("{endpoint}");
    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
        .context("building log filter")?;

    let with_target = config.logging.with_target;
    let fmt_layer = if config.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(with_target)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(with_target)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        use opentelemetry_otlp::WithExportConfig;

        let resource = Resource::builder_empty()
            .with_attributes([
                KeyValue::new("service.name", "goproxy"),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ])
            .build();

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()?;

        let provider = sdktrace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build();

        let tracer = provider.tracer("goproxy");
        global::set_tracer_provider(provider);

        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()?;
    } else {
        registry.try_init()?;
    }
    Ok(())
}
