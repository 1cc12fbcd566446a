#![deny(warnings)]

mod http;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stress_analyzer_core::config::{
    resolve_bool, resolve_string_with_default, resolve_token, ClassifierConfig, ServiceConfig,
    StdEnv, StorageDir, DEFAULT_AUDIO_DIR, DEFAULT_CLASSIFIER_URL, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_HOST, DEFAULT_PORT, ENV_AUDIO_DIR, ENV_CLASSIFIER_URL, ENV_HOST, ENV_HUGGINGFACE_TOKEN,
    ENV_PORT, ENV_SERIALIZE_CLASSIFIER,
};
use stress_analyzer_core::decode::SymphoniaDecoder;
use stress_analyzer_core::emotion::{
    EmotionClassifier, HuggingFaceClassifier, SerializedClassifier,
};
use stress_analyzer_core::fetch::HttpFetcher;
use stress_analyzer_core::pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stress-analyzer")]
#[command(about = "Speech stress scoring from remote audio (fetch -> decode -> classify -> score)")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `/analyze` over HTTP.
    Serve,
    /// Analyze a single url and print the JSON report.
    Analyze {
        #[arg(long)]
        url: String,
    },
}

#[derive(Args, Debug)]
struct ServiceArgs {
    #[arg(long, env = ENV_HOST, default_value = DEFAULT_HOST, global = true)]
    host: String,

    #[arg(long, env = ENV_PORT, default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    #[arg(long, env = ENV_AUDIO_DIR, default_value = DEFAULT_AUDIO_DIR, global = true)]
    audio_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, global = true)]
    fetch_timeout_secs: u64,

    #[arg(long, global = true)]
    classifier_url: Option<String>,

    #[arg(long, global = true)]
    huggingface_token: Option<String>,

    #[arg(long, global = true)]
    serialize_classifier: Option<bool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let env = StdEnv;
    let cfg = build_config(cli.service, &env)?;

    tracing::info!(
        storage = %cfg.storage.path().display(),
        classifier = %cfg.classifier.endpoint,
        serialize_classifier = cfg.classifier.serialize,
        has_token = cfg.classifier.token.is_some(),
        "config loaded"
    );

    let pipeline = build_pipeline(&cfg)?;

    match cli.command {
        Command::Serve => serve(cfg, pipeline).await,
        Command::Analyze { url } => {
            let report = pipeline.analyze(&url).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn serve(cfg: ServiceConfig, pipeline: Pipeline) -> anyhow::Result<()> {
    let router = http::build_router(http::AppState::new(pipeline));
    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;

    tracing::info!(addr = %cfg.bind, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}

fn build_pipeline(cfg: &ServiceConfig) -> anyhow::Result<Pipeline> {
    let fetcher = HttpFetcher::new(cfg.storage.clone(), cfg.fetch_timeout)
        .context("failed to build http client")?;
    let model = HuggingFaceClassifier::new(&cfg.classifier)
        .context("failed to build classifier client")?;
    let classifier: Arc<dyn EmotionClassifier> = if cfg.classifier.serialize {
        Arc::new(SerializedClassifier::new(model))
    } else {
        Arc::new(model)
    };

    Ok(Pipeline::new(
        Arc::new(fetcher),
        Arc::new(SymphoniaDecoder::new()),
        classifier,
    ))
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(
    args: ServiceArgs,
    env: &impl stress_analyzer_core::config::Env,
) -> anyhow::Result<ServiceConfig> {
    let bind = ServiceConfig::bind_addr(&args.host, args.port)?;
    let storage = StorageDir::new(args.audio_dir)?;
    if args.fetch_timeout_secs == 0 {
        anyhow::bail!("--fetch-timeout-secs must be > 0");
    }

    let classifier = ClassifierConfig {
        endpoint: resolve_string_with_default(
            args.classifier_url,
            ENV_CLASSIFIER_URL,
            env,
            DEFAULT_CLASSIFIER_URL,
        ),
        token: resolve_token(args.huggingface_token, ENV_HUGGINGFACE_TOKEN, env)?,
        serialize: resolve_bool(
            args.serialize_classifier,
            ENV_SERIALIZE_CLASSIFIER,
            env,
            false,
        )?,
    };

    Ok(ServiceConfig {
        bind,
        storage,
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        classifier,
    })
}
