mod error;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use derivative::Derivative;
use futures::FutureExt;
use state::{AppState, SharedState};

/// fishsub-server is the HTTP edge of the fishing-subsidy control plane: it
/// hosts the classify/extract/eligibility pipeline endpoints, the legal-case
/// lookup, and (optionally) the periodic legal-case sync job in-process.
#[derive(Derivative, Parser)]
#[derivative(Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// URL of the postgres database.
    #[derivative(Debug = "ignore")]
    #[clap(long = "database", env = "DATABASE_URL")]
    database_url: url::Url,
    /// The port to listen on for API requests.
    #[clap(long, default_value = "8080", env = "API_PORT")]
    api_port: u16,
    /// S3 bucket backing the object store gateway.
    #[clap(long = "s3-bucket", env = "S3_BUCKET")]
    s3_bucket: String,
    /// Base URL of the GenAI provider.
    #[clap(long = "genai-base-url", env = "GENAI_BASE_URL")]
    genai_base_url: String,
    /// API key for the GenAI provider.
    #[derivative(Debug = "ignore")]
    #[clap(long = "genai-api-key", env = "GENAI_API_KEY")]
    genai_api_key: String,
    /// Base URL of the judicial (DataJud-shaped) API.
    #[clap(long = "datajud-base-url", env = "DATAJUD_BASE_URL")]
    datajud_base_url: String,
    /// API key for the judicial API.
    #[derivative(Debug = "ignore")]
    #[clap(long = "datajud-api-key", env = "DATAJUD_API_KEY")]
    datajud_api_key: String,
    /// Path to the opaque eligibility rules document (spec §4.6).
    #[clap(long = "rules-path", env = "RULES_PATH", default_value = "config/eligibility_rules.txt")]
    rules_path: String,
    /// Whether this instance also runs the periodic legal-case sync job.
    #[clap(long = "run-scheduler", env = "RUN_SCHEDULER")]
    run_scheduler: bool,
    /// Origin to allow in CORS contexts. May be specified multiple times.
    #[clap(long = "allow-origin")]
    allow_origin: Vec<String>,
    /// Size of the classification worker pool (spec §4.4, §6).
    #[clap(long = "max-classify-workers", env = "MAX_CLASSIFY_WORKERS", default_value = "4")]
    max_classify_workers: usize,
    /// Size of the extraction worker pool (spec §4.5, §6).
    #[clap(long = "max-extract-workers", env = "MAX_EXTRACT_WORKERS", default_value = "6")]
    max_extract_workers: usize,
    /// GenAI global concurrency cap (spec §4.1, §6).
    #[clap(long = "ia-max-in-flight", env = "IA_MAX_IN_FLIGHT", default_value = "4")]
    ia_max_in_flight: usize,
    /// Maximum retry attempts for a GenAI call (spec §4.1, §6).
    #[clap(long = "retry-max-attempts", env = "RETRY_MAX_ATTEMPTS", default_value = "3")]
    retry_max_attempts: u32,
    /// Initial backoff, in milliseconds, for the GenAI retry envelope (spec §4.1, §6).
    #[clap(long = "retry-initial-ms", env = "RETRY_INITIAL", default_value = "500")]
    retry_initial_ms: u64,
    /// Maximum backoff, in milliseconds, for the GenAI retry envelope (spec §4.1, §6).
    #[clap(long = "retry-max-ms", env = "RETRY_MAX", default_value = "8000")]
    retry_max_ms: u64,
    /// Per-call deadline, in seconds, for every GenAI invocation (spec §4.1, §6).
    #[clap(long = "ia-timeout-seconds", env = "IA_TIMEOUT_SECONDS", default_value = "30")]
    ia_timeout_seconds: u64,
    /// Number of stale cases selected per sync pass (spec §4.8, §6).
    #[clap(long = "cron-batch-size", env = "CRON_BATCH_SIZE", default_value = "20")]
    cron_batch_size: i64,
    /// Legal-case staleness threshold, in days (spec §4.8).
    #[clap(long = "stale-after-days", env = "STALE_AFTER_DAYS", default_value = "3")]
    stale_after_days: i64,
    /// Outbound rate limit to the judicial API, in requests per minute (spec §4.8, §6).
    #[clap(long = "external-rpm", env = "EXTERNAL_RPM", default_value = "60")]
    external_rpm: u32,
    /// IANA timezone used to align the sync job's midnight trigger (spec §4.8, §6).
    #[clap(long = "sched-timezone", env = "SCHED_TIMEZONE", default_value = "America/Sao_Paulo")]
    sched_timezone: String,
}

impl Args {
    fn pipeline_config(&self) -> fishsub_core::config::PipelineConfig {
        fishsub_core::config::PipelineConfig {
            max_classify_workers: self.max_classify_workers,
            max_extract_workers: self.max_extract_workers,
            ia_max_in_flight: self.ia_max_in_flight,
            ia_timeout: Duration::from_secs(self.ia_timeout_seconds),
            retry_max_attempts: self.retry_max_attempts,
            retry_initial: Duration::from_millis(self.retry_initial_ms),
            retry_max: Duration::from_millis(self.retry_max_ms),
            ..fishsub_core::config::PipelineConfig::default()
        }
    }

    fn scheduler_config(&self) -> fishsub_core::config::SchedulerConfig {
        fishsub_core::config::SchedulerConfig {
            batch_size: self.cron_batch_size,
            stale_after_days: self.stale_after_days,
            external_rpm: self.external_rpm,
            timezone: self.sched_timezone.clone(),
            ..fishsub_core::config::SchedulerConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let args = Args::parse();
    tracing::info!(?args, "started");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async_main(args));
    tracing::info!(?result, "main function completed, shutting down runtime");
    runtime.shutdown_timeout(Duration::from_secs(5));
    result
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.api_port))
        .await
        .context("failed to bind server port")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(args.database_url.as_str())
        .await
        .context("connecting to database")?;

    let store = fishsub_storage::S3ObjectStore::from_env(&args.s3_bucket).await;
    let pipeline_config = args.pipeline_config();
    let scheduler_config = args.scheduler_config();

    let provider = fishsub_genai::HttpGenAiProvider::new(&args.genai_base_url, &args.genai_api_key);
    let genai = fishsub_genai::GenAiGateway::new(provider, &pipeline_config);

    let legal_case_provider: Arc<dyn fishsub_legalcase::LegalCaseProvider> = Arc::new(
        fishsub_legalcase::DataJudGateway::new(&args.datajud_base_url, &args.datajud_api_key),
    );

    let state: SharedState = Arc::new(AppState {
        pool: pool.clone(),
        store: Arc::new(store),
        genai,
        legal_case_provider: legal_case_provider.clone(),
        locks: Arc::new(fishsub_pipeline::DocumentLockRegistry::default()),
        pipeline_config,
        rules_path: args.rules_path,
    });

    let shutdown = tokio::signal::ctrl_c().map(|_| ()).shared();

    let router = routes::build_router(state);
    let api_server = axum::serve(listener, router).with_graceful_shutdown(shutdown.clone());
    let api_server = async move { anyhow::Result::Ok(api_server.await?) };

    let scheduler_fut = if args.run_scheduler {
        fishsub_scheduler::run_forever(
            pool,
            legal_case_provider,
            scheduler_config,
            fishsub_scheduler::SYNC_PERIOD_DAYS,
            shutdown,
        )
        .map(Ok)
        .boxed()
    } else {
        futures::future::ready(Ok(())).boxed()
    };

    let ((), ()) = tokio::try_join!(api_server, scheduler_fut)?;
    Ok(())
}
