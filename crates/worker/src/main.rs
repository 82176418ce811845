use clap::Parser;
use fitcast_core::config::{RunConfig, Settings};
use fitcast_core::ingest::closet::HttpClosetStore;
use fitcast_core::ingest::open_meteo::OpenMeteoClient;
use fitcast_core::llm::anthropic::AnthropicClient;
use fitcast_core::llm::error::LlmDiagnosticsError;
use fitcast_core::notify::sms::{HttpSmsGateway, Messenger, NoopMessenger};
use fitcast_core::pipeline::{self, Collaborators, RunOptions};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fitcast_worker")]
struct Args {
    /// Do everything except sending the SMS and writing history.
    #[arg(long)]
    dry_run: bool,

    /// Record the outfit in history but skip the SMS send.
    #[arg(long)]
    skip_sms: bool,

    /// Override HISTORY_LOOKBACK_DAYS for this run.
    #[arg(long)]
    lookback_days: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let mut config = RunConfig::from_env();
    if let Some(days) = args.lookback_days {
        config.lookback_days = days;
    }

    let messenger: Box<dyn Messenger> = if args.dry_run || args.skip_sms {
        Box::new(NoopMessenger)
    } else {
        Box::new(HttpSmsGateway::from_settings(&settings)?)
    };

    let deps = Collaborators {
        weather: Box::new(OpenMeteoClient::new(&config)?),
        store: Box::new(HttpClosetStore::from_settings(&settings, &config)?),
        generator: Box::new(AnthropicClient::from_settings(&settings)?),
        messenger,
    };

    let options = RunOptions {
        dry_run: args.dry_run,
        skip_sms: args.skip_sms,
    };

    match pipeline::run(&deps, &config, options).await {
        Ok(outcome) => {
            tracing::info!(
                sms_sent = outcome.sms_sent,
                rules_pass = outcome.report.pass,
                chars = outcome.recommendation.chars().count(),
                "daily outfit run complete"
            );
            if !outcome.report.pass {
                let failing: Vec<&str> = outcome.report.failing().map(|s| s.name).collect();
                tracing::warn!(?failing, "delivered with failing rule checks");
            }
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                tracing::error!(
                    provider = ?diag.provider,
                    stage = diag.stage,
                    error = %err,
                    "daily outfit run failed in generation"
                );
            } else {
                tracing::error!(error = %err, "daily outfit run failed");
            }
            Err(err)
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
