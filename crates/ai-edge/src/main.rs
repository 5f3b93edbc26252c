//! Entry point for the `ai-interview-admin` binary: serves the HTTP API by
//! default, or dispatches to one of the administrative subcommands. Wiring
//! follows `skynet-gateway::main`'s config-load / tracing-init / build-router
//! / `axum::serve` shape, extended with a `clap` subcommand dispatch the
//! teacher's single-purpose binary never needed.

mod app;
mod cli;
mod error;
mod http;
mod notify;

use std::net::SocketAddr;
use std::sync::Arc;

use ai_coderunner::CodeRunner;
use ai_core::civiltime::parse_timezone;
use ai_core::config::Config;
use ai_directory::Directory;
use ai_evaluation::EvaluationManager;
use ai_gateway::{AiGateway, FakeAsr, FakeLlm, FakeTts};
use ai_proctor::{evidence::LoggingEvidenceSink, ProctorRegistry};
use ai_scheduler::SchedulerManager;
use ai_sessions::SessionManager;
use ai_token::{GraceWindow, TokenService};
use clap::Parser;
use rusqlite::Connection;
use tracing::info;

use crate::app::AppState;
use crate::notify::LogNotificationSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "ai_edge=info,tower_http=debug".into()),
        )
        .init();

    let config_path = std::env::var("AI_INTERVIEW_CONFIG").ok();
    let config = Config::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({e}), using defaults");
        Config::default()
    });

    let cli = cli::Cli::parse();
    let state = Arc::new(build_state(config)?);

    match cli.command {
        Some(command) => cli::dispatch(command, &state).await,
        None => serve(state).await,
    }
}

fn build_state(config: Config) -> anyhow::Result<AppState> {
    let db_path = config.database.path.clone();
    let open = || -> anyhow::Result<Connection> { Ok(Connection::open(&db_path)?) };

    let tz = parse_timezone(&config.interview_timezone)?;
    let grace = GraceWindow {
        early_grace_secs: config.link_early_grace_seconds,
        late_grace_secs: config.link_late_grace_seconds,
    };

    let directory = Arc::new(Directory::new(open()?)?);
    let tokens = Arc::new(TokenService::new(config.interview_link_secret.clone(), grace));
    let scheduler = Arc::new(SchedulerManager::new(
        open()?,
        directory.clone(),
        tokens.clone(),
        tz,
        config.link_late_grace_seconds,
    )?);
    let gateway = Arc::new(AiGateway::new(
        Box::new(FakeLlm::new()),
        Box::new(FakeAsr),
        Box::new(FakeTts),
        config.ai_rate_limit_per_minute,
        config.ai_quota_hard_fail,
    ));
    let coderunner = Arc::new(CodeRunner::new(config.code_runner_timeout_seconds));
    let sessions = Arc::new(SessionManager::new(
        open()?,
        directory.clone(),
        scheduler.clone(),
        tokens.clone(),
        gateway.clone(),
        coderunner,
        config.session_idle_timeout_seconds,
    )?);
    let proctor = Arc::new(ProctorRegistry::new(open()?, Arc::new(LoggingEvidenceSink))?);
    let evaluation = Arc::new(EvaluationManager::new(
        open()?,
        sessions.clone(),
        proctor.clone(),
        gateway.clone(),
    )?);

    Ok(AppState {
        config,
        directory,
        tokens,
        scheduler,
        sessions,
        proctor,
        gateway,
        evaluation,
        notifier: Arc::new(LogNotificationSink),
    })
}

async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let bind = state.config.server.bind.clone();
    let port = state.config.server.port;
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("ai-interview-admin listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
