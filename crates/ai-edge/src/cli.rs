//! Administrative CLI surface (§6): every subcommand is a `clap::Subcommand`
//! variant of the one `ai-interview-admin` binary, the same way
//! `knhk-workflow`'s single binary dispatches on a `Subcommand` enum rather
//! than shipping one binary per command.

use std::sync::Arc;

use ai_core::civiltime::format_ist;
use clap::{Parser, Subcommand};

use crate::app::AppState;

#[derive(Parser)]
#[command(name = "ai-interview-admin")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision a recruiter/admin account. User administration is owned by
    /// the external auth service (§1); this only prints the handoff.
    CreateAdmin { email: String },
    /// Best-effort report of distinct company names already present across
    /// known jobs. Company/job CRUD lives outside this core (§1).
    SyncCompaniesFromJobs,
    /// Idempotent repair: recompute every scheduled Interview's
    /// `started_at`/`ended_at` from its bound Slot.
    FixExistingInterviewTimes,
    /// Re-send the scheduled-interview notification for every currently
    /// booked interview.
    SendInterviewEmails,
    /// Evaluate every COMPLETED session that has no persisted result yet.
    ReevaluatePending,
}

pub async fn dispatch(command: Commands, state: &Arc<AppState>) -> anyhow::Result<()> {
    match command {
        Commands::CreateAdmin { email } => create_admin(&email),
        Commands::SyncCompaniesFromJobs => sync_companies_from_jobs(state),
        Commands::FixExistingInterviewTimes => fix_existing_interview_times(state),
        Commands::SendInterviewEmails => send_interview_emails(state).await,
        Commands::ReevaluatePending => reevaluate_pending(state).await,
    }
}

fn create_admin(email: &str) -> anyhow::Result<()> {
    tracing::info!(email, "recruiter administration is owned by the external auth service");
    println!("Account provisioning for {email} must happen in the external auth service; nothing to do here.");
    Ok(())
}

fn sync_companies_from_jobs(state: &Arc<AppState>) -> anyhow::Result<()> {
    let jobs = state.directory.list_jobs()?;
    let mut companies: Vec<&str> = jobs.iter().map(|j| j.company.as_str()).collect();
    companies.sort_unstable();
    companies.dedup();
    for company in &companies {
        println!("{company}");
    }
    println!("{} distinct companies across {} jobs.", companies.len(), jobs.len());
    Ok(())
}

fn fix_existing_interview_times(state: &Arc<AppState>) -> anyhow::Result<()> {
    let fixed = state.scheduler.fix_interview_times()?;
    println!("Repaired {fixed} interview(s) with drifted started_at/ended_at.");
    Ok(())
}

async fn send_interview_emails(state: &Arc<AppState>) -> anyhow::Result<()> {
    let interviews = state.scheduler.list_booked_interviews()?;
    let mut sent = 0;
    let mut failed = 0;
    for interview in interviews {
        let candidate = match state.directory.get_candidate(interview.candidate_id.as_str()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(interview_id = interview.id.as_str(), error = %e, "candidate lookup failed");
                failed += 1;
                continue;
            }
        };
        let Some(started_at) = interview.started_at else {
            continue;
        };
        let session = match state.sessions.ensure_session(interview.id.as_str()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(interview_id = interview.id.as_str(), error = %e, "session lookup failed");
                failed += 1;
                continue;
            }
        };
        let url = format!(
            "{}/interview/?session_key={}",
            state.config.base_url,
            session.session_key.as_str()
        );
        let body = format!("Your interview is scheduled for {}. Join at: {url}", format_ist(started_at));
        match state.notifier.send(&candidate.email, "Interview scheduled", &body).await {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::warn!(interview_id = interview.id.as_str(), error = %e, "notification send failed");
                failed += 1;
            }
        }
    }
    println!("Sent {sent} notification(s), {failed} failed.");
    Ok(())
}

async fn reevaluate_pending(state: &Arc<AppState>) -> anyhow::Result<()> {
    let completed = state.sessions.list_completed_sessions()?;
    let ids: Vec<String> = completed.iter().map(|s| s.id.to_string()).collect();
    let pending = state.evaluation.sessions_missing_result(&ids)?;

    let mut evaluated = 0;
    let mut failed = 0;
    for session_id in pending {
        let Ok(session) = state.sessions.get_session(&session_id) else {
            failed += 1;
            continue;
        };
        match state.evaluation.evaluate(&session_id, session.interview_id.as_str()).await {
            Ok(_) => evaluated += 1,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "reevaluation failed");
                failed += 1;
            }
        }
    }
    println!("Evaluated {evaluated} pending session(s), {failed} failed.");
    Ok(())
}
