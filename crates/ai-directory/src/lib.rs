//! Minimal Job/Candidate directory. The spec treats company/recruiter/job
//! CRUD and résumé parsing as external collaborators (§1); this crate keeps
//! just enough persistence for C2/C3/C7 to look up the snapshots they need.

pub mod db;
pub mod error;
pub mod types;

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::Connection;

use ai_core::ids::{CandidateId, JobId};
use error::Result;
use types::{Candidate, Job, NewCandidate, NewJob};

pub struct Directory {
    conn: Mutex<Connection>,
}

impl Directory {
    pub fn new(conn: Connection) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn create_job(&self, new_job: NewJob) -> Result<Job> {
        let now = Utc::now().to_rfc3339();
        let job = Job {
            id: JobId::new(),
            tenant_id: new_job.tenant_id,
            title: new_job.title,
            company: new_job.company,
            domain: new_job.domain,
            coding_language: new_job.coding_language,
            description: new_job.description,
            tech_stack: new_job.tech_stack,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.conn.lock().expect("directory connection poisoned");
        db::insert_job(&conn, &job)?;
        Ok(job)
    }

    pub fn get_job(&self, id: &str) -> Result<Job> {
        let conn = self.conn.lock().expect("directory connection poisoned");
        db::get_job(&conn, id)
    }

    pub fn list_jobs(&self) -> Result<Vec<Job>> {
        let conn = self.conn.lock().expect("directory connection poisoned");
        db::list_jobs(&conn)
    }

    pub fn create_candidate(&self, new_candidate: NewCandidate) -> Result<Candidate> {
        let now = Utc::now().to_rfc3339();
        let candidate = Candidate {
            id: CandidateId::new(),
            tenant_id: new_candidate.tenant_id,
            display_name: new_candidate.display_name,
            email: new_candidate.email,
            resume_text: new_candidate.resume_text,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.conn.lock().expect("directory connection poisoned");
        db::insert_candidate(&conn, &candidate)?;
        Ok(candidate)
    }

    pub fn get_candidate(&self, id: &str) -> Result<Candidate> {
        let conn = self.conn.lock().expect("directory connection poisoned");
        db::get_candidate(&conn, id)
    }

    pub fn set_candidate_resume(&self, id: &str, resume_text: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("directory connection poisoned");
        db::set_candidate_resume(&conn, id, resume_text, &now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::CodingLanguage;

    fn dir() -> Directory {
        Directory::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn create_and_fetch_job() {
        let dir = dir();
        let job = dir
            .create_job(NewJob {
                tenant_id: "t1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                domain: "fintech".into(),
                coding_language: CodingLanguage::Python,
                description: "Build things".into(),
                tech_stack: vec!["rust".into()],
            })
            .unwrap();
        let fetched = dir.get_job(job.id.as_str()).unwrap();
        assert_eq!(fetched.title, "Backend Engineer");
        assert_eq!(fetched.coding_language, CodingLanguage::Python);
    }

    #[test]
    fn duplicate_email_in_same_tenant_rejected() {
        let dir = dir();
        dir.create_candidate(NewCandidate {
            tenant_id: "t1".into(),
            display_name: "Alice".into(),
            email: "c@example.com".into(),
            resume_text: None,
        })
        .unwrap();
        let second = dir.create_candidate(NewCandidate {
            tenant_id: "t1".into(),
            display_name: "Alice Two".into(),
            email: "c@example.com".into(),
            resume_text: None,
        });
        assert!(second.is_err());
    }

    #[test]
    fn same_email_allowed_across_different_tenants() {
        let dir = dir();
        dir.create_candidate(NewCandidate {
            tenant_id: "t1".into(),
            display_name: "Alice".into(),
            email: "c@example.com".into(),
            resume_text: None,
        })
        .unwrap();
        let other_tenant = dir.create_candidate(NewCandidate {
            tenant_id: "t2".into(),
            display_name: "Alice".into(),
            email: "c@example.com".into(),
            resume_text: None,
        });
        assert!(other_tenant.is_ok());
    }
}
