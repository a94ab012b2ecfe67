use std::fmt::Debug;

use derive_more::From;
use log::{error, info};

use config::{Job, Style};
use storage::{DBError, DocumentStore};

use crate::models::{Model, Task, User};
use crate::repository::Repository;
use crate::sequence::{
    delete_task_and_count, delete_task_and_count_chained, update_age_and_count,
    update_age_and_count_chained, SequenceOutcome,
};

#[derive(Debug, Clone, PartialEq, From)]
pub enum JobOutcome {
    UserUpdated(SequenceOutcome<User>),
    TaskDeleted(SequenceOutcome<Task>),
}

impl JobOutcome {
    pub fn count(&self) -> u64 {
        match self {
            JobOutcome::UserUpdated(outcome) => outcome.count,
            JobOutcome::TaskDeleted(outcome) => outcome.count,
        }
    }

    /// What gets logged for a successful job: the document, then the count.
    pub fn lines(&self) -> [String; 2] {
        let document = match self {
            JobOutcome::UserUpdated(outcome) => describe(&outcome.document),
            JobOutcome::TaskDeleted(outcome) => describe(&outcome.document),
        };
        [document, self.count().to_string()]
    }
}

fn describe<M: Model + Debug>(document: &Option<M>) -> String {
    match document {
        Some(document) => format!("{:?}", document),
        None => format!("No matching {}", M::MODEL_NAME),
    }
}

pub async fn run_job<U: DocumentStore, T: DocumentStore>(
    users: &Repository<User, U>,
    tasks: &Repository<Task, T>,
    job: &Job,
    style: Style,
) -> Result<JobOutcome, DBError> {
    let outcome: JobOutcome = match (job, style) {
        (Job::UpdateUserAge { id, age }, Style::Chained) => {
            update_age_and_count_chained(users, id, *age).await?.into()
        }
        (Job::UpdateUserAge { id, age }, Style::Sequential) => {
            update_age_and_count(users, id, *age).await?.into()
        }
        (Job::DeleteTask { id }, Style::Chained) => {
            delete_task_and_count_chained(tasks, id).await?.into()
        }
        (Job::DeleteTask { id }, Style::Sequential) => delete_task_and_count(tasks, id).await?.into(),
    };
    Ok(outcome)
}

/// Terminal handler for a job: logs both results, or the failure.
pub fn report(name: &str, result: &Result<JobOutcome, DBError>) {
    match result {
        Ok(outcome) => {
            for line in outcome.lines() {
                info!("[{}] {}", name, line);
            }
        }
        Err(e) => error!("[{}] {}", name, e),
    }
}
