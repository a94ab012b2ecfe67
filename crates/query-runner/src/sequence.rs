//! Mutation-then-count sequences.
//!
//! Every operation comes in two forms with the same contract: the count is
//! only started once the mutation has resolved successfully, and the first
//! failure ends the sequence. `*_chained` builds the sequence out of
//! [`TryFutureExt`] continuations, the plain form awaits each step in turn.

use std::future::Future;

use futures::TryFutureExt;
use log::debug;
use mongodb::bson::doc;

use storage::{DBError, DocumentStore};

use crate::models::{Task, User};
use crate::repository::Repository;

/// The mutated document (`None` when the id matched nothing) and the count
/// that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOutcome<M> {
    pub document: Option<M>,
    pub count: u64,
}

/// Set the user's age, then count every user of that age.
pub async fn update_age_and_count<S: DocumentStore>(
    users: &Repository<User, S>,
    id: &str,
    age: i32,
) -> Result<SequenceOutcome<User>, DBError> {
    let user = users.find_by_id_and_update(id, doc! { "age": age }).await?;
    debug!("Updated user: {:?}", user);
    let count = users.count_documents(User::age_filter(age)).await?;
    Ok(SequenceOutcome { document: user, count })
}

pub fn update_age_and_count_chained<'a, S: DocumentStore + 'a>(
    users: &'a Repository<User, S>,
    id: &'a str,
    age: i32,
) -> impl Future<Output = Result<SequenceOutcome<User>, DBError>> + 'a {
    users
        .find_by_id_and_update(id, doc! { "age": age })
        .inspect_ok(|user| debug!("Updated user: {:?}", user))
        .and_then(move |user| {
            users
                .count_documents(User::age_filter(age))
                .map_ok(move |count| SequenceOutcome { document: user, count })
        })
}

/// Delete the task, then count the tasks still open.
pub async fn delete_task_and_count<S: DocumentStore>(
    tasks: &Repository<Task, S>,
    id: &str,
) -> Result<SequenceOutcome<Task>, DBError> {
    let task = tasks.find_by_id_and_delete(id).await?;
    debug!("Deleted task: {:?}", task);
    let count = tasks.count_documents(Task::incomplete_filter()).await?;
    Ok(SequenceOutcome { document: task, count })
}

pub fn delete_task_and_count_chained<'a, S: DocumentStore + 'a>(
    tasks: &'a Repository<Task, S>,
    id: &'a str,
) -> impl Future<Output = Result<SequenceOutcome<Task>, DBError>> + 'a {
    tasks
        .find_by_id_and_delete(id)
        .inspect_ok(|task| debug!("Deleted task: {:?}", task))
        .and_then(move |task| {
            tasks
                .count_documents(Task::incomplete_filter())
                .map_ok(move |count| SequenceOutcome { document: task, count })
        })
}
