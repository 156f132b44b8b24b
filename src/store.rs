//! In-memory task store with per-key atomic updates.
//!
//! Backed by a sharded [`DashMap`], so reads and updates for unrelated tasks never
//! contend on a single lock and no lock is held across filesystem I/O. The store
//! is owned by one [`ExportService`](crate::ExportService) instance and shared with
//! its workers through an `Arc`.

use crate::types::{Task, TaskId, TaskUpdate};
use chrono::Utc;
use dashmap::DashMap;
use std::time::Duration;

/// Thread-safe map from task id to task record
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<TaskId, Task>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new PENDING task under a freshly generated id
    pub fn create(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            // vacant-entry insert keeps ids unique even on a (theoretical) uuid clash
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.tasks.entry(id.clone()) {
                slot.insert(Task::pending(id.clone()));
                return id;
            }
        }
    }

    /// Current record for `id`, or a synthetic NOT_FOUND record
    pub fn get(&self, id: &TaskId) -> Task {
        self.tasks
            .get(id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Task::not_found(id.clone()))
    }

    /// Atomically apply a status transition to `id`
    ///
    /// The shard lock for `id` is held only while the record is mutated. Returns
    /// `false` if the task is unknown or the transition would leave a terminal
    /// state.
    pub fn update(&self, id: &TaskId, update: TaskUpdate) -> bool {
        let Some(mut entry) = self.tasks.get_mut(id) else {
            tracing::debug!(task_id = %id, "Update for unknown task ignored");
            return false;
        };

        let from = entry.status;
        let to = update.status();
        let applied = entry.apply(update);
        if !applied {
            tracing::warn!(task_id = %id, %from, %to, "Rejected illegal task transition");
        }
        applied
    }

    /// Remove every task created more than `max_age` ago, whatever its status
    ///
    /// Candidates are collected first and removed one key at a time, so concurrent
    /// `get`/`update` calls on other keys are never blocked for the whole sweep.
    /// Returns the removed records.
    pub fn sweep(&self, max_age: Duration) -> Vec<Task> {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let expired: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|entry| entry.created_at < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| {
                self.tasks
                    .remove_if(&id, |_, task| task.created_at < cutoff)
                    .map(|(_, task)| task)
            })
            .collect()
    }

    /// Number of tracked tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are tracked
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, id: &TaskId, by: Duration) {
        if let Some(mut entry) = self.tasks.get_mut(id) {
            entry.created_at -= chrono::Duration::from_std(by).unwrap_or_default();
        }
    }
}
