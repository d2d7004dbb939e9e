use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::task::{timestamp_now, NewTask, Priority, Status, Task, TaskPatch};

/// Number of cells in the overall progress bar.
pub const PROGRESS_BAR_CELLS: usize = 30;

/// In-memory task collection in insertion order, plus id allocation.
///
/// Ids are handed out from a monotonic counter and never reused, even after
/// the task holding one is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u32,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuilds a store from persisted tasks; the next id follows the largest
    /// one present. Fails when that id leaves no room for another task.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self> {
        let next_id = match tasks.iter().map(|t| t.id).max() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                Error::Validation(format!("task id {max} is out of range"))
            })?,
        };
        Ok(Self { tasks, next_id })
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add(&mut self, new: NewTask) -> Result<&Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        let following = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| Error::Validation("no task ids left".to_string()))?;

        let task = Task {
            id: self.next_id,
            title: title.to_string(),
            description: new.description.trim().to_string(),
            priority: new.priority,
            status: Status::Todo,
            created_at: timestamp_now(),
            due_date: new
                .due_date
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            tags: new.tags,
        };
        self.next_id = following;
        debug!(id = task.id, title = %task.title, "Task added");

        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn find(&self, id: u32) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(Error::NotFound { id })
    }

    fn find_mut(&mut self, id: u32) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::NotFound { id })
    }

    pub fn edit(&mut self, id: u32, patch: TaskPatch) -> Result<&Task> {
        let task = self.find_mut(id)?;
        patch.apply(task);
        debug!(id, status = %task.status, "Task edited");
        Ok(&*task)
    }

    pub fn complete(&mut self, id: u32) -> Result<&Task> {
        let task = self.find_mut(id)?;
        task.status = Status::Done;
        debug!(id, "Task completed");
        Ok(&*task)
    }

    /// Removes the task for good. Confirmation is up to the caller.
    pub fn delete(&mut self, id: u32) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound { id })?;
        debug!(id, "Task deleted");
        Ok(self.tasks.remove(index))
    }

    pub fn list_all(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter()
    }

    /// Tasks not yet done, in collection order.
    pub fn active(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(|t| t.status != Status::Done)
    }

    pub fn search_by_title(&self, needle: &str) -> impl Iterator<Item = &Task> + '_ {
        let needle = needle.to_lowercase();
        self.tasks
            .iter()
            .filter(move |t| t.title.to_lowercase().contains(&needle))
    }

    pub fn search_by_tag(&self, tag: &str) -> impl Iterator<Item = &Task> + '_ {
        let tag = tag.to_string();
        self.tasks.iter().filter(move |t| t.has_tag(&tag))
    }

    pub fn filter_by_status(&self, status: Status) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    pub fn filter_by_priority(&self, priority: Priority) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |t| t.priority == priority)
    }

    pub fn stats(&self) -> Stats {
        let total = self.tasks.len();
        let by_status = Status::ALL.map(|status| {
            let count = self.filter_by_status(status).count();
            StatusCount {
                status,
                count,
                percentage: percentage(count, total),
            }
        });
        Stats { total, by_status }
    }

    /// Every tag in use with the number of tasks carrying it.
    ///
    /// Tags are grouped case-insensitively; each group keeps the spelling
    /// seen first in collection order. Sorted by lower-cased tag text.
    pub fn distinct_tags(&self) -> Vec<TagCount> {
        let mut groups: BTreeMap<String, TagCount> = BTreeMap::new();
        for task in &self.tasks {
            let mut seen = BTreeSet::new();
            for tag in &task.tags {
                let key = tag.to_lowercase();
                if !seen.insert(key.clone()) {
                    continue;
                }
                groups
                    .entry(key)
                    .or_insert_with(|| TagCount {
                        tag: tag.clone(),
                        count: 0,
                    })
                    .count += 1;
            }
        }
        groups.into_values().collect()
    }
}

/// `count / total * 100` to one decimal place; 0 for an empty store.
///
/// Computed in tenths with integer arithmetic; an exact half rounds to the
/// even tenth (1 of 16 is 6.2, not 6.3).
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let scaled = count * 1000;
    let (mut tenths, rem) = (scaled / total, scaled % total);
    if 2 * rem > total || (2 * rem == total && tenths % 2 == 1) {
        tenths += 1;
    }
    tenths as f64 / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total: usize,
    /// One entry per status, in `Status::ALL` order.
    pub by_status: [StatusCount; 4],
}

impl Stats {
    pub fn get(&self, status: Status) -> &StatusCount {
        // by_status is built from Status::ALL, so every status has a slot.
        &self.by_status[status as usize]
    }

    pub fn done(&self) -> usize {
        self.get(Status::Done).count
    }

    /// Fraction of tasks done, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done() as f64 / self.total as f64
        }
    }

    pub fn progress_bar(&self) -> ProgressBar {
        let filled = if self.total == 0 {
            0
        } else {
            self.done() * PROGRESS_BAR_CELLS / self.total
        };
        ProgressBar {
            filled,
            empty: PROGRESS_BAR_CELLS - filled,
        }
    }
}

/// Filled cells render first, then the empty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBar {
    pub filled: usize,
    pub empty: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}
