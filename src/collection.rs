//! The task list, as the UI shows it
//!
//! The collection keeps the tasks of the last fetch, and derives the visible list from them and from the current filter and sort criteria.
//! The visible list is rebuilt from scratch every time something changes, it is never patched.

use std::collections::HashMap;

use crate::task::{Task, TaskStatus};

/// Which tasks to show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    /// Show every task
    All,
    /// Show only tasks with this status
    Only(TaskStatus),
}

/// Every task is shown until a filter is picked
impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::All
    }
}

impl StatusFilter {
    /// Whether `task` passes this filter. Statuses must match exactly
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => task.status() == *status,
        }
    }
}

/// How to order the visible tasks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first
    Date,
    /// Most urgent first
    Priority,
}

/// Lists start sorted by date
impl Default for SortKey {
    fn default() -> Self {
        SortKey::Date
    }
}

/// The fetched tasks, and the filtered and sorted view of them that the list shows
#[derive(Clone, Debug, Default)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    filter: StatusFilter,
    sort: SortKey,

    /// Indices into `tasks`
    visible: Vec<usize>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content with a fresh fetch
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.recompute();
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.recompute();
    }

    pub fn filter(&self) -> StatusFilter { self.filter }
    pub fn sort(&self) -> SortKey { self.sort }

    /// Every task of the last fetch, in fetch order
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// The filtered and sorted tasks
    pub fn visible(&self) -> Vec<&Task> {
        self.visible.iter().map(|&i| &self.tasks[i]).collect()
    }

    /// How many fetched tasks have each status
    pub fn counts(&self) -> HashMap<TaskStatus, usize> {
        let mut counts = HashMap::new();
        for task in &self.tasks {
            *counts.entry(task.status()).or_insert(0) += 1;
        }
        counts
    }

    fn recompute(&mut self) {
        let tasks = &self.tasks;
        let filter = self.filter;
        let mut visible: Vec<usize> = (0..tasks.len())
            .filter(|&i| filter.matches(&tasks[i]))
            .collect();

        // `sort_by` is stable, so that ties keep the fetch order
        match self.sort {
            SortKey::Date => visible.sort_by(|&a, &b| tasks[b].created_date().cmp(tasks[a].created_date())),
            SortKey::Priority => visible.sort_by(|&a, &b| tasks[a].priority().cmp(&tasks[b].priority())),
        }

        log::trace!("{} of {} tasks are visible ({:?}, sorted by {:?})", visible.len(), tasks.len(), filter, self.sort);
        self.visible = visible;
    }
}
