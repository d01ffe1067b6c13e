//! The run's work queue.
//!
//! Owns the flattened item list for a run. All mutation goes through
//! [`WorkQueue::update`], which rebuilds the collection as a whole so
//! observers always see a consistent snapshot and an interrupted update can
//! never leave a half-written item behind.

use contentforge_shared::{ContentForgeError, Group, ItemStatus, Result, WorkItem};

/// Ordered collection of work items for one run.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    items: Vec<WorkItem>,
}

impl WorkQueue {
    /// Flatten groups into a queue, assigning each item its global index.
    ///
    /// Group order and in-group order are both preserved, matching the order
    /// link planning and scheduling use.
    pub fn from_groups(groups: &[Group]) -> Result<Self> {
        if groups.iter().all(|g| g.is_empty()) {
            return Err(ContentForgeError::validation(
                "cannot build a work queue from empty groups",
            ));
        }

        let mut items = Vec::new();
        for group in groups {
            for item in &group.items {
                let mut item = item.clone();
                item.index = items.len();
                items.push(item);
            }
        }

        Ok(Self { items })
    }

    /// Append a group's items to the back of the queue.
    pub fn enqueue_group(&mut self, group: &Group) -> Result<()> {
        if group.is_empty() {
            return Err(ContentForgeError::validation(format!(
                "group {} has no items",
                group.id
            )));
        }
        for item in &group.items {
            let mut item = item.clone();
            item.index = self.items.len();
            self.items.push(item);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Clone the whole collection for external observers.
    pub fn snapshot(&self) -> Vec<WorkItem> {
        self.items.clone()
    }

    /// Apply `f` to the item at `index`, replacing the collection wholesale.
    pub fn update<F>(&mut self, index: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut WorkItem),
    {
        if index >= self.items.len() {
            return Err(ContentForgeError::validation(format!(
                "work item index {index} out of bounds ({} items)",
                self.items.len()
            )));
        }

        let mut next = self.items.clone();
        f(&mut next[index]);
        self.items = next;
        Ok(())
    }

    /// Index of the first item still waiting to run.
    pub fn first_pending(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.status == ItemStatus::Pending)
    }

    /// Items that finished successfully, in queue order.
    pub fn completed(&self) -> Vec<&WorkItem> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Completed)
            .collect()
    }

    /// Items that exhausted their attempts or hit a non-retryable failure.
    pub fn failed(&self) -> Vec<&WorkItem> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Error)
            .collect()
    }
}
