//! Queue of pending range writes, flushed in one `values:batchUpdate` call.

use sheetwire_protocol::ValueRange;

/// Pending writes owned by a [`Spreadsheet`](crate::Spreadsheet).
///
/// Sheets add to it through [`Sheet::queue_update`](crate::Sheet::queue_update),
/// which borrows the queue explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchQueue {
    updates: Vec<ValueRange>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: ValueRange) {
        self.updates.push(update);
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Ranges of the queued writes, in queue order
    pub fn ranges(&self) -> Vec<&str> {
        self.updates
            .iter()
            .filter_map(|u| u.range.as_deref())
            .collect()
    }

    /// Drain everything queued so far
    pub fn take(&mut self) -> Vec<ValueRange> {
        std::mem::take(&mut self.updates)
    }

    /// Put drained writes back in front of anything queued since
    pub fn restore(&mut self, mut updates: Vec<ValueRange>) {
        updates.append(&mut self.updates);
        self.updates = updates;
    }
}
