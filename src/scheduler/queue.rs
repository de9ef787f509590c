//! Queue entries and the cumulative result buffer.

use uuid::Uuid;

use crate::core::ScanRecord;

/// One pending scan target.
///
/// Entries are created when the scheduler expands its range (or through
/// `enqueue`) and consumed exactly once, when dispatched.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Unique id, carried through log fields.
    pub id: Uuid,

    /// The target to scan.
    pub target: String,

    /// Engine option string for this entry.
    pub options: String,
}

impl QueueEntry {
    /// Creates an entry for one target.
    pub fn new(target: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            options: options.into(),
        }
    }
}

/// The cumulative result sequence with its two cursors.
///
/// `next` reads through `read_cursor` without removing anything; `shift`
/// removes from the front and counts removals separately. Removal rebases
/// the read cursor by the number of records removed (saturating at zero),
/// so a reader never skips or re-reads a surviving record.
#[derive(Debug, Default)]
pub(crate) struct ResultBuffer {
    records: Vec<ScanRecord>,
    read_cursor: usize,
    shifted: usize,
}

impl ResultBuffer {
    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Current `next` cursor position.
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Total records removed by `shift` so far.
    pub fn shifted(&self) -> usize {
        self.shifted
    }

    /// Appends one record.
    pub fn push(&mut self, record: ScanRecord) {
        self.records.push(record);
    }

    /// Appends records in order.
    pub fn append(&mut self, records: impl IntoIterator<Item = ScanRecord>) {
        self.records.extend(records);
    }

    /// Clones the full current sequence.
    pub fn snapshot(&self) -> Vec<ScanRecord> {
        self.records.clone()
    }

    /// Reads up to `count` records at the read cursor and advances it.
    pub fn next(&mut self, count: usize) -> Vec<ScanRecord> {
        let start = self.read_cursor.min(self.records.len());
        let end = start.saturating_add(count).min(self.records.len());
        self.read_cursor = end;
        self.records[start..end].to_vec()
    }

    /// Removes and returns up to `count` records from the front.
    pub fn shift(&mut self, count: usize) -> Vec<ScanRecord> {
        let take = count.min(self.records.len());
        let removed: Vec<ScanRecord> = self.records.drain(..take).collect();
        self.read_cursor = self.read_cursor.saturating_sub(take);
        self.shifted += take;
        removed
    }

    /// Removes and returns the front record, if any.
    pub fn shift_one(&mut self) -> Option<ScanRecord> {
        self.shift(1).into_iter().next()
    }
}
