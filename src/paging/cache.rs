use std::collections::{HashMap, VecDeque};

use crate::logs::{FilterIdentity, Page, PagedSequence};
use crate::paging::InvalidCursorUsage;
use crate::types::Cursor;

const DEFAULT_CAPACITY: usize = 1;

/// Fetched pages per filter identity.
///
/// Keeps at most `capacity` identities, least recently activated evicted
/// first. The default capacity of one keeps only the active identity.
#[derive(Debug, Clone)]
pub struct PageCache {
    entries: HashMap<FilterIdentity, PagedSequence>,
    recent: VecDeque<FilterIdentity>,
    capacity: usize,
}

impl PageCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::new(),
            recent: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, identity: &FilterIdentity) -> Option<&PagedSequence> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &FilterIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Number of identities with fetched pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark `identity` as the most recently used, evicting the oldest
    /// identities beyond capacity
    pub fn activate(&mut self, identity: &FilterIdentity) {
        self.touch(identity);
        while self.recent.len() > self.capacity {
            if let Some(evicted) = self.recent.pop_front() {
                if self.entries.remove(&evicted).is_some() {
                    tracing::debug!("Evicted cached pages for {evicted}");
                }
            }
        }
    }

    /// Append the page fetched with `requested_with` to the sequence of
    /// `identity`.
    ///
    /// The cursor must be the one the sequence expects next: absent for the
    /// first page, the previous page's cursor afterwards. Anything else
    /// would splice pages out of order or from another identity.
    pub fn append_page(
        &mut self,
        identity: &FilterIdentity,
        requested_with: Option<&Cursor>,
        page: Page,
    ) -> Result<&PagedSequence, InvalidCursorUsage> {
        let expected = match self.entries.get(identity) {
            None => None,
            Some(sequence) if !sequence.is_started() => None,
            Some(sequence) if !sequence.has_more() => {
                return Err(InvalidCursorUsage::new(
                    identity,
                    "page appended after the last page",
                ));
            }
            Some(sequence) => sequence.next_cursor(),
        };

        if expected != requested_with {
            return Err(InvalidCursorUsage::new(
                identity,
                format!("expected bookmark {expected:?}, page was fetched with {requested_with:?}"),
            ));
        }

        self.touch(identity);
        let sequence = self.entries.entry(identity.clone()).or_default();
        sequence.push(page);
        Ok(sequence)
    }

    /// Drop everything fetched for `identity` so it starts over
    pub fn reset(&mut self, identity: &FilterIdentity) {
        self.entries.remove(identity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recent.clear();
    }

    fn touch(&mut self, identity: &FilterIdentity) {
        if let Some(pos) = self.recent.iter().position(|i| i == identity) {
            self.recent.remove(pos);
        }
        self.recent.push_back(identity.clone());
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}
