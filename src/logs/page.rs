use crate::logs::LogRecord;
use crate::types::Cursor;

/// One batch of records plus the pagination metadata that came with it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub records: Vec<LogRecord>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl Page {
    pub fn new(records: Vec<LogRecord>, next_cursor: Option<Cursor>, has_more: bool) -> Self {
        Self {
            records,
            next_cursor,
            has_more,
        }
    }

    /// A final page with no further cursor
    pub fn last(records: Vec<LogRecord>) -> Self {
        Self::new(records, None, false)
    }
}

/// All pages fetched so far under one filter identity, concatenated in
/// fetch order
#[derive(Debug, Clone)]
pub struct PagedSequence {
    records: Vec<LogRecord>,
    page_count: usize,
    next_cursor: Option<Cursor>,
    has_more: bool,
}

impl PagedSequence {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            page_count: 0,
            next_cursor: None,
            has_more: true,
        }
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Cursor the next page must be requested with; `None` before the first
    /// page and after the last one
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_started(&self) -> bool {
        self.page_count > 0
    }

    pub(crate) fn push(&mut self, page: Page) {
        self.records.extend(page.records);
        self.page_count += 1;
        // Without a bookmark there is no way to ask for the next page
        self.has_more = page.has_more && page.next_cursor.is_some();
        self.next_cursor = page.next_cursor.filter(|_| self.has_more);
    }
}

impl Default for PagedSequence {
    fn default() -> Self {
        Self::new()
    }
}
