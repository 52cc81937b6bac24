//! Offset pagination cursor.
//!
//! Pages are requested at `offset = 0, page_size, 2 * page_size, ...`.
//! A page shorter than `page_size` (including an empty one) is the last.

/// Whether another page should be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// Request the next page at this offset.
    Next {
        /// Offset of the next request.
        offset: usize,
    },
    /// The previous page was the final one.
    Done,
}

/// Tracks the offset and record count while walking an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    page_size: usize,
    offset: usize,
    records: usize,
    pages: usize,
}

impl PageCursor {
    /// Start at offset zero. A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            offset: 0,
            records: 0,
            pages: 0,
        }
    }

    /// Page size sent as `limit`.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Offset of the page to request now.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Records seen so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Pages seen so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Record a page of `returned` records and decide whether to continue.
    pub fn advance(&mut self, returned: usize) -> PageStep {
        self.pages += 1;
        self.records += returned;
        if returned < self.page_size {
            return PageStep::Done;
        }
        self.offset += self.page_size;
        PageStep::Next {
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_page_requests_next_offset() {
        let mut cursor = PageCursor::new(1000);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.advance(1000), PageStep::Next { offset: 1000 });
        assert_eq!(cursor.offset(), 1000);
    }

    #[test]
    fn short_page_is_final() {
        let mut cursor = PageCursor::new(1000);
        cursor.advance(1000);
        assert_eq!(cursor.advance(400), PageStep::Done);
        assert_eq!(cursor.records(), 1400);
        assert_eq!(cursor.pages(), 2);
    }

    #[test]
    fn empty_page_is_final() {
        let mut cursor = PageCursor::new(10);
        assert_eq!(cursor.advance(0), PageStep::Done);
        assert_eq!(cursor.records(), 0);
    }

    #[test]
    fn exact_multiple_needs_one_more_request() {
        let mut cursor = PageCursor::new(5);
        assert_eq!(cursor.advance(5), PageStep::Next { offset: 5 });
        assert_eq!(cursor.advance(5), PageStep::Next { offset: 10 });
        assert_eq!(cursor.advance(0), PageStep::Done);
        assert_eq!(cursor.pages(), 3);
    }

    #[test]
    fn zero_page_size_clamped() {
        assert_eq!(PageCursor::new(0).page_size(), 1);
    }
}
