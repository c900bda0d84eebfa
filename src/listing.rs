//! Pagination and listing results

use serde::{Deserialize, Serialize};

/// `LIMIT` / `OFFSET` window supplied by the caller.
///
/// The repository never defaults or clamps these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Window covering every row
    pub fn unbounded() -> Self {
        Self {
            limit: usize::MAX,
            offset: 0,
        }
    }

    /// `(limit, offset)` as SQLite integers
    pub fn sql_bounds(&self) -> (i64, i64) {
        (
            i64::try_from(self.limit).unwrap_or(i64::MAX),
            i64::try_from(self.offset).unwrap_or(i64::MAX),
        )
    }
}

/// Rows of one page plus the total number of matching rows.
///
/// `count` ignores the page window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub count: usize,
}

impl<T> Listing<T> {
    pub fn new(rows: Vec<T>, count: usize) -> Self {
        Self { rows, count }
    }

    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_fits_sqlite() {
        let (limit, offset) = Page::unbounded().sql_bounds();
        assert_eq!(limit, i64::MAX);
        assert_eq!(offset, 0);
        assert_eq!(Page::new(10, 20).sql_bounds(), (10, 20));
    }

    #[test]
    fn test_empty_listing() {
        let listing: Listing<u8> = Listing::empty();
        assert!(listing.is_empty());
        assert_eq!(listing.count, 0);
        assert!(!Listing::new(vec![1], 1).is_empty());
    }
}
