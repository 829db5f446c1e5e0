//! Keyset (cursor) pagination for append-only history feeds.
//!
//! Offset pagination skips or duplicates rows when new transactions land
//! between page fetches. Pages are keyed by the last-seen row id instead:
//! `cursor` means "rows with id strictly below this", which is stable under
//! concurrent appends.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CursorQuery {
    /// Return rows with id strictly below this value (newest page if unset).
    pub cursor: Option<i64>,
    /// Page size (default 20, max 100).
    pub limit: Option<u64>,
}

impl CursorQuery {
    pub fn get_limit(&self) -> u64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// Pass back as `cursor` to fetch the next (older) page; None when done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<i64>,
}

impl<T> CursorPage<T> {
    /// Build a page from `limit + 1` rows fetched in descending id order.
    /// The extra row, if present, only signals that another page exists.
    pub fn from_rows<R>(mut rows: Vec<R>, limit: u64, to_item: impl Fn(R) -> (i64, T)) -> Self {
        let has_more = rows.len() as u64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let mut last_id = None;
        let items = rows
            .into_iter()
            .map(|r| {
                let (id, item) = to_item(r);
                last_id = Some(id);
                item
            })
            .collect();
        Self {
            items,
            next_cursor: if has_more { last_id } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamping() {
        assert_eq!(CursorQuery::default().get_limit(), 20);
        let q = CursorQuery {
            cursor: None,
            limit: Some(500),
        };
        assert_eq!(q.get_limit(), 100);
        let q = CursorQuery {
            cursor: None,
            limit: Some(0),
        };
        assert_eq!(q.get_limit(), 1);
    }

    #[test]
    fn test_full_page_exposes_next_cursor() {
        // 3 rows fetched for limit 2: page holds ids 10, 9 and cursor 9
        let rows = vec![10i64, 9, 8];
        let page = CursorPage::from_rows(rows, 2, |id| (id, id));
        assert_eq!(page.items, vec![10, 9]);
        assert_eq!(page.next_cursor, Some(9));
    }

    #[test]
    fn test_short_page_is_terminal() {
        let rows = vec![5i64, 4];
        let page = CursorPage::from_rows(rows, 20, |id| (id, id));
        assert_eq!(page.items, vec![5, 4]);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_empty_page() {
        let page: CursorPage<i64> = CursorPage::from_rows(Vec::<i64>::new(), 20, |id| (id, id));
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
    }
}
