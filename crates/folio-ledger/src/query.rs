//! Paginated entry listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_types::{Deadline, UserId};

use crate::cursor::{clamp_limit, resume_after, Cursor};
use crate::entities::JournalEntry;
use crate::error::Result;
use crate::traits::LedgerReader;

/// Window and page selection for [`EntryBrowser::page`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Opaque token from a previous page's `next_cursor`.
    pub cursor: Option<String>,
}

/// A page of journal entries ascending by `(date, id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryPage {
    pub entries: Vec<JournalEntry>,
    /// Present only when entries remain past this page.
    pub next_cursor: Option<String>,
}

/// Read-only entry listing with window filters and cursor paging.
pub struct EntryBrowser;

impl EntryBrowser {
    /// One page of the user's entries dated within `[from, to]`.
    ///
    /// Resumes strictly after the cursor's `(date, id)` key; a missing
    /// anchor entry cannot restart the scan from the top. The cursor is
    /// returned only when the page was truncated.
    pub fn page<R>(
        reader: &R,
        deadline: &Deadline,
        user_id: UserId,
        query: &EntryQuery,
    ) -> Result<EntryPage>
    where
        R: LedgerReader + ?Sized,
    {
        deadline.check()?;
        let cursor = query.cursor.as_deref().map(Cursor::decode).transpose()?;
        let limit = clamp_limit(query.limit);

        let entries = reader.list_entries(user_id)?;
        let windowed: Vec<JournalEntry> = entries
            .into_iter()
            .filter(|e| {
                query.from.map_or(true, |from| e.date >= from)
                    && query.to.map_or(true, |to| e.date <= to)
            })
            .collect();

        let start = match cursor {
            None => 0,
            Some(c) => resume_after(&windowed, &(c.ts, c.id), |e| (e.date, *e.id.as_uuid())),
        };

        let end = (start + limit).min(windowed.len());
        let next_cursor = if end < windowed.len() && start < end {
            let last = &windowed[end - 1];
            Some(Cursor::new(last.date, *last.id.as_uuid()).encode())
        } else {
            None
        };

        Ok(EntryPage {
            entries: windowed[start..end].to_vec(),
            next_cursor,
        })
    }
}
