//! Cursor-based pagination for GraphQL connections
//!
//! Translates between the offset-based paging the store layer speaks and the
//! Relay-style cursor paging GraphQL clients speak. Cursors are opaque base64
//! strings encoding an absolute row offset.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use thiserror::Error;

use crate::record::Record;

/// Failure decoding an opaque cursor back into a row offset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64")]
    Encoding,
    #[error("cursor payload is not valid utf-8")]
    Payload,
    #[error("cursor payload is missing the offset prefix")]
    Prefix,
    #[error("cursor offset is not a number")]
    Offset,
}

/// Encode an absolute row offset as an opaque cursor string.
pub fn offset_to_cursor(offset: i64) -> String {
    BASE64.encode(format!("cursor:{}", offset))
}

/// Decode an opaque cursor string back into an absolute row offset.
pub fn cursor_to_offset(cursor: &str) -> Result<i64, CursorError> {
    let decoded = BASE64.decode(cursor).map_err(|_| CursorError::Encoding)?;
    let s = String::from_utf8(decoded).map_err(|_| CursorError::Payload)?;

    let offset = s.strip_prefix("cursor:").ok_or(CursorError::Prefix)?;
    offset.parse().map_err(|_| CursorError::Offset)
}

/// The forward-pagination arguments of a field: `first` and `after`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageArguments {
    /// Page size. `None` means unbounded.
    pub first: Option<i64>,
    /// Opaque cursor of the last row already seen.
    pub after: Option<String>,
}

impl PageArguments {
    /// True when the caller supplied either pagination argument.
    pub fn is_requested(&self) -> bool {
        self.first.is_some() || self.after.is_some()
    }
}

/// The offset-based window a store fetches a page with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitOffset {
    /// Row cap for the fetch. `0` means no limit.
    pub limit: i64,
    /// Rows to skip before the first returned row.
    pub offset: i64,
}

/// An offset-paged result set, as reported by a store.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// The fetched slice of rows, in query order.
    pub records: Vec<Record>,
    /// Total row count matching the query, ignoring the window.
    pub total: i64,
    /// The limit the page was fetched with (`0` = unbounded).
    pub limit: i64,
    /// The offset the page was fetched at.
    pub offset: i64,
}

/// One record in a connection, paired with its cursor.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub node: Record,
    pub cursor: String,
}

/// Relay page metadata.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// A Relay-style connection, plus a non-standard `total` count consumers rely
/// on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
    pub total: i64,
}

/// Convert `first`/`after` into the window a store fetches with.
///
/// `limit` is `first` when supplied, else `0` ("no limit" to the fetch layer:
/// a connection without `first` is an unbounded fetch). `offset` is one past
/// the cursor's row, except that a cursor decoding to offset `0` collapses to
/// no offset at all. A cursor for row 0 is therefore indistinguishable from
/// "no cursor supplied" here; documented boundary behavior.
pub fn limit_offset(args: &PageArguments) -> Result<LimitOffset, CursorError> {
    let limit = args.first.unwrap_or(0);
    let offset = match &args.after {
        Some(cursor) => match cursor_to_offset(cursor)? {
            0 => 0,
            n => n + 1,
        },
        None => 0,
    };
    Ok(LimitOffset { limit, offset })
}

/// Project an offset-paged result into a Relay connection.
///
/// Edge cursors are absolute: edge `i` carries the cursor for row
/// `slice_start + i`, where `slice_start` is one past the `after` cursor (or
/// `0` without one). `has_next_page` is computed against the page's reported
/// total, not the slice length, so it is correct even though only one page of
/// rows was fetched.
///
/// Note the asymmetry with [`limit_offset`]: a zero cursor does NOT collapse
/// here, so `after = cursor(0)` yields a slice start of 1.
pub fn page_to_connection(page: Page, args: &PageArguments) -> Result<Connection, CursorError> {
    let slice_start = match &args.after {
        Some(cursor) => cursor_to_offset(cursor)? + 1,
        None => 0,
    };

    let total = page.total;
    let has_next_page = (slice_start + page.records.len() as i64) < total;
    let has_previous_page = slice_start > 0;

    let edges: Vec<Edge> = page
        .records
        .into_iter()
        .enumerate()
        .map(|(i, node)| Edge {
            cursor: offset_to_cursor(slice_start + i as i64),
            node,
        })
        .collect();

    let page_info = PageInfo {
        has_next_page,
        has_previous_page,
        start_cursor: edges.first().map(|e| e.cursor.clone()),
        end_cursor: edges.last().map(|e| e.cursor.clone()),
    };

    Ok(Connection {
        edges,
        page_info,
        total,
    })
}
