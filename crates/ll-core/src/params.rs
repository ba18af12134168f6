//! # Query Parameters
//!
//! The normalized form of one search request. Built once per request
//! through [`QueryParametersBuilder`] and never mutated afterwards.
//!
//! Every timestamp is converted to UTC on the way in, so no builder or
//! backend downstream ever sees a local offset.

use crate::error::ParamError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A validated, UTC-normalized search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    page: u32,
    page_size: u32,
    offset: i64,
    level: Option<String>,
    search_text: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl QueryParameters {
    pub fn builder() -> QueryParametersBuilder {
        QueryParametersBuilder::default()
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows skipped before this page: `(page - 1) * page_size`.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Row number of the first entry on this page, counted over the whole
    /// filtered result.
    pub fn first_row_number(&self) -> u64 {
        self.offset as u64 + 1
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Exclusive upper bound.
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }
}

/// Offset of the first row on `page`, or `None` when the page is zero-sized,
/// zero-numbered, or its last row would not fit in an `i64`.
pub fn page_offset(page: u32, page_size: u32) -> Option<i64> {
    if page == 0 || page_size == 0 {
        return None;
    }
    let offset = i64::from(page - 1).checked_mul(i64::from(page_size))?;
    offset.checked_add(i64::from(page_size))?;
    Some(offset)
}

#[derive(Debug, Clone)]
pub struct QueryParametersBuilder {
    page: u32,
    page_size: u32,
    level: Option<String>,
    search_text: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl Default for QueryParametersBuilder {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            level: None,
            search_text: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl QueryParametersBuilder {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Level name as typed by the operator. Blank input means "any level".
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = non_blank(level.into()).map(|l| l.trim().to_string());
        self
    }

    /// Free-text search. Blank input means "no search".
    pub fn search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = non_blank(text.into());
        self
    }

    pub fn start_date<Tz: TimeZone>(mut self, start: DateTime<Tz>) -> Self {
        self.start_date = Some(start.with_timezone(&Utc));
        self
    }

    pub fn end_date<Tz: TimeZone>(mut self, end: DateTime<Tz>) -> Self {
        self.end_date = Some(end.with_timezone(&Utc));
        self
    }

    pub fn build(self) -> Result<QueryParameters, ParamError> {
        if self.page == 0 {
            return Err(ParamError::ZeroPage);
        }
        if self.page_size == 0 {
            return Err(ParamError::ZeroPageSize);
        }
        let offset = page_offset(self.page, self.page_size).ok_or(ParamError::OffsetOverflow {
            page: self.page,
            page_size: self.page_size,
        })?;

        Ok(QueryParameters {
            page: self.page,
            page_size: self.page_size,
            offset,
            level: self.level,
            search_text: self.search_text,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse an ISO-8601 timestamp supplied by a host.
///
/// Blank input is `Ok(None)`. Values with an offset are converted to UTC;
/// values without one (`2024-03-01T10:00:00`, `2024-03-01`) are taken as UTC.
pub fn parse_timestamp(
    field: &'static str,
    raw: &str,
) -> Result<Option<DateTime<Utc>>, ParamError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(naive.and_utc()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(midnight.and_utc()));
        }
    }
    Err(ParamError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
