//! # Result Aggregator
//!
//! Joins the page fetch and the count of one search. Both run
//! concurrently; the caller sees a result only after both settle, and the
//! first failure wins. Cancellation is checked before either half is
//! polled, so a token that has already fired never touches the backend.

use crate::error::{StoreError, StoreResult};
use ll_core::{PropertyType, QueryParameters, RawLogRecord, ResultPage};
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub async fn join_page<F, C>(
    params: &QueryParameters,
    cancel: &CancellationToken,
    properties_type: PropertyType,
    fetch: F,
    count: C,
) -> StoreResult<ResultPage>
where
    F: Future<Output = StoreResult<Vec<RawLogRecord>>>,
    C: Future<Output = StoreResult<u64>>,
{
    let started = Instant::now();
    let fetch = async {
        fetch
            .await
            .inspect_err(|err| warn!(error = %err, "page fetch failed"))
    };
    let count = async {
        count
            .await
            .inspect_err(|err| warn!(error = %err, "count fetch failed"))
    };

    let (records, total_count) = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(StoreError::Cancelled),
        joined = async { tokio::try_join!(fetch, count) } => joined?,
    };

    let page = number_rows(params, properties_type, records, total_count);
    debug!(
        page = params.page(),
        page_size = params.page_size(),
        returned = page.entries.len(),
        total = page.total_count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search completed"
    );
    Ok(page)
}

/// Assign row numbers continuing from the rows on earlier pages.
pub fn number_rows(
    params: &QueryParameters,
    properties_type: PropertyType,
    records: Vec<RawLogRecord>,
    total_count: u64,
) -> ResultPage {
    let first = params.first_row_number();
    let entries = records
        .into_iter()
        .take(params.page_size() as usize)
        .enumerate()
        .map(|(i, record)| record.into_entry(first + i as u64, properties_type))
        .collect();
    ResultPage {
        entries,
        total_count,
    }
}
