//! Time-windowed historical queries.
//!
//! A window is the last `range.duration()` up to now, capped to the
//! `range.sample_limit()` most recent records. Results are always returned in
//! ascending timestamp order, whatever order the source delivered them in.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use smartfarm_types::{HistoricalSeries, TimeRange};

use crate::error::{Error, Result};
use crate::record::{Snapshot, decode_reading};
use crate::source::{DevicePath, RealtimeSource, RecordQuery};

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
const ISO_MILLIS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// Format an instant the way `received_at` bounds are sent to the source.
pub fn format_instant(instant: OffsetDateTime) -> Result<String> {
    instant
        .to_offset(UtcOffset::UTC)
        .format(ISO_MILLIS)
        .map_err(|e| Error::InvalidRecord(e.to_string()))
}

/// The query for `range` ending at `now`.
pub fn window_query(range: TimeRange, now: OffsetDateTime) -> Result<RecordQuery> {
    let start = format_instant(now - range.duration())?;
    Ok(RecordQuery::since(start, range.sample_limit()))
}

/// Turn a snapshot into an ordered series.
///
/// Records without a decoded payload or a usable timestamp are skipped.
pub fn decode_history(range: TimeRange, snapshot: &Snapshot) -> HistoricalSeries {
    let readings: Vec<_> = snapshot
        .children()
        .iter()
        .filter_map(|(key, record)| {
            let reading = decode_reading(record);
            if reading.is_none() {
                debug!(key = %key, "Skipping incomplete historical record");
            }
            reading
        })
        .collect();

    let skipped = snapshot.len() - readings.len();
    if skipped > 0 {
        debug!(skipped, "Historical records without payload or timestamp");
    }

    HistoricalSeries::new(range, readings)
}

/// Fetch the window `range` ending now.
pub async fn fetch_historical(
    source: &dyn RealtimeSource,
    path: &DevicePath,
    range: TimeRange,
) -> Result<HistoricalSeries> {
    fetch_historical_at(source, path, range, OffsetDateTime::now_utc()).await
}

/// Fetch the window `range` ending now, unless `cancel` fires first.
///
/// Returns [`Error::Cancelled`] when the token wins; an already cancelled
/// token never reaches the source.
pub async fn fetch_historical_cancellable(
    source: &dyn RealtimeSource,
    path: &DevicePath,
    range: TimeRange,
    cancel: &CancellationToken,
) -> Result<HistoricalSeries> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(range = %range, "Historical fetch cancelled");
            Err(Error::Cancelled)
        }
        result = fetch_historical(source, path, range) => result,
    }
}

/// Fetch the window `range` ending at `now`.
pub async fn fetch_historical_at(
    source: &dyn RealtimeSource,
    path: &DevicePath,
    range: TimeRange,
    now: OffsetDateTime,
) -> Result<HistoricalSeries> {
    let query = window_query(range, now).map_err(|e| Error::historical(range, e))?;
    debug!(
        source = source.name(),
        range = %range,
        start_at = ?query.start_at,
        limit = ?query.limit_to_last,
        "Fetching history"
    );

    let snapshot = source.query(path, &query).await.map_err(|e| {
        error!(range = %range, error = %e, "Historical query failed");
        Error::historical(range, e)
    })?;

    let series = decode_history(range, &snapshot);
    info!(range = %range, readings = series.len(), "Fetched history");
    Ok(series)
}
