//! Calendar-day bucketing of timestamped events.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// The number of events that fell on one UTC calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub count: u64,
}

/// Half-open instant window `[date_from 00:00, date_to + 1 day 00:00)` covering
/// both dates in full. `None` when the range is empty or `date_to` is the last
/// representable date.
pub fn day_window(
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if date_from > date_to {
        return None;
    }
    let end = date_to.checked_add_days(Days::new(1))?;
    Some((start_of_day(date_from), start_of_day(end)))
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Count events per calendar date over the inclusive range `date_from..=date_to`.
///
/// Only dates with at least one event get a bucket. Buckets come out in
/// ascending date order. A reversed range yields no buckets.
pub fn bucket_by_day<I>(events: I, date_from: NaiveDate, date_to: NaiveDate) -> Vec<DayBucket>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let Some((start, end)) = day_window(date_from, date_to) else {
        return Vec::new();
    };

    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for at in events {
        if at >= start && at < end {
            *counts.entry(at.date_naive()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(day, count)| DayBucket { day, count })
        .collect()
}
