//! Engagement feature extraction
//!
//! Reduces each customer's variable-length event stream into a fixed
//! feature record: event count, distinct active days, recency, trend,
//! average duration and total value.

use crate::types::{
    ActivityEvent, ActivityTable, CustomerTable, EngagementFeatures, TimeColumn, Trend,
    NEVER_SEEN_RECENCY_DAYS,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};

/// Minimum event count before a trend is measured
const MIN_EVENTS_FOR_TREND: usize = 3;

/// Number of events at each end of the history compared for trend
const TREND_WINDOW: usize = 3;

/// Recent/old density ratio below which engagement is decreasing
const DECREASING_RATIO: f64 = 0.5;

/// Recent/old density ratio above which engagement is increasing
const INCREASING_RATIO: f64 = 1.5;

const SECONDS_PER_DAY: i64 = 86_400;

/// Feature extractor for customer activity
pub struct EngagementExtractor;

impl EngagementExtractor {
    /// Extract one feature record per distinct customer, in first-seen order
    ///
    /// `now` is the reference time for recency. When the table has no time
    /// column every event is placed at `now`; otherwise undated events count
    /// towards `total_activities` only.
    pub fn extract(
        customers: &CustomerTable,
        activities: &ActivityTable,
        now: DateTime<Utc>,
    ) -> Vec<EngagementFeatures> {
        let customer_ids = distinct_ids(customers);

        if activities.is_empty() {
            return customer_ids
                .into_iter()
                .map(EngagementFeatures::without_activity_data)
                .collect();
        }

        let synthetic_time = activities.time_column == TimeColumn::Synthetic;
        let mut by_customer: HashMap<&str, Vec<&ActivityEvent>> = HashMap::new();
        for event in &activities.events {
            if let Some(id) = event.customer_id.as_deref() {
                by_customer.entry(id).or_default().push(event);
            }
        }

        customer_ids
            .into_iter()
            .map(|id| match by_customer.get(id) {
                Some(events) if !events.is_empty() => {
                    customer_features(id, events, now, synthetic_time)
                }
                _ => EngagementFeatures::inactive(id),
            })
            .collect()
    }
}

fn distinct_ids(customers: &CustomerTable) -> Vec<&str> {
    let mut seen = HashSet::new();
    customers
        .customers
        .iter()
        .map(|c| c.customer_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect()
}

fn customer_features(
    customer_id: &str,
    events: &[&ActivityEvent],
    now: DateTime<Utc>,
    synthetic_time: bool,
) -> EngagementFeatures {
    let mut times: Vec<DateTime<Utc>> = events
        .iter()
        .filter_map(|e| match e.occurred_at {
            None if synthetic_time => Some(now),
            occurred_at => occurred_at,
        })
        .collect();
    times.sort();

    let active_days = distinct_dates(&times);
    let recency_days = match times.last() {
        Some(latest) => whole_days_between(*latest, now),
        None => NEVER_SEEN_RECENCY_DAYS,
    };

    let durations: Vec<f64> = events.iter().filter_map(|e| e.duration).collect();
    let avg_duration = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };
    let total_value: f64 = events.iter().filter_map(|e| e.value).sum();

    EngagementFeatures {
        customer_id: customer_id.to_string(),
        total_activities: events.len(),
        active_days,
        recency_days,
        frequency_trend: compute_trend(&times),
        avg_duration: Some(avg_duration),
        total_value: Some(total_value),
    }
}

/// Floored whole days from `from` to `to`; negative when `from` is later
fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn distinct_dates(times: &[DateTime<Utc>]) -> usize {
    times
        .iter()
        .map(|t| t.date_naive())
        .collect::<HashSet<NaiveDate>>()
        .len()
}

/// Compare activity density at the start and end of a sorted history
///
/// Counts distinct dates among the first and last three events. Only strict
/// inequalities move the label away from `Stable`.
fn compute_trend(sorted_times: &[DateTime<Utc>]) -> Trend {
    if sorted_times.len() < MIN_EVENTS_FOR_TREND {
        return Trend::Stable;
    }

    let old = distinct_dates(&sorted_times[..TREND_WINDOW]) as f64;
    let recent = distinct_dates(&sorted_times[sorted_times.len() - TREND_WINDOW..]) as f64;

    if recent < old * DECREASING_RATIO {
        Trend::Decreasing
    } else if recent > old * INCREASING_RATIO {
        Trend::Increasing
    } else {
        Trend::Stable
    }
}
