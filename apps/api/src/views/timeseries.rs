//! Time-series aggregation: bucket records by hour/day/week/month inside a
//! trailing window, optionally split by a dimension, and describe how each
//! series should be drawn for the chosen chart kind.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::LogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    #[default]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    pub fn days(self) -> Option<i64> {
        match self {
            TimeWindow::Days7 => Some(7),
            TimeWindow::Days30 => Some(30),
            TimeWindow::Days90 => Some(90),
            TimeWindow::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitBy {
    Category,
    Location,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Area,
    Combined,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMark {
    Line,
    Bar,
    Area,
    Point,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeSeriesQuery {
    pub granularity: Granularity,
    pub window: TimeWindow,
    pub split_by: Option<SplitBy>,
    pub chart: ChartKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRow {
    pub bucket: String,
    pub start: DateTime<Utc>,
    pub total: usize,
    pub cumulative: usize,
    pub values: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub key: String,
    pub mark: SeriesMark,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub granularity: Granularity,
    pub window: TimeWindow,
    pub chart: ChartKind,
    pub series: Vec<SeriesSpec>,
    pub rows: Vec<TimeSeriesRow>,
}

/// Start of the bucket containing `ts`. Weeks start on Monday.
pub fn bucket_start(ts: DateTime<Utc>, granularity: Granularity) -> DateTime<Utc> {
    let date = ts.date_naive();
    let naive = match granularity {
        Granularity::Hour => date.and_hms_opt(ts.hour(), 0, 0),
        Granularity::Day => date.and_hms_opt(0, 0, 0),
        Granularity::Week => {
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.and_hms_opt(0, 0, 0)
        }
        Granularity::Month => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    };
    naive.map(|n| Utc.from_utc_datetime(&n)).unwrap_or(ts)
}

pub fn bucket_key(start: DateTime<Utc>, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hour => start.format("%Y-%m-%d %H:00").to_string(),
        Granularity::Day | Granularity::Week => start.format("%Y-%m-%d").to_string(),
        Granularity::Month => start.format("%Y-%m").to_string(),
    }
}

fn split_value(entry: &LogEntry, split: SplitBy) -> String {
    match split {
        SplitBy::Category => entry.category.clone(),
        SplitBy::Location => entry.location.clone(),
        SplitBy::Status => entry.status.to_string(),
    }
}

/// Marks per series. Combined draws the split series as bars under a total line.
fn series_specs(keys: &BTreeSet<String>, chart: ChartKind) -> Vec<SeriesSpec> {
    let mark_for = |chart: ChartKind| match chart {
        ChartKind::Line => SeriesMark::Line,
        ChartKind::Bar | ChartKind::Combined => SeriesMark::Bar,
        ChartKind::Area => SeriesMark::Area,
        ChartKind::Scatter => SeriesMark::Point,
    };
    let mut specs: Vec<SeriesSpec> = if keys.is_empty() {
        vec![SeriesSpec {
            key: "total".to_string(),
            mark: if chart == ChartKind::Combined {
                SeriesMark::Line
            } else {
                mark_for(chart)
            },
        }]
    } else {
        keys.iter()
            .map(|k| SeriesSpec {
                key: k.clone(),
                mark: mark_for(chart),
            })
            .collect()
    };
    if chart == ChartKind::Combined {
        if !keys.is_empty() {
            specs.push(SeriesSpec {
                key: "total".to_string(),
                mark: SeriesMark::Line,
            });
        }
        specs.push(SeriesSpec {
            key: "cumulative".to_string(),
            mark: SeriesMark::Area,
        });
    }
    specs
}

pub fn aggregate(entries: &[LogEntry], query: &TimeSeriesQuery, now: DateTime<Utc>) -> TimeSeries {
    let cutoff = query.window.days().map(|d| now - Duration::days(d));

    let mut buckets: BTreeMap<DateTime<Utc>, BTreeMap<String, usize>> = BTreeMap::new();
    let mut totals: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    let mut keys: BTreeSet<String> = BTreeSet::new();

    for entry in entries {
        if cutoff.is_some_and(|c| entry.timestamp < c) || entry.timestamp > now {
            continue;
        }
        let start = bucket_start(entry.timestamp, query.granularity);
        *totals.entry(start).or_insert(0) += 1;
        let values = buckets.entry(start).or_default();
        if let Some(split) = query.split_by {
            let key = split_value(entry, split);
            *values.entry(key.clone()).or_insert(0) += 1;
            keys.insert(key);
        }
    }

    let mut cumulative = 0usize;
    let rows = totals
        .into_iter()
        .map(|(start, total)| {
            cumulative += total;
            let mut values = buckets.remove(&start).unwrap_or_default();
            for key in &keys {
                values.entry(key.clone()).or_insert(0);
            }
            TimeSeriesRow {
                bucket: bucket_key(start, query.granularity),
                start,
                total,
                cumulative,
                values,
            }
        })
        .collect();

    TimeSeries {
        granularity: query.granularity,
        window: query.window,
        chart: query.chart,
        series: series_specs(&keys, query.chart),
        rows,
    }
}
