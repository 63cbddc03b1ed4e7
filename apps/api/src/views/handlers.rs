//! Axum route handlers for the derived views. Every view is computed from the
//! current store snapshot plus the request's filters.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::LogEntry;
use crate::records::filters::LogFilter;
use crate::state::AppState;
use crate::views::grouping::{group_by_episode, group_by_location, LogGroup};
use crate::views::map::{build_map, MapView};
use crate::views::narrative::{build_chapters, Chapter};
use crate::views::timeline::{build_days, visible_range, ViewportSpec, VisibleRange};
use crate::views::timeseries::{aggregate, TimeSeries, TimeSeriesQuery};

async fn filtered(state: &AppState, filters: &LogFilter) -> Vec<LogEntry> {
    filters.apply(&state.store.snapshot().await, state.config.episode_gap_minutes)
}

/// GET /api/v1/timeseries
pub async fn handle_timeseries(
    State(state): State<AppState>,
    Query(query): Query<TimeSeriesQuery>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<TimeSeries>, AppError> {
    let entries = filtered(&state, &filters).await;
    Ok(Json(aggregate(&entries, &query, Utc::now())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineQuery {
    pub row_height: Option<f64>,
    pub viewport_height: Option<f64>,
    pub scroll_offset: Option<f64>,
    pub overscan: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimelineRow {
    Day { date: NaiveDate, count: usize },
    Entry { entry: Box<LogEntry> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub total_rows: usize,
    pub visible: VisibleRange,
    pub rows: Vec<TimelineRow>,
}

/// GET /api/v1/timeline
///
/// Day headers and entries flattened into rows. With `rowHeight` and
/// `viewportHeight` only the visible window (plus overscan) is returned.
pub async fn handle_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<TimelineResponse>, AppError> {
    let entries = filtered(&state, &filters).await;
    let mut rows: Vec<TimelineRow> = Vec::new();
    for day in build_days(&entries) {
        rows.push(TimelineRow::Day {
            date: day.date,
            count: day.entries.len(),
        });
        rows.extend(day.entries.into_iter().map(|e| TimelineRow::Entry { entry: Box::new(e) }));
    }

    let total_rows = rows.len();
    let visible = match (query.row_height, query.viewport_height) {
        (Some(row_height), Some(viewport_height)) => {
            if row_height <= 0.0 || viewport_height < 0.0 {
                return Err(AppError::Validation(
                    "rowHeight must be positive and viewportHeight non-negative".to_string(),
                ));
            }
            visible_range(
                total_rows,
                &ViewportSpec {
                    row_height,
                    viewport_height,
                    scroll_offset: query.scroll_offset.unwrap_or(0.0),
                    overscan: query.overscan.unwrap_or(3),
                },
            )
        }
        _ => VisibleRange {
            start: 0,
            end: total_rows,
        },
    };

    let rows = rows
        .into_iter()
        .skip(visible.start)
        .take(visible.end - visible.start)
        .collect();

    Ok(Json(TimelineResponse {
        total_rows,
        visible,
        rows,
    }))
}

/// GET /api/v1/map
pub async fn handle_map(
    State(state): State<AppState>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<MapView>, AppError> {
    let entries = filtered(&state, &filters).await;
    Ok(Json(build_map(&entries)))
}

/// GET /api/v1/narrative
pub async fn handle_narrative(
    State(state): State<AppState>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<Vec<Chapter>>, AppError> {
    let entries = filtered(&state, &filters).await;
    Ok(Json(build_chapters(&entries, state.config.episode_gap_minutes)))
}

#[derive(Debug, Deserialize)]
pub struct GroupQuery {
    pub by: String,
}

/// GET /api/v1/groups?by=location|episode
pub async fn handle_groups(
    State(state): State<AppState>,
    Query(group): Query<GroupQuery>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<Vec<LogGroup>>, AppError> {
    let entries = filtered(&state, &filters).await;
    let groups = match group.by.as_str() {
        "location" => group_by_location(&entries),
        "episode" => group_by_episode(&entries, state.config.episode_gap_minutes),
        other => {
            return Err(AppError::Validation(format!(
                "Unknown grouping '{other}', expected 'location' or 'episode'"
            )))
        }
    };
    Ok(Json(groups))
}
