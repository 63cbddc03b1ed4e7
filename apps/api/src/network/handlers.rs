//! Axum route handlers for the network graph view.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::network::builder::{build_graph, GraphOptions};
use crate::network::model::{Graph, GraphLink, GraphNode};
use crate::network::path::{neighborhood, path_links, shortest_path, Highlight};
use crate::network::reveal::{reveal_sequence, RevealStep};
use crate::network::simulation::{NodePosition, Simulation, SimulationConfig};
use crate::network::viewport::ViewTransform;
use crate::records::filters::LogFilter;
use crate::state::AppState;

const DEFAULT_TICKS: usize = 300;
const MAX_TICKS: usize = 1_000;
const FIT_MARGIN: f64 = 40.0;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PinnedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A drag gesture replayed before the layout runs. Coordinates are in screen
/// space when the request carries a `view.transform`, world space otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct DragGesture {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// The pointer was released; the pin is kept only for the selected node.
    #[serde(default)]
    pub release: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PanGesture {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ZoomGesture {
    /// Screen point kept fixed while scaling.
    pub x: f64,
    pub y: f64,
    pub factor: f64,
}

/// Client zoom/pan state. Without `transform` the fitted transform is the base.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewGesture {
    pub transform: Option<ViewTransform>,
    pub pan: Option<PanGesture>,
    pub zoom: Option<ZoomGesture>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkRequest {
    pub filters: LogFilter,
    /// Run the force layout and return positions.
    pub layout: bool,
    pub ticks: Option<usize>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub selected: Option<String>,
    pub pinned: Vec<PinnedNode>,
    /// Paused layouts are returned as they stand, without ticking.
    pub paused: bool,
    pub drag: Option<DragGesture>,
    pub view: Option<ViewGesture>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub positions: Vec<NodePosition>,
    pub transform: ViewTransform,
    pub ticks: usize,
    pub settled: bool,
    pub alpha: f64,
    pub running: bool,
}

struct LayoutOptions {
    width: f64,
    height: f64,
    ticks: usize,
    selected: Option<String>,
    pinned: Vec<PinnedNode>,
    paused: bool,
    drag: Option<DragGesture>,
    view: Option<ViewGesture>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub reveal: Vec<RevealStep>,
    pub layout: Option<LayoutResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRequest {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub filters: LogFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResponse {
    pub found: bool,
    pub path: Option<Vec<String>>,
    pub link_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodRequest {
    pub id: String,
    #[serde(default)]
    pub filters: LogFilter,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

async fn current_graph(state: &AppState, filters: &LogFilter) -> (Graph, Vec<crate::models::LogEntry>) {
    let gap = state.config.episode_gap_minutes;
    let entries = filters.apply(&state.store.snapshot().await, gap);
    let options = GraphOptions {
        episode_gap_minutes: gap,
    };
    (build_graph(&entries, &options), entries)
}

/// POST /api/v1/network
///
/// Builds the graph for the filtered records, its reveal sequence, and
/// optionally a settled layout.
pub async fn handle_network(
    State(state): State<AppState>,
    Json(request): Json<NetworkRequest>,
) -> Result<Json<NetworkResponse>, AppError> {
    let (graph, entries) = current_graph(&state, &request.filters).await;
    let reveal = reveal_sequence(&graph, &entries);

    let layout = if request.layout {
        let width = request.width.unwrap_or(state.config.canvas_width);
        let height = request.height.unwrap_or(state.config.canvas_height);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(AppError::Validation(
                "width and height must be positive numbers".to_string(),
            ));
        }
        if let Some(drag) = &request.drag {
            if !graph.contains(&drag.id) {
                return Err(AppError::NotFound(format!("Node {} not found", drag.id)));
            }
        }
        if let Some(zoom) = request.view.as_ref().and_then(|v| v.zoom) {
            if !(zoom.factor.is_finite() && zoom.factor > 0.0) {
                return Err(AppError::Validation(
                    "zoom factor must be a positive number".to_string(),
                ));
            }
        }
        let options = LayoutOptions {
            width,
            height,
            ticks: request.ticks.unwrap_or(DEFAULT_TICKS).min(MAX_TICKS),
            selected: request.selected,
            pinned: request.pinned,
            paused: request.paused,
            drag: request.drag,
            view: request.view,
        };
        Some(run_layout(graph.clone(), options).await?)
    } else {
        None
    };

    info!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        steps = reveal.len(),
        layout = layout.is_some(),
        "Served network graph"
    );

    Ok(Json(NetworkResponse {
        nodes: graph.nodes,
        links: graph.links,
        reveal,
        layout,
    }))
}

/// CPU-bound layout on the blocking pool.
async fn run_layout(graph: Graph, options: LayoutOptions) -> Result<LayoutResult, AppError> {
    tokio::task::spawn_blocking(move || layout_graph(&graph, options))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))
}

fn layout_graph(graph: &Graph, options: LayoutOptions) -> LayoutResult {
    let config = SimulationConfig::new(options.width, options.height);
    let mut sim = Simulation::new(graph, config.clone());
    sim.select(options.selected.as_deref());
    for pin in &options.pinned {
        sim.pin(&pin.id, pin.x, pin.y);
    }

    let view = options.view.unwrap_or_default();
    if let Some(drag) = &options.drag {
        let (x, y) = match view.transform {
            Some(transform) => transform.invert((drag.x, drag.y)),
            None => (drag.x, drag.y),
        };
        sim.drag_start(&drag.id);
        sim.drag_to(&drag.id, x, y);
        if drag.release {
            sim.drag_end(&drag.id);
        }
    }
    if options.paused {
        sim.pause();
    }

    let ran = sim.run(options.ticks);

    let base = view.transform.unwrap_or_else(|| {
        sim.bounds()
            .map(|b| ViewTransform::fit(b, config.width, config.height, FIT_MARGIN))
            .unwrap_or_default()
    });
    let panned = match view.pan {
        Some(pan) => base.pan(pan.dx, pan.dy),
        None => base,
    };
    let transform = match view.zoom {
        Some(zoom) => panned.zoom_at((zoom.x, zoom.y), zoom.factor),
        None => panned,
    };

    LayoutResult {
        positions: sim.positions(),
        transform,
        ticks: ran,
        settled: sim.is_settled(),
        alpha: sim.alpha(),
        running: sim.is_running(),
    }
}

/// POST /api/v1/network/path
pub async fn handle_path(
    State(state): State<AppState>,
    Json(request): Json<PathRequest>,
) -> Result<Json<PathResponse>, AppError> {
    if request.source.trim().is_empty() || request.target.trim().is_empty() {
        return Err(AppError::Validation(
            "source and target are required".to_string(),
        ));
    }
    let (graph, _) = current_graph(&state, &request.filters).await;
    let path = shortest_path(&graph.links, &request.source, &request.target);
    let link_ids = path
        .as_deref()
        .map(|p| path_links(p, &graph.links))
        .unwrap_or_default();
    Ok(Json(PathResponse {
        found: path.is_some(),
        path,
        link_ids,
    }))
}

/// POST /api/v1/network/neighborhood
pub async fn handle_neighborhood(
    State(state): State<AppState>,
    Json(request): Json<NeighborhoodRequest>,
) -> Result<Json<Highlight>, AppError> {
    let (graph, _) = current_graph(&state, &request.filters).await;
    if !graph.contains(&request.id) {
        return Err(AppError::NotFound(format!("Node {} not found", request.id)));
    }
    Ok(Json(neighborhood(&graph.links, &request.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::builder::build_graph;
    use crate::records::seed::sample_logs;

    fn options() -> LayoutOptions {
        LayoutOptions {
            width: 1200.0,
            height: 800.0,
            ticks: 200,
            selected: None,
            pinned: Vec::new(),
            paused: false,
            drag: None,
            view: None,
        }
    }

    fn graph() -> Graph {
        build_graph(&sample_logs(), &GraphOptions::default())
    }

    fn position<'a>(result: &'a LayoutResult, id: &str) -> &'a NodePosition {
        result.positions.iter().find(|p| p.id == id).unwrap()
    }

    #[test]
    fn test_paused_layout_does_not_tick() {
        let result = layout_graph(
            &graph(),
            LayoutOptions {
                paused: true,
                ..options()
            },
        );
        assert_eq!(result.ticks, 0);
        assert!(!result.running);
        assert_eq!(result.alpha, 1.0);
    }

    #[test]
    fn test_held_drag_pins_node_at_pointer() {
        let result = layout_graph(
            &graph(),
            LayoutOptions {
                drag: Some(DragGesture {
                    id: "location:site office".to_string(),
                    x: 150.0,
                    y: 200.0,
                    release: false,
                }),
                ..options()
            },
        );
        let office = position(&result, "location:site office");
        assert!(office.fixed);
        assert_eq!((office.x, office.y), (150.0, 200.0));
        assert!(result.running);
    }

    #[test]
    fn test_released_drag_keeps_pin_only_when_selected() {
        let drag = DragGesture {
            id: "episode:ep-1".to_string(),
            x: 300.0,
            y: 300.0,
            release: true,
        };
        let released = layout_graph(
            &graph(),
            LayoutOptions {
                drag: Some(drag.clone()),
                ..options()
            },
        );
        assert!(!position(&released, "episode:ep-1").fixed);

        let selected = layout_graph(
            &graph(),
            LayoutOptions {
                drag: Some(drag),
                selected: Some("episode:ep-1".to_string()),
                ..options()
            },
        );
        assert!(position(&selected, "episode:ep-1").fixed);
    }

    #[test]
    fn test_drag_in_screen_space_is_inverted() {
        let transform = ViewTransform {
            k: 2.0,
            x: 100.0,
            y: 50.0,
        };
        let result = layout_graph(
            &graph(),
            LayoutOptions {
                drag: Some(DragGesture {
                    id: "location:site office".to_string(),
                    x: 500.0,
                    y: 450.0,
                    release: false,
                }),
                view: Some(ViewGesture {
                    transform: Some(transform),
                    ..Default::default()
                }),
                ..options()
            },
        );
        let office = position(&result, "location:site office");
        assert_eq!((office.x, office.y), (200.0, 200.0));
        assert_eq!(result.transform, transform);
    }

    #[test]
    fn test_view_gestures_pan_then_zoom() {
        let base = ViewTransform::default();
        let result = layout_graph(
            &graph(),
            LayoutOptions {
                view: Some(ViewGesture {
                    transform: Some(base),
                    pan: Some(PanGesture { dx: 10.0, dy: 20.0 }),
                    zoom: Some(ZoomGesture {
                        x: 0.0,
                        y: 0.0,
                        factor: 2.0,
                    }),
                }),
                ..options()
            },
        );
        let expected = base.pan(10.0, 20.0).zoom_at((0.0, 0.0), 2.0);
        assert_eq!(result.transform, expected);
        assert_eq!(result.transform.k, 2.0);
    }
}
