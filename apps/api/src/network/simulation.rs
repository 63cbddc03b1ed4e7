//! Force-directed layout for the network graph.
//!
//! # Forces (applied once per tick, in this order)
//! - link: pulls endpoints toward a per-link target distance
//! - charge: pairwise many-body repulsion, strength by node type
//! - collide: keeps node discs (visual radius + padding) apart
//! - center: shifts the mean position onto the canvas centre
//!
//! Velocities decay by `velocity_decay` each tick and `alpha` cools from 1.0
//! toward `alpha_target`; the layout is settled once `alpha < alpha_min`.
//! After integration every position is clamped into the padded canvas.
//!
//! The pass is O(n²) per tick and CPU-bound; handlers run it inside
//! `tokio::task::spawn_blocking`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::network::model::{Graph, LinkType, NodeType};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub width: f64,
    pub height: f64,
    /// Margin kept free on every side of the canvas.
    pub padding: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub velocity_decay: f64,
    /// Extra spacing added to each node's radius by the collision force.
    pub collision_padding: f64,
    pub collision_strength: f64,
}

impl SimulationConfig {
    pub fn new(width: f64, height: f64) -> Self {
        let padding = 20.0;
        let alpha_min: f64 = 0.001;
        Self {
            width: width.max(padding * 2.0 + 1.0),
            height: height.max(padding * 2.0 + 1.0),
            padding,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            collision_padding: 4.0,
            collision_strength: 0.7,
        }
    }
}

/// Target length for a link given its type, endpoint types and observation count.
/// Top-level grouping nodes sit far apart; log spokes and same-type links stay short.
pub fn link_distance(link_type: LinkType, source: NodeType, target: NodeType, value: u32) -> f64 {
    let base = if source == NodeType::Episode && target == NodeType::Episode {
        180.0
    } else if link_type == LinkType::RecursIn {
        140.0
    } else if source == NodeType::Log || target == NodeType::Log {
        60.0
    } else if source == target {
        45.0
    } else {
        100.0
    };
    (base - 4.0 * value.saturating_sub(1) as f64).max(30.0)
}

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Body {
    id: String,
    radius: f64,
    charge: f64,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    fx: Option<f64>,
    fy: Option<f64>,
}

#[derive(Debug, Clone)]
struct Spring {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    /// Share of the correction applied to the target.
    bias: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub fixed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

pub struct Simulation {
    config: SimulationConfig,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    index: HashMap<String, usize>,
    alpha: f64,
    alpha_target: f64,
    running: bool,
    selected: Option<usize>,
    dragging: Option<usize>,
    lcg: u64,
}

impl Simulation {
    pub fn new(graph: &Graph, config: SimulationConfig) -> Self {
        let cx = config.width / 2.0;
        let cy = config.height / 2.0;
        let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());

        let bodies: Vec<Body> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let r = 10.0 * (0.5 + i as f64).sqrt();
                let angle = i as f64 * golden_angle;
                Body {
                    id: node.id.clone(),
                    radius: node.radius,
                    charge: node.node_type.charge(),
                    x: cx + r * angle.cos(),
                    y: cy + r * angle.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fx: None,
                    fy: None,
                }
            })
            .collect();

        let index: HashMap<String, usize> = bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
        let types: Vec<NodeType> = graph.nodes.iter().map(|n| n.node_type).collect();

        let mut degree = vec![0usize; bodies.len()];
        let mut endpoints = Vec::with_capacity(graph.links.len());
        for link in &graph.links {
            let (Some(&s), Some(&t)) = (index.get(&link.source), index.get(&link.target)) else {
                continue;
            };
            if s == t {
                continue;
            }
            degree[s] += 1;
            degree[t] += 1;
            endpoints.push((s, t, link));
        }

        let springs = endpoints
            .into_iter()
            .map(|(s, t, link)| Spring {
                source: s,
                target: t,
                distance: link_distance(link.link_type, types[s], types[t], link.value),
                strength: 1.0 / degree[s].min(degree[t]) as f64,
                bias: degree[s] as f64 / (degree[s] + degree[t]) as f64,
            })
            .collect();

        Self {
            config,
            bodies,
            springs,
            index,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            selected: None,
            dragging: None,
            lcg: 1,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Advances one step. Returns `false` (and does nothing) while paused.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_charge(alpha);
        self.apply_collision();
        self.apply_center();

        let keep = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            match body.fx {
                Some(fx) => {
                    body.x = fx;
                    body.vx = 0.0;
                }
                None => {
                    body.vx *= keep;
                    body.x += body.vx;
                }
            }
            match body.fy {
                Some(fy) => {
                    body.y = fy;
                    body.vy = 0.0;
                }
                None => {
                    body.vy *= keep;
                    body.y += body.vy;
                }
            }
        }
        self.clamp_to_canvas();
        true
    }

    /// Ticks until settled, paused, or `max_ticks` is reached. Returns ticks run.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_settled() && self.tick() {
            ticks += 1;
        }
        ticks
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.selected = id.and_then(|id| self.index.get(id).copied());
    }

    /// Pins a node at a fixed position.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let body = &mut self.bodies[i];
        body.fx = Some(x);
        body.fy = Some(y);
        body.x = x;
        body.y = y;
        true
    }

    /// Starts a drag: pins the node where it is and reheats the layout.
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.alpha_target = 0.3;
        self.alpha = self.alpha.max(0.3);
        self.dragging = Some(i);
        let body = &mut self.bodies[i];
        body.fx = Some(body.x);
        body.fy = Some(body.y);
        true
    }

    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.index.get(id) {
            Some(&i) if self.dragging == Some(i) => {
                self.bodies[i].fx = Some(x);
                self.bodies[i].fy = Some(y);
                true
            }
            _ => false,
        }
    }

    /// Ends a drag. The pin is released unless the node is the selected one.
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.alpha_target = 0.0;
        self.dragging = None;
        if self.selected != Some(i) {
            self.bodies[i].fx = None;
            self.bodies[i].fy = None;
        }
        true
    }

    #[cfg(test)]
    pub fn is_pinned(&self, id: &str) -> bool {
        self.index
            .get(id)
            .map(|&i| self.bodies[i].fx.is_some())
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub fn position(&self, id: &str) -> Option<(f64, f64)> {
        self.index.get(id).map(|&i| (self.bodies[i].x, self.bodies[i].y))
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.bodies
            .iter()
            .map(|b| NodePosition {
                id: b.id.clone(),
                x: b.x,
                y: b.y,
                fixed: b.fx.is_some(),
            })
            .collect()
    }

    /// Extent of all node discs, or `None` for an empty layout.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.bodies.first()?;
        let init = Bounds {
            min_x: first.x - first.radius,
            min_y: first.y - first.radius,
            max_x: first.x + first.radius,
            max_y: first.y + first.radius,
        };
        Some(self.bodies.iter().fold(init, |acc, b| Bounds {
            min_x: acc.min_x.min(b.x - b.radius),
            min_y: acc.min_y.min(b.y - b.radius),
            max_x: acc.max_x.max(b.x + b.radius),
            max_y: acc.max_y.max(b.y + b.radius),
        }))
    }

    // ────────────────────────────────────────────────────────────────────────
    // Forces
    // ────────────────────────────────────────────────────────────────────────

    fn apply_links(&mut self, alpha: f64) {
        for i in 0..self.springs.len() {
            let Spring {
                source,
                target,
                distance,
                strength,
                bias,
            } = self.springs[i].clone();
            let (s, t) = (&self.bodies[source], &self.bodies[target]);
            let mut x = t.x + t.vx - s.x - s.vx;
            let mut y = t.y + t.vy - s.y - s.vy;
            if x == 0.0 {
                x = self.jiggle();
            }
            if y == 0.0 {
                y = self.jiggle();
            }
            let len = (x * x + y * y).sqrt();
            let k = (len - distance) / len * alpha * strength;
            x *= k;
            y *= k;
            self.bodies[target].vx -= x * bias;
            self.bodies[target].vy -= y * bias;
            self.bodies[source].vx += x * (1.0 - bias);
            self.bodies[source].vy += y * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self, alpha: f64) {
        let n = self.bodies.len();
        let mut dv = vec![(0.0f64, 0.0f64); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.bodies[j].x - self.bodies[i].x;
                let mut y = self.bodies[j].y - self.bodies[i].y;
                if x == 0.0 {
                    x = self.jiggle();
                }
                if y == 0.0 {
                    y = self.jiggle();
                }
                let mut l = x * x + y * y;
                if l < 1.0 {
                    l = l.sqrt();
                }
                let w = self.bodies[j].charge * alpha / l;
                dv[i].0 += x * w;
                dv[i].1 += y * w;
            }
        }
        for (body, (dx, dy)) in self.bodies.iter_mut().zip(dv) {
            body.vx += dx;
            body.vy += dy;
        }
    }

    fn apply_collision(&mut self) {
        let n = self.bodies.len();
        let strength = self.config.collision_strength;
        let pad = self.config.collision_padding;
        for i in 0..n {
            for j in (i + 1)..n {
                let ri = self.bodies[i].radius + pad;
                let rj = self.bodies[j].radius + pad;
                let r = ri + rj;
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                let mut x = a.x + a.vx - b.x - b.vx;
                let mut y = a.y + a.vy - b.y - b.vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.jiggle();
                    l += y * y;
                }
                let len = l.sqrt();
                let k = (r - len) / len * strength;
                x *= k;
                y *= k;
                let share = (rj * rj) / (ri * ri + rj * rj);
                self.bodies[i].vx += x * share;
                self.bodies[i].vy += y * share;
                self.bodies[j].vx -= x * (1.0 - share);
                self.bodies[j].vy -= y * (1.0 - share);
            }
        }
    }

    fn apply_center(&mut self) {
        let n = self.bodies.len();
        if n == 0 {
            return;
        }
        let (sx, sy) = self
            .bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        let dx = sx / n as f64 - self.config.width / 2.0;
        let dy = sy / n as f64 - self.config.height / 2.0;
        for body in &mut self.bodies {
            body.x -= dx;
            body.y -= dy;
        }
    }

    fn clamp_to_canvas(&mut self) {
        let pad = self.config.padding;
        let (max_x, max_y) = (self.config.width - pad, self.config.height - pad);
        for body in &mut self.bodies {
            body.x = body.x.clamp(pad, max_x);
            body.y = body.y.clamp(pad, max_y);
        }
    }

    /// Tiny deterministic offset for coincident points (linear congruential generator).
    fn jiggle(&mut self) -> f64 {
        self.lcg = (1_664_525u64 * self.lcg + 1_013_904_223) % 4_294_967_296;
        (self.lcg as f64 / 4_294_967_296.0 - 0.5) * 1e-6
    }
}
