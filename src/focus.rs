// src/focus.rs

//! Spatial keyboard-focus navigation.
//!
//! A `FocusGraph` holds rectangular nodes grouped into named scopes, optional explicit
//! per-direction links, and line-segment blockers. `move_focus` picks the next node in
//! a direction:
//!
//! 1. **Recovery.** If the current node is gone, unfocusable or outside the active
//!    scope, focus snaps to the first focusable node of the active scope.
//! 2. **Explicit link.** `nav[direction]` wins when its target is focusable, lives in the
//!    link's scope and the jump is not blocked.
//! 3. **Geometric search.** Candidates strictly on the requested side are scored
//!    `primary + 2·secondary`; ties go to the nearer center, then to insertion order.
//! 4. **Linear fallback.** Walk insertion order forwards (down/right) or backwards
//!    (up/left) to the first reachable node.
//!
//! A jump is blocked when the segment between the two node centers touches an enabled
//! blocker of the current scope. Mutators never panic; they report success as `bool`.

use crate::geometry::{segments_intersect, Point, Rect};
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SCOPE: &str = "default";

/// Two centers closer than this are the same point and never blocked.
const SAME_POINT_EPSILON: f64 = 1e-9;
/// Minimum displacement for a candidate to count as "on the requested side".
const SIDE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown focus direction '{0}'")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Direction::Up),
            "d" | "down" => Ok(Direction::Down),
            "l" | "left" => Ok(Direction::Left),
            "r" | "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

impl Direction {
    /// Forward in insertion order for down/right, backward for up/left.
    fn walks_forward(self) -> bool {
        matches!(self, Direction::Down | Direction::Right)
    }

    /// `(score, distance²)` for a candidate displaced by `(dx, dy)`, or `None` when the
    /// candidate is not strictly on this side.
    fn score(self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let (primary, secondary) = match self {
            Direction::Up if dy < -SIDE_EPSILON => (-dy, dx.abs()),
            Direction::Down if dy > SIDE_EPSILON => (dy, dx.abs()),
            Direction::Left if dx < -SIDE_EPSILON => (-dx, dy.abs()),
            Direction::Right if dx > SIDE_EPSILON => (dx, dy.abs()),
            _ => return None,
        };
        Some((primary + 2.0 * secondary, dx * dx + dy * dy))
    }
}

/// An explicit navigation link. `scope: None` means the scope the move starts in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTarget {
    pub scope: Option<String>,
    pub id: String,
}

impl NavTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            scope: None,
            id: id.into(),
        }
    }

    pub fn in_scope(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            id: id.into(),
        }
    }
}

impl From<&str> for NavTarget {
    fn from(id: &str) -> Self {
        NavTarget::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusNode {
    pub id: String,
    pub rect: Rect,
    pub enabled: bool,
    pub visible: bool,
    pub nav: HashMap<Direction, NavTarget>,
    pub scope: String,
}

impl FocusNode {
    pub fn is_focusable(&self) -> bool {
        self.enabled && self.visible && self.rect.has_area()
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    fn reachable_in(&self, scope: &str) -> bool {
        self.scope == scope && self.is_focusable()
    }
}

/// Everything about a node except its id and rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOptions {
    pub enabled: bool,
    pub visible: bool,
    pub nav: HashMap<Direction, NavTarget>,
    pub scope: String,
}

impl Default for NodeOptions {
    fn default() -> Self {
        NodeOptions {
            enabled: true,
            visible: true,
            nav: HashMap::new(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl NodeOptions {
    pub fn scope(scope: impl Into<String>) -> Self {
        NodeOptions {
            scope: scope.into(),
            ..NodeOptions::default()
        }
    }

    pub fn link(mut self, direction: Direction, target: impl Into<NavTarget>) -> Self {
        self.nav.insert(direction, target.into());
        self
    }
}

/// Partial node update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusNodeUpdate {
    pub rect: Option<Rect>,
    pub enabled: Option<bool>,
    pub visible: Option<bool>,
    pub nav: Option<HashMap<Direction, NavTarget>>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusBlocker {
    pub id: String,
    pub p1: Point,
    pub p2: Point,
    pub scope: String,
    pub enabled: bool,
}

/// Partial blocker update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockerUpdate {
    pub p1: Option<Point>,
    pub p2: Option<Point>,
    pub scope: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct FocusGraph {
    nodes: IndexMap<String, FocusNode>,
    blockers: IndexMap<String, FocusBlocker>,
    current: Option<String>,
    active_scope: String,
}

impl Default for FocusGraph {
    fn default() -> Self {
        FocusGraph {
            nodes: IndexMap::new(),
            blockers: IndexMap::new(),
            current: None,
            active_scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl FocusGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all nodes and blockers and returns to the default scope.
    pub fn clear(&mut self) {
        *self = FocusGraph::default();
    }

    // --- Nodes ---

    /// Inserts or replaces a node. A new id is appended to the insertion order; a
    /// replaced node keeps its position. Returns `false` for an empty id.
    ///
    /// If nothing is focused and the node is focusable in the active scope, it becomes
    /// the current node.
    pub fn add_node(&mut self, id: impl Into<String>, rect: Rect, options: NodeOptions) -> bool {
        let id = id.into();
        if id.is_empty() {
            return false;
        }
        let node = FocusNode {
            id: id.clone(),
            rect: Rect::new(rect.x, rect.y, rect.w, rect.h),
            enabled: options.enabled,
            visible: options.visible,
            nav: options.nav,
            scope: options.scope,
        };
        let takes_focus = self.current.is_none() && node.reachable_in(&self.active_scope);
        trace!("FocusGraph: add node '{}' {:?}", id, node.rect);
        self.nodes.insert(id.clone(), node);
        if takes_focus {
            debug!("FocusGraph: '{}' takes initial focus", id);
            self.current = Some(id);
        }
        true
    }

    pub fn update_node(&mut self, id: &str, update: FocusNodeUpdate) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if let Some(r) = update.rect {
            node.rect = Rect::new(r.x, r.y, r.w, r.h);
        }
        if let Some(enabled) = update.enabled {
            node.enabled = enabled;
        }
        if let Some(visible) = update.visible {
            node.visible = visible;
        }
        if let Some(nav) = update.nav {
            node.nav = nav;
        }
        if let Some(scope) = update.scope {
            node.scope = scope;
        }
        true
    }

    /// Removes a node. Removing the current node refocuses the first focusable node of
    /// the active scope.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if self.nodes.shift_remove(id).is_none() {
            return false;
        }
        if self.current.as_deref() == Some(id) {
            self.current = self.first_in_scope(&self.active_scope);
            debug!("FocusGraph: removed current node, focus -> {:?}", self.current);
        }
        true
    }

    pub fn node(&self, id: &str) -> Option<&FocusNode> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FocusNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // --- Focus & scopes ---

    pub fn focus(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Focuses a focusable node, optionally making its scope the active one.
    pub fn set_focus(&mut self, id: &str, activate_scope: bool) -> bool {
        let Some(node) = self.nodes.get(id).filter(|n| n.is_focusable()) else {
            return false;
        };
        if activate_scope {
            self.active_scope = node.scope.clone();
        }
        self.current = Some(id.to_string());
        true
    }

    pub fn active_scope(&self) -> &str {
        &self.active_scope
    }

    /// Switches the active scope. When the current node does not belong to it and
    /// `pick_first` is set, focus moves to the scope's first focusable node (or none).
    pub fn set_active_scope(&mut self, scope: &str, pick_first: bool) -> &str {
        self.active_scope = scope.to_string();
        let current_fits = self
            .current
            .as_deref()
            .and_then(|id| self.nodes.get(id))
            .map(|n| n.reachable_in(scope))
            .unwrap_or(false);
        if !current_fits && pick_first {
            self.current = self.first_in_scope(scope);
        }
        &self.active_scope
    }

    /// Scope of `id`, or of the current node when `id` is `None`.
    pub fn focus_scope(&self, id: Option<&str>) -> Option<&str> {
        let id = id.or(self.current.as_deref())?;
        self.nodes.get(id).map(|n| n.scope.as_str())
    }

    /// Distinct node scopes in first-seen order; `["default"]` when there are no nodes.
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for node in self.nodes.values() {
            if !scopes.contains(&node.scope) {
                scopes.push(node.scope.clone());
            }
        }
        if scopes.is_empty() {
            scopes.push(DEFAULT_SCOPE.to_string());
        }
        scopes
    }

    fn first_in_scope(&self, scope: &str) -> Option<String> {
        self.nodes
            .values()
            .find(|n| n.reachable_in(scope))
            .map(|n| n.id.clone())
    }

    // --- Blockers ---

    /// Inserts or replaces a blocker. Returns `false` for an empty id.
    pub fn add_blocker(
        &mut self,
        id: impl Into<String>,
        p1: Point,
        p2: Point,
        scope: impl Into<String>,
        enabled: bool,
    ) -> bool {
        let id = id.into();
        if id.is_empty() {
            return false;
        }
        let blocker = FocusBlocker {
            id: id.clone(),
            p1,
            p2,
            scope: scope.into(),
            enabled,
        };
        trace!("FocusGraph: add blocker {:?}", blocker);
        self.blockers.insert(id, blocker);
        true
    }

    pub fn update_blocker(&mut self, id: &str, update: BlockerUpdate) -> bool {
        let Some(blocker) = self.blockers.get_mut(id) else {
            return false;
        };
        if let Some(p1) = update.p1 {
            blocker.p1 = p1;
        }
        if let Some(p2) = update.p2 {
            blocker.p2 = p2;
        }
        if let Some(scope) = update.scope {
            blocker.scope = scope;
        }
        if let Some(enabled) = update.enabled {
            blocker.enabled = enabled;
        }
        true
    }

    pub fn remove_blocker(&mut self, id: &str) -> bool {
        self.blockers.shift_remove(id).is_some()
    }

    /// Removes every blocker, or only those of `scope`. Returns how many were removed.
    pub fn clear_blockers(&mut self, scope: Option<&str>) -> usize {
        let before = self.blockers.len();
        match scope {
            None => self.blockers.clear(),
            Some(scope) => self.blockers.retain(|_, b| b.scope != scope),
        }
        before - self.blockers.len()
    }

    /// Blockers in insertion order, optionally filtered by scope.
    pub fn blockers(&self, scope: Option<&str>) -> Vec<&FocusBlocker> {
        self.blockers
            .values()
            .filter(|b| scope.map_or(true, |s| b.scope == s))
            .collect()
    }

    /// True when the segment `p1–p2` touches an enabled blocker of `scope`.
    pub fn is_jump_blocked(&self, p1: Point, p2: Point, scope: &str) -> bool {
        if p1.approx_eq(p2, SAME_POINT_EPSILON) {
            return false;
        }
        self.blockers
            .values()
            .filter(|b| b.enabled && b.scope == scope)
            .any(|b| segments_intersect(p1, p2, b.p1, b.p2))
    }

    // --- Navigation ---

    /// Moves focus one step and returns the (possibly unchanged) current node.
    pub fn move_focus(&mut self, direction: Direction) -> Option<&str> {
        let scope = self.active_scope.clone();

        let current = self
            .current
            .as_deref()
            .and_then(|id| self.nodes.get(id))
            .filter(|node| node.reachable_in(&scope));
        let Some(current) = current else {
            self.current = self.first_in_scope(&scope);
            debug!("FocusGraph: recovered focus -> {:?}", self.current);
            return self.current.as_deref();
        };
        let current_id = current.id.clone();
        let center = current.center();

        if let Some(link) = current.nav.get(&direction) {
            let target_scope = link.scope.clone().unwrap_or_else(|| scope.clone());
            let target = self.nodes.get(&link.id);
            if let Some(target) = target {
                if target.reachable_in(&target_scope)
                    && !self.is_jump_blocked(center, target.center(), &scope)
                {
                    debug!(
                        "FocusGraph: {} via link '{}' -> '{}' ({})",
                        direction, current_id, target.id, target_scope
                    );
                    self.current = Some(target.id.clone());
                    self.active_scope = target_scope;
                    return self.current.as_deref();
                }
            }
        }

        let best = self
            .geometric_candidate(direction, &current_id, center, &scope)
            .or_else(|| self.linear_candidate(direction, &current_id, center, &scope));

        if let Some(id) = best {
            trace!("FocusGraph: {} '{}' -> '{}'", direction, current_id, id);
            self.current = Some(id);
        }
        self.current.as_deref()
    }

    fn geometric_candidate(
        &self,
        direction: Direction,
        current_id: &str,
        center: Point,
        scope: &str,
    ) -> Option<String> {
        let mut best: Option<(&FocusNode, (f64, f64))> = None;
        for cand in self.nodes.values() {
            if cand.id == current_id || !cand.reachable_in(scope) {
                continue;
            }
            let c = cand.center();
            let Some(score) = direction.score(c.x - center.x, c.y - center.y) else {
                continue;
            };
            if self.is_jump_blocked(center, c, scope) {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_score)) => {
                    score.0 < best_score.0 || (score.0 == best_score.0 && score.1 < best_score.1)
                }
            };
            if better {
                best = Some((cand, score));
            }
        }
        best.map(|(node, _)| node.id.clone())
    }

    fn linear_candidate(
        &self,
        direction: Direction,
        current_id: &str,
        center: Point,
        scope: &str,
    ) -> Option<String> {
        let start = self.nodes.get_index_of(current_id)?;
        let reachable = |node: &&FocusNode| {
            node.reachable_in(scope) && !self.is_jump_blocked(center, node.center(), scope)
        };
        let found = if direction.walks_forward() {
            self.nodes.values().skip(start + 1).find(reachable)
        } else {
            self.nodes.values().take(start).rev().find(reachable)
        };
        found.map(|node| node.id.clone())
    }
}
