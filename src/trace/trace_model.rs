use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// ============================================================================
// Points and actions
// ============================================================================

/// Pixel position, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// End coordinate of a click: the action has no second point.
    pub const SENTINEL: Point = Point { x: -1, y: -1 };

    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Map a rendering-surface position to device space.
    pub fn scaled(self, factor: i32) -> Point {
        Point::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Keep the point on a `width` x `height` screen.
    pub fn clamped(self, width: u32, height: u32) -> Point {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX).saturating_sub(1).max(0);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX).saturating_sub(1).max(0);
        Point::new(self.x.clamp(0, max_x), self.y.clamp(0, max_y))
    }

    /// Largest per-axis distance (L∞).
    pub fn chebyshev(self, other: Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Swipe,
}

/// One replayed gesture. `coordinate` is `[start, end]` in device pixels;
/// clicks carry `Point::SENTINEL` as their end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub coordinate: [Point; 2],
}

impl Action {
    pub fn click(at: Point) -> Self {
        Action {
            kind: ActionKind::Click,
            coordinate: [at, Point::SENTINEL],
        }
    }

    pub fn swipe(from: Point, to: Point) -> Self {
        Action {
            kind: ActionKind::Swipe,
            coordinate: [from, to],
        }
    }

    pub fn start(&self) -> Point {
        self.coordinate[0]
    }

    pub fn end(&self) -> Point {
        self.coordinate[1]
    }
}

// ============================================================================
// Trace
// ============================================================================

/// Files and fingerprint of one captured screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRecord {
    pub ui_no: usize,
    pub screenshot: String,
    pub hierarchy_xml: String,
    pub hierarchy_json: String,
    /// sha1 of the stored hierarchy JSON
    pub fingerprint: String,
}

/// Ordered screens interleaved with the actions between them.
///
/// `actions[n]` leads from `screens[n]` to `screens[n + 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub app: String,
    pub task: u32,
    pub screens: Vec<ScreenRecord>,
    pub actions: Vec<Action>,
}

impl Trace {
    pub fn new(app: &str, task: u32) -> Self {
        Trace {
            app: app.to_string(),
            task,
            screens: vec![],
            actions: vec![],
        }
    }

    pub fn push_screen(&mut self, screen: ScreenRecord) {
        self.screens.push(screen);
    }

    pub fn push_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn last_screen(&self) -> Option<&ScreenRecord> {
        self.screens.last()
    }

    /// Every logged action has produced its follow-up screen.
    pub fn is_complete(&self) -> bool {
        self.screens.len() == self.actions.len() + 1
    }
}

// ============================================================================
// Action log events
// ============================================================================

/// One line of the JSONL action log.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionEvent {
    pub timestamp_ms: u128,
    /// Screen the action was issued on
    pub ui_no: usize,
    pub action: Action,
    pub press_ms: Option<u128>,
}

impl ActionEvent {
    pub fn now(ui_no: usize, action: &Action) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            ui_no,
            action: action.clone(),
            press_ms: None,
        }
    }

    pub fn with_press_duration(mut self, held: Duration) -> Self {
        self.press_ms = Some(held.as_millis());
        self
    }
}
