use std::collections::VecDeque;

use image::DynamicImage;

use crate::error::TraceError;
use crate::recorder::gesture::InputEvent;
use crate::trace::trace_model::Point;

/// Visual feedback drawn on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Press,
    Drag,
}

/// Scaled-down rendering of the device screen that also produces the user's
/// input. Positions are in surface pixels; multiplying by `scale()` gives
/// device pixels.
pub trait Surface {
    fn scale(&self) -> i32;

    /// Replace the displayed screenshot.
    fn present(&mut self, screen: &DynamicImage) -> Result<(), TraceError>;

    fn mark(&mut self, at: Point, mark: Mark) -> Result<(), TraceError>;

    /// Block until the next input event.
    fn next_event(&mut self) -> Result<InputEvent, TraceError>;
}

// ============================================================================
// Scripted surface
// ============================================================================

/// Surface fed from a gesture script instead of a person.
///
/// Script lines: `down X Y`, `move X Y`, `up X Y`, `quit`. Blank lines and
/// `#` comments are skipped. Running out of events ends the session, even
/// mid-gesture.
#[derive(Debug)]
pub struct ScriptedSurface {
    scale: i32,
    events: VecDeque<InputEvent>,
    /// `(width, height)` of every presented frame, after scaling down
    pub presented: Vec<(u32, u32)>,
    pub marks: Vec<(Point, Mark)>,
}

impl ScriptedSurface {
    pub fn new(scale: i32, events: Vec<InputEvent>) -> Self {
        ScriptedSurface {
            scale: scale.max(1),
            events: events.into(),
            presented: vec![],
            marks: vec![],
        }
    }

    pub fn from_script(script: &str, scale: i32) -> Result<Self, TraceError> {
        Ok(Self::new(scale, parse_script(script)?))
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl Surface for ScriptedSurface {
    fn scale(&self) -> i32 {
        self.scale
    }

    fn present(&mut self, screen: &DynamicImage) -> Result<(), TraceError> {
        let scale = self.scale as u32;
        self.presented
            .push((screen.width() / scale, screen.height() / scale));
        Ok(())
    }

    fn mark(&mut self, at: Point, mark: Mark) -> Result<(), TraceError> {
        self.marks.push((at, mark));
        Ok(())
    }

    fn next_event(&mut self) -> Result<InputEvent, TraceError> {
        Ok(self.events.pop_front().unwrap_or(InputEvent::EndOfInput))
    }
}

/// Parse a gesture script into surface-space events.
pub fn parse_script(script: &str) -> Result<Vec<InputEvent>, TraceError> {
    let mut events = Vec::new();

    for (idx, line) in script.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let bad = |msg: &str| TraceError::Config(format!("script line {}: {}", idx + 1, msg));

        let event = match parts.as_slice() {
            ["quit"] | ["q"] => InputEvent::Quit,
            [verb, x, y] => {
                let x = x.parse::<i32>().map_err(|_| bad("x is not an integer"))?;
                let y = y.parse::<i32>().map_err(|_| bad("y is not an integer"))?;
                let p = Point::new(x, y);
                match *verb {
                    "down" => InputEvent::PointerDown(p),
                    "move" => InputEvent::PointerMove(p),
                    "up" => InputEvent::PointerUp(p),
                    other => return Err(bad(&format!("unknown event '{}'", other))),
                }
            }
            _ => return Err(bad("expected `down|move|up X Y` or `quit`")),
        };
        events.push(event);
    }

    Ok(events)
}
