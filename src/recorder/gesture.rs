use std::time::{Duration, Instant};

use tracing::warn;

use crate::trace::trace_model::{Action, Point};

/// Device-pixel distance on either axis at which a gesture counts as a swipe.
pub const SWIPE_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Pressed,
    Dragging,
}

/// Pointer/keyboard input in rendering-surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    /// Quit request; ignored while a gesture is in flight.
    Quit,
    /// The input source is gone. Ends the session in any state and drops an
    /// unfinished gesture.
    EndOfInput,
}

impl InputEvent {
    pub fn point(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown(p) | InputEvent::PointerMove(p) | InputEvent::PointerUp(p) => {
                Some(*p)
            }
            InputEvent::Quit | InputEvent::EndOfInput => None,
        }
    }
}

/// Outcome of feeding one input event to the machine. Points are in device
/// space.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Ignored,
    Pressed { at: Point },
    Dragged { to: Point },
    Committed { action: Action, held: Duration },
    Quit,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    start: Point,
    at: Instant,
}

/// Idle → Pressed → Dragging → Idle machine turning pointer input into
/// classified actions.
#[derive(Debug)]
pub struct GestureMachine {
    state: GestureState,
    scale: i32,
    threshold: i32,
    /// Device `(width, height)`; scaled points are clamped inside it
    screen: Option<(u32, u32)>,
    press: Option<Press>,
}

impl GestureMachine {
    pub fn new(scale: i32, threshold: i32) -> Self {
        GestureMachine {
            state: GestureState::Idle,
            scale: scale.max(1),
            threshold,
            screen: None,
            press: None,
        }
    }

    /// Clamp every mapped point to a device screen of `(width, height)`.
    pub fn with_screen(mut self, screen: (u32, u32)) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn set_screen(&mut self, screen: (u32, u32)) {
        self.screen = Some(screen);
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn handle(&mut self, event: InputEvent) -> Transition {
        use GestureState::*;
        use InputEvent::*;

        match (self.state, event) {
            (Idle, PointerDown(p)) => self.press(self.to_device(p)),
            // The release was lost; the new press starts over.
            (Pressed | Dragging, PointerDown(p)) => {
                warn!("Press without release, restarting gesture");
                self.press(self.to_device(p))
            }
            (Pressed | Dragging, PointerMove(p)) => self.drag(self.to_device(p)),
            (Pressed | Dragging, PointerUp(p)) => self.release(self.to_device(p)),
            (Idle, Quit) => Transition::Quit,
            (state, EndOfInput) => {
                if state != Idle {
                    warn!("Input ended mid-gesture, dropping it");
                }
                self.state = Idle;
                self.press = None;
                Transition::Quit
            }
            // Quit mid-gesture and stray pointer events are dropped.
            _ => Transition::Ignored,
        }
    }

    fn to_device(&self, p: Point) -> Point {
        let p = p.scaled(self.scale);
        match self.screen {
            Some((width, height)) => p.clamped(width, height),
            None => p,
        }
    }

    fn press(&mut self, start: Point) -> Transition {
        self.press = Some(Press {
            start,
            at: Instant::now(),
        });
        self.state = GestureState::Pressed;
        Transition::Pressed { at: start }
    }

    fn drag(&mut self, to: Point) -> Transition {
        self.state = GestureState::Dragging;
        Transition::Dragged { to }
    }

    fn release(&mut self, end: Point) -> Transition {
        self.state = GestureState::Idle;
        match self.press.take() {
            Some(press) => Transition::Committed {
                action: classify(press.start, end, self.threshold),
                held: press.at.elapsed(),
            },
            None => Transition::Ignored,
        }
    }
}

/// Click when both axis deltas stay below `threshold`, swipe otherwise.
pub fn classify(start: Point, end: Point, threshold: i32) -> Action {
    if start.chebyshev(end) >= threshold {
        Action::swipe(start, end)
    } else {
        Action::click(start)
    }
}
