use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::device::device::DeviceControl;
use crate::error::TraceError;
use crate::recorder::capture::{CaptureOptions, capture_screen};
use crate::recorder::gesture::{GestureMachine, SWIPE_THRESHOLD, Transition};
use crate::recorder::surface::{Mark, Surface};
use crate::trace::logger::TraceLogger;
use crate::trace::store::TaskStore;
use crate::trace::trace_model::{Action, ActionEvent, ActionKind, Trace};

pub const SWIPE_DURATION_MS: u64 = 500;
pub const SETTLE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub swipe_threshold: i32,
    pub swipe_duration_ms: u64,
    /// Pause between replaying an action and re-capturing the screen
    pub settle: Duration,
    pub capture: CaptureOptions,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: SWIPE_THRESHOLD,
            swipe_duration_ms: SWIPE_DURATION_MS,
            settle: Duration::from_millis(SETTLE_MS),
            capture: CaptureOptions::default(),
        }
    }
}

/// Mutable state of one recording session.
#[derive(Debug)]
struct Session {
    ui_no: usize,
    trace: Trace,
}

/// Interactive trace recorder.
///
/// Blocks on surface input, replays each committed gesture on the device and
/// re-captures the screen before accepting the next gesture. Device I/O and
/// input never overlap.
pub struct Recorder<'a> {
    device: &'a mut dyn DeviceControl,
    surface: &'a mut dyn Surface,
    store: TaskStore,
    logger: TraceLogger,
    config: RecorderConfig,
    gestures: GestureMachine,
    session: Session,
}

impl<'a> Recorder<'a> {
    pub fn new(
        device: &'a mut dyn DeviceControl,
        surface: &'a mut dyn Surface,
        store: TaskStore,
        trace: Trace,
        config: RecorderConfig,
    ) -> Self {
        let gestures = GestureMachine::new(surface.scale(), config.swipe_threshold);
        let logger = TraceLogger::new(&store.action_log_path());

        Recorder {
            device,
            surface,
            store,
            logger,
            config,
            gestures,
            session: Session { ui_no: 0, trace },
        }
    }

    pub fn into_trace(self) -> Trace {
        self.session.trace
    }

    /// Run until quit. The trace summary is written whether the session ends
    /// normally or on an error.
    pub fn run(&mut self) -> Result<(), TraceError> {
        info!(
            device = %self.device.serial(),
            app = %self.session.trace.app,
            task = self.session.trace.task,
            "Recording session started"
        );

        let result = self.event_loop();

        if let Err(e) = &result {
            error!("Recording aborted at screen {}: {}", self.session.ui_no, e);
        }
        if !self.session.trace.actions.is_empty() && !self.session.trace.is_complete() {
            warn!("Last action has no captured follow-up screen");
        }
        self.store.write_trace(&self.session.trace)?;

        info!(
            screens = self.session.trace.screens.len(),
            actions = self.session.trace.actions.len(),
            "Recording session finished"
        );
        result
    }

    fn event_loop(&mut self) -> Result<(), TraceError> {
        let screen = self.device.screen_size()?;
        self.gestures.set_screen(screen);
        self.capture()?;

        loop {
            let event = self.surface.next_event()?;

            match self.gestures.handle(event) {
                Transition::Ignored => {}
                Transition::Pressed { .. } => {
                    if let Some(p) = event.point() {
                        self.surface.mark(p, Mark::Press)?;
                    }
                }
                Transition::Dragged { .. } => {
                    if let Some(p) = event.point() {
                        self.surface.mark(p, Mark::Drag)?;
                    }
                }
                Transition::Committed { action, held } => self.commit(action, held)?,
                Transition::Quit => {
                    info!("Quit requested");
                    return Ok(());
                }
            }
        }
    }

    fn commit(&mut self, action: Action, held: Duration) -> Result<(), TraceError> {
        match action.kind {
            ActionKind::Swipe => info!(
                "Swipe from ({}, {}) to ({}, {}) in {:.3}s",
                action.start().x,
                action.start().y,
                action.end().x,
                action.end().y,
                held.as_secs_f32()
            ),
            ActionKind::Click => info!("Click ({}, {})", action.start().x, action.start().y),
        }

        replay(self.device, &action, self.config.swipe_duration_ms)?;

        self.logger
            .log(&ActionEvent::now(self.session.ui_no, &action).with_press_duration(held));
        self.session.trace.push_action(action);

        self.session.ui_no += 1;
        thread::sleep(self.config.settle);
        self.capture()
    }

    /// Capture screen `ui_no`, append it to the trace and show it.
    fn capture(&mut self) -> Result<(), TraceError> {
        let ui_no = self.session.ui_no;
        let screen = capture_screen(self.device, &self.store, ui_no, &self.config.capture)?;

        if let Some(previous) = self.session.trace.last_screen() {
            if previous.fingerprint == screen.record.fingerprint {
                warn!(
                    ui_no,
                    "Hierarchy unchanged after action on screen {}", previous.ui_no
                );
            }
        }

        self.session.trace.push_screen(screen.record);
        self.surface.present(&screen.image)
    }
}

/// Issue `action` on the device: a tap at the start point or a timed drag.
pub fn replay(device: &mut dyn DeviceControl, action: &Action, swipe_duration_ms: u64) -> Result<(), TraceError> {
    let start = action.start();
    match action.kind {
        ActionKind::Click => device.tap(start.x, start.y),
        ActionKind::Swipe => {
            let end = action.end();
            device.swipe(start.x, start.y, end.x, end.y, swipe_duration_ms)
        }
    }
}
