use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::warn;

use crate::error::TraceError;
use crate::recorder::gesture::InputEvent;
use crate::recorder::surface::{Mark, Surface};
use crate::trace::trace_model::Point;

const PRESS_COLOR: Color = Color::Rgb { r: 255, g: 0, b: 255 };

/// Interactive surface inside the terminal.
///
/// The screenshot is drawn with upper-half-block cells, so one cell covers
/// one surface pixel horizontally and two vertically. Left-button
/// press/drag/release produce pointer events. `q` quits between gestures;
/// Ctrl-C ends the session at any time.
pub struct TerminalSurface {
    out: Stdout,
    scale: i32,
    frame: Option<(u32, u32)>,
}

impl TerminalSurface {
    /// Enter the alternate screen and pick a scale that fits `device_size`
    /// into the terminal, never smaller than `requested_scale`.
    pub fn open(device_size: (u32, u32), requested_scale: i32) -> Result<Self, TraceError> {
        let (cols, rows) = terminal::size().map_err(surface_err)?;
        let fitted = fit_scale(device_size, (cols, rows.saturating_sub(1)));
        let scale = requested_scale.max(fitted);
        if scale > requested_scale {
            warn!(
                requested = requested_scale,
                used = scale,
                "Terminal too small for requested scale"
            );
        }

        enable_raw_mode().map_err(surface_err)?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, EnableMouseCapture, Hide).map_err(surface_err)?;

        Ok(TerminalSurface {
            out,
            scale,
            frame: None,
        })
    }

    /// Terminal cell of a surface pixel, kept inside the drawn frame.
    fn cell_of(&self, at: Point) -> (u16, u16) {
        let (width, height) = self.frame.unwrap_or((1, 1));
        let at = at.clamped(width, height);
        let col = u16::try_from(at.x).unwrap_or(u16::MAX);
        let row = u16::try_from(at.y / 2).unwrap_or(u16::MAX);
        (col, row)
    }

    fn draw_status(&mut self, text: &str) -> io::Result<()> {
        let row = self.frame.map_or(0, |(_, h)| h.div_ceil(2)) as u16;
        queue!(
            self.out,
            MoveTo(0, row),
            ResetColor,
            Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        self.out.flush()
    }
}

impl Surface for TerminalSurface {
    fn scale(&self) -> i32 {
        self.scale
    }

    fn present(&mut self, screen: &DynamicImage) -> Result<(), TraceError> {
        let scale = self.scale as u32;
        let width = (screen.width() / scale).max(1);
        let height = (screen.height() / scale).max(1);
        let board = screen.resize_exact(width, height, FilterType::Triangle).to_rgb8();

        queue!(self.out, Clear(ClearType::All)).map_err(surface_err)?;
        for row in 0..height.div_ceil(2) {
            queue!(self.out, MoveTo(0, row as u16)).map_err(surface_err)?;
            for x in 0..width {
                let top = board.get_pixel(x, row * 2).0;
                let bottom = if row * 2 + 1 < height {
                    board.get_pixel(x, row * 2 + 1).0
                } else {
                    [0, 0, 0]
                };
                queue!(
                    self.out,
                    SetForegroundColor(Color::Rgb { r: top[0], g: top[1], b: top[2] }),
                    SetBackgroundColor(Color::Rgb { r: bottom[0], g: bottom[1], b: bottom[2] }),
                    Print('▀')
                )
                .map_err(surface_err)?;
            }
        }
        self.frame = Some((width, height));

        self.draw_status("Control panel (press \"q\" to exit)")
            .map_err(surface_err)
    }

    fn mark(&mut self, at: Point, mark: Mark) -> Result<(), TraceError> {
        let glyph = match mark {
            Mark::Press => '●',
            Mark::Drag => '○',
        };
        let (col, row) = self.cell_of(at);
        queue!(
            self.out,
            MoveTo(col, row),
            SetForegroundColor(PRESS_COLOR),
            Print(glyph),
            ResetColor
        )
        .map_err(surface_err)?;
        self.out.flush().map_err(surface_err)
    }

    fn next_event(&mut self) -> Result<InputEvent, TraceError> {
        loop {
            match event::read().map_err(surface_err)? {
                Event::Mouse(mouse) => {
                    let p = Point::new(mouse.column as i32, mouse.row as i32 * 2);
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => {
                            return Ok(InputEvent::PointerDown(p));
                        }
                        MouseEventKind::Drag(MouseButton::Left) => {
                            return Ok(InputEvent::PointerMove(p));
                        }
                        MouseEventKind::Up(MouseButton::Left) => {
                            return Ok(InputEvent::PointerUp(p));
                        }
                        _ => {}
                    }
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') => return Ok(InputEvent::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(InputEvent::EndOfInput);
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        // Best-effort restore
        let _ = execute!(self.out, ResetColor, Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Smallest integer scale at which the device screen fits `(cols, rows)`
/// terminal cells, each cell being one pixel wide and two tall.
pub fn fit_scale(device_size: (u32, u32), terminal: (u16, u16)) -> i32 {
    let cols = (terminal.0 as u32).max(1);
    let rows = (terminal.1 as u32).max(1) * 2;
    let by_width = device_size.0.div_ceil(cols);
    let by_height = device_size.1.div_ceil(rows);
    by_width.max(by_height).max(1) as i32
}

fn surface_err(e: io::Error) -> TraceError {
    TraceError::Surface(e.to_string())
}
