use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use log::{debug, info};

use crate::config::SimulationConfig;
use crate::error::{PendulumError, Result};
use crate::graphics::{draw_pendulums, Canvas, Surface, BACKGROUND, BOB_INK, LINK_INK};
use crate::simulation::{FrameClock, SimulationLoop};

/// Terminal rows kept free for the status line
const STATUS_ROWS: usize = 1;

/// Application state
pub struct AppState {
    /// The running simulation
    pub sim: SimulationLoop,
    /// Frame time source
    pub clock: FrameClock,
    /// Most recent link angles
    pub angles: (f64, f64),
    /// Enable debug mode
    pub debug: bool,
    /// Simulation paused
    pub paused: bool,
}

impl AppState {
    pub fn new(config: &SimulationConfig) -> Self {
        let initial = config.initial_state;
        AppState {
            sim: SimulationLoop::new(config.physics, initial),
            clock: FrameClock::new(config.clock, config.fps),
            angles: (initial[0], initial[1]),
            debug: false,
            paused: false,
        }
    }

    /// Advances one frame unless paused
    pub fn on_timer(&mut self) {
        if !self.paused {
            let frame_time = self.clock.next_frame_time();
            self.angles = self.sim.tick(frame_time);
        }
    }

    /// Applies a key press; returns `false` when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return false,
            KeyCode::Char('d') | KeyCode::Char('D') => self.debug = !self.debug,
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.paused = !self.paused;
                self.clock.set_paused(self.paused);
                info!("simulation {}", if self.paused { "paused" } else { "resumed" });
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.sim.reset();
                self.clock.reset();
                let initial = self.sim.state();
                self.angles = (initial[0], initial[1]);
                info!("simulation reset");
            }
            _ => {}
        }
        true
    }
}

/// Mapping from canvas pixels onto terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Canvas pixels per cell horizontally
    pub cell_w: usize,
    /// Canvas pixels per cell vertically
    pub cell_h: usize,
    /// Number of cell columns used
    pub cols: usize,
    /// Number of cell rows used
    pub rows: usize,
    /// Left margin in cells that centres the picture
    pub left: usize,
    /// Terminal width in cells; every rasterized line spans all of it
    pub width: usize,
}

impl Viewport {
    /// Fits a square canvas of side `size` into `term_cols` × `term_rows`
    ///
    /// Terminal cells are roughly twice as tall as they are wide, so each
    /// cell covers twice as many canvas rows as columns.
    pub fn fit(size: usize, term_cols: usize, term_rows: usize) -> Self {
        let term_cols = term_cols.max(1);
        let term_rows = term_rows.saturating_sub(STATUS_ROWS).max(1);
        let cell_w = size
            .div_ceil(term_cols)
            .max(size.div_ceil(2 * term_rows))
            .max(1);
        let cell_h = 2 * cell_w;
        let cols = size.div_ceil(cell_w);
        let rows = size.div_ceil(cell_h);
        Viewport {
            cell_w,
            cell_h,
            cols,
            rows,
            left: term_cols.saturating_sub(cols) / 2,
            width: term_cols,
        }
    }

    /// Converts the canvas into one text line per cell row
    ///
    /// Lines are padded with blanks to the full terminal width, so painting
    /// them from column 0 overwrites whatever the previous frame left there.
    pub fn rasterize(&self, canvas: &Canvas) -> Vec<String> {
        let right = self.width.saturating_sub(self.left + self.cols);
        (0..self.rows)
            .map(|row| {
                let picture = (0..self.cols).map(|col| {
                    let ink = canvas.block(
                        col * self.cell_w,
                        row * self.cell_h,
                        self.cell_w,
                        self.cell_h,
                    );
                    match ink {
                        BACKGROUND => ' ',
                        LINK_INK => '*',
                        BOB_INK => '@',
                        _ => '?',
                    }
                });
                std::iter::repeat(' ')
                    .take(self.left)
                    .chain(picture)
                    .chain(std::iter::repeat(' ').take(right))
                    .collect()
            })
            .collect()
    }
}

/// Terminal view of the pendulum
pub struct PendulumWidget {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
    canvas: Canvas,
    viewport: Viewport,
    /// Wipe the whole screen before the next frame
    needs_clear: bool,
    /// Whether the last frame carried the debug overlay
    painted_debug: bool,
}

impl PendulumWidget {
    pub fn new(size: usize, term_cols: usize, term_rows: usize) -> Self {
        PendulumWidget {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
            canvas: Canvas::new(size, size),
            viewport: Viewport::fit(size, term_cols, term_rows),
            needs_clear: true,
            painted_debug: false,
        }
    }

    /// Refits the canvas after the terminal was resized
    pub fn resize(&mut self, term_cols: usize, term_rows: usize) {
        self.viewport = Viewport::fit(self.canvas.width(), term_cols, term_rows);
        self.needs_clear = true;
    }

    /// Paint the pendulum and overlays
    pub fn paint<W: Write>(
        &mut self,
        out: &mut W,
        data: &AppState,
        config: &SimulationConfig,
    ) -> Result<()> {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
            debug!("measured {:.2} fps", self.fps);
        }

        self.canvas.background();
        let (theta1, theta2) = data.angles;
        draw_pendulums(&mut self.canvas, &config.render, theta1, theta2);

        // Frames overwrite each other in place; a full clear only happens
        // when the layout changed, otherwise the terminal flickers.
        if self.needs_clear || data.debug != self.painted_debug {
            queue!(out, Clear(ClearType::All))?;
            self.needs_clear = false;
        }
        self.painted_debug = data.debug;
        for (row, line) in self.viewport.rasterize(&self.canvas).iter().enumerate() {
            queue!(out, cursor::MoveTo(0, row as u16), Print(line))?;
        }

        // Add debug info if debug mode is enabled
        if data.debug {
            let state = data.sim.state();
            let lines = [
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                format!("t: {:.3} s ({:?} clock)", data.sim.time(), config.clock),
                format!("theta: ({:.3}, {:.3}) rad", state[0], state[1]),
                format!("omega: ({:.3}, {:.3}) rad/s", state[2], state[3]),
                format!("Energy: {:.4}", data.sim.energy()),
                format!("FPS: {:.2}", self.fps),
            ];
            for (row, text) in lines.iter().enumerate() {
                queue!(out, cursor::MoveTo(0, row as u16), Print(text))?;
            }
        }

        // Display 'Paused' if the simulation is paused
        if data.paused {
            let text = "Paused";
            let x = self.viewport.left + self.viewport.cols.saturating_sub(text.len()) / 2;
            let y = self.viewport.rows / 2;
            queue!(
                out,
                cursor::MoveTo(x as u16, y as u16),
                SetAttribute(Attribute::Bold),
                Print(text),
                SetAttribute(Attribute::Reset)
            )?;
        }

        queue!(
            out,
            cursor::MoveTo(0, self.viewport.rows as u16),
            Print("p: pause  d: debug  r: reset  q: quit")
        )?;
        out.flush()?;
        Ok(())
    }
}

/// Current terminal size as (columns, rows)
fn terminal_size() -> (usize, usize) {
    termsize::get()
        .map(|size| (size.cols as usize, size.rows as usize))
        .unwrap_or((80, 24))
}

/// Time between frames at `fps`
fn frame_interval(fps: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(1.0 / fps) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(PendulumError::DegenerateParameters(format!(
            "fps {fps} has no usable frame interval"
        ))),
    }
}

/// Runs `body` on the alternate screen, restoring the terminal on every path
///
/// `leave_raw` is called even when entering the alternate screen fails. An
/// error from `body` is reported in preference to a failed restore.
fn with_screen<W, F>(
    out: &mut W,
    leave_raw: impl FnOnce() -> io::Result<()>,
    body: F,
) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut W) -> Result<()>,
{
    let result = execute!(out, EnterAlternateScreen, cursor::Hide)
        .map_err(PendulumError::from)
        .and_then(|()| body(&mut *out));

    let shown = execute!(out, cursor::Show, LeaveAlternateScreen);
    let raw = leave_raw();
    result.and(shown.and(raw).map_err(PendulumError::from))
}

/// Runs the interactive terminal animation until the user quits
pub fn run(config: &SimulationConfig) -> Result<()> {
    let interval = frame_interval(config.fps)?;
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    with_screen(&mut stdout, terminal::disable_raw_mode, |out| {
        event_loop(out, config, interval)
    })
}

fn event_loop<W: Write>(
    out: &mut W,
    config: &SimulationConfig,
    frame_interval: Duration,
) -> Result<()> {
    let (cols, rows) = terminal_size();
    let mut widget = PendulumWidget::new(config.size, cols, rows);
    let mut data = AppState::new(config);

    let mut next_frame = Instant::now() + frame_interval;

    loop {
        let timeout = next_frame.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !data.on_key(key) {
                        return Ok(());
                    }
                    widget.paint(out, &data, config)?;
                }
                Event::Resize(cols, rows) => {
                    widget.resize(cols as usize, rows as usize);
                    widget.paint(out, &data, config)?;
                }
                _ => {}
            }
            continue;
        }

        next_frame += frame_interval;
        // Fall behind gracefully instead of bursting to catch up
        let now = Instant::now();
        if next_frame < now {
            next_frame = now + frame_interval;
        }

        data.on_timer();
        widget.paint(out, &data, config)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const CLEAR_ALL: &str = "\x1b[2J";

    /// Writer whose every write fails, like a closed terminal
    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_viewport_fits_terminal() {
        let viewport = Viewport::fit(500, 80, 24);
        assert!(viewport.cols <= 80);
        assert!(viewport.rows <= 23);
        assert_eq!(viewport.cell_h, 2 * viewport.cell_w);
        assert_eq!(viewport.left, (80 - viewport.cols) / 2);
    }

    #[test]
    fn test_viewport_one_to_one() {
        let viewport = Viewport::fit(10, 100, 100);
        assert_eq!(viewport.cell_w, 1);
        assert_eq!(viewport.cols, 10);
        assert_eq!(viewport.rows, 5);
    }

    #[test]
    fn test_rasterize_marks_link_and_bob() {
        let mut canvas = Canvas::new(8, 8);
        canvas.line([0.0, 0.0], [7.0, 0.0]);
        canvas.ellipse([4.0, 6.0], 2.0, 2.0);
        let viewport = Viewport::fit(8, 8, 5);
        let lines = viewport.rasterize(&canvas);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "********");
        assert_eq!(lines[1], "        ");
        assert!(lines[3].contains('@'));
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let config = SimulationConfig::default();
        let mut data = AppState::new(&config);
        data.on_timer();
        assert!(data.on_key(press(KeyCode::Char('p'))));
        assert!(data.paused);
        let time = data.sim.time();
        data.on_timer();
        assert_eq!(data.sim.time(), time);
        data.on_key(press(KeyCode::Char('p')));
        data.on_timer();
        assert!(data.sim.time() > time);
    }

    #[test]
    fn test_reset_and_quit_keys() {
        let config = SimulationConfig::default();
        let mut data = AppState::new(&config);
        for _ in 0..5 {
            data.on_timer();
        }
        data.on_key(press(KeyCode::Char('r')));
        assert_eq!(data.sim.time(), 0.0);
        assert_eq!(data.clock.frame_count(), 0);
        assert_eq!(data.angles, (config.initial_state[0], config.initial_state[1]));

        assert!(data.on_key(press(KeyCode::Char('d'))));
        assert!(data.debug);
        assert!(!data.on_key(press(KeyCode::Char('q'))));
        assert!(!data.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_paint_writes_frame() {
        let config = SimulationConfig::default();
        let mut data = AppState::new(&config);
        data.debug = true;
        data.paused = true;
        data.on_timer();
        let mut widget = PendulumWidget::new(config.size, 80, 24);
        let mut out = Vec::new();
        widget.paint(&mut out, &data, &config).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains('@'));
        assert!(text.contains("Paused"));
        assert!(text.contains("Energy"));
    }

    #[test]
    fn test_rasterized_lines_span_terminal() {
        let canvas = Canvas::new(10, 10);
        let viewport = Viewport::fit(10, 30, 20);
        assert_eq!(viewport.left, 10);
        for line in viewport.rasterize(&canvas) {
            assert_eq!(line.len(), 30);
        }
    }

    #[test]
    fn test_steady_frames_do_not_clear_screen() {
        let config = SimulationConfig::default();
        let mut data = AppState::new(&config);
        let mut widget = PendulumWidget::new(config.size, 80, 24);
        let paint = |widget: &mut PendulumWidget, data: &AppState| {
            let mut out = Vec::new();
            widget.paint(&mut out, data, &config).unwrap();
            String::from_utf8(out).unwrap()
        };

        assert!(paint(&mut widget, &data).contains(CLEAR_ALL));
        for _ in 0..3 {
            data.on_timer();
            let frame = paint(&mut widget, &data);
            assert!(!frame.contains(CLEAR_ALL));
            assert!(frame.contains('@'));
        }

        widget.resize(100, 30);
        assert!(paint(&mut widget, &data).contains(CLEAR_ALL));

        // Hiding the overlay wipes its leftovers once
        data.debug = true;
        assert!(paint(&mut widget, &data).contains(CLEAR_ALL));
        assert!(!paint(&mut widget, &data).contains(CLEAR_ALL));
        data.debug = false;
        assert!(paint(&mut widget, &data).contains(CLEAR_ALL));
    }

    #[test]
    fn test_frame_interval() {
        let interval = frame_interval(40.0).unwrap();
        assert!((interval.as_secs_f64() - 0.025).abs() < 1e-9);
        for fps in [1e-30, 5e-324, f64::INFINITY, 0.0] {
            assert!(matches!(
                frame_interval(fps),
                Err(PendulumError::DegenerateParameters(_))
            ));
        }
    }

    #[test]
    fn test_screen_restored_when_entering_fails() {
        let left_raw = Cell::new(false);
        let ran = Cell::new(false);
        let result = with_screen(
            &mut Closed,
            || {
                left_raw.set(true);
                Ok(())
            },
            |_| {
                ran.set(true);
                Ok(())
            },
        );
        assert!(matches!(result, Err(PendulumError::Terminal(_))));
        assert!(left_raw.get());
        assert!(!ran.get());
    }

    #[test]
    fn test_body_error_wins_over_restore_error() {
        let left_raw = Cell::new(false);
        let mut out = Vec::new();
        let result = with_screen(
            &mut out,
            || {
                left_raw.set(true);
                Err(io::Error::new(io::ErrorKind::Other, "raw mode stuck"))
            },
            |_| Err(PendulumError::DegenerateParameters("loop failed".into())),
        );
        assert!(matches!(result, Err(PendulumError::DegenerateParameters(_))));
        assert!(left_raw.get());
        // Left the alternate screen
        assert!(String::from_utf8_lossy(&out).contains("\x1b[?1049l"));

        let result = with_screen(
            &mut Vec::new(),
            || Err(io::Error::new(io::ErrorKind::Other, "raw mode stuck")),
            |_| Ok(()),
        );
        assert!(matches!(result, Err(PendulumError::Terminal(_))));
    }
}
