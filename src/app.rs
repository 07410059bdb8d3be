use crate::config::{Config, ConfigCommand, LightMode};
use crate::driver::{Animator, FrameOutput, StartPose};
use crate::input::{collect_input_nonblocking, map_event, Action, KEY_HINT};
use crate::layout::{Layout, DEBUG_PANEL_W};
use crate::term::Terminal;
use anyhow::Result;
use crossterm::style::Color;
use std::io::Write;
use std::time::{Duration, Instant};

const STATUS_TTL: Duration = Duration::from_secs(3);

pub(crate) struct App {
    cfg: Config,
    animator: Animator,
    term: Terminal,
    layout: Layout,
    status: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn init(cfg: Config, animator: Animator) -> Result<Self> {
        let term = Terminal::begin()?;
        let layout = Layout::compute(term.cols, term.rows, cfg.grid, cfg.display.show_debug);
        Ok(Self {
            cfg,
            animator,
            term,
            layout,
            status: None,
            should_quit: false,
        })
    }

    fn run(&mut self) -> Result<()> {
        let fps = self.cfg.display.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        tracing::info!(fps, grid = ?self.cfg.grid, "animation loop started");

        while !self.should_quit {
            let frame_start = Instant::now();

            if self.term.resize_if_needed()? {
                self.relayout();
            }

            // input is applied between frames, never during one
            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event(ev, self.cfg.display.show_debug) {
                    self.handle(action)?;
                }
                if self.should_quit {
                    break;
                }
            }

            let frame = self.animator.advance(&self.cfg);
            self.render_frame(&frame)?;

            spin_sleep(frame_dt, frame_start);
        }

        tracing::info!(frames = self.animator.frames(), "animation loop stopped");
        Ok(())
    }

    fn handle(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Adjust(cmd) => {
                let relayout = cmd == ConfigCommand::ToggleDebug;
                tracing::debug!(?cmd, "adjust");
                self.cfg.apply(cmd);
                if relayout {
                    self.relayout();
                }
            }
            Action::Diagnostic => {
                self.log_diagnostic();
                self.set_status("diagnostic written to log".to_string());
            }
            Action::Resized(c, r) => {
                self.term.resize(c, r);
                self.relayout();
            }
        }
        Ok(())
    }

    fn relayout(&mut self) {
        self.layout = Layout::compute(
            self.term.cols,
            self.term.rows,
            self.cfg.grid,
            self.cfg.display.show_debug,
        );
    }

    fn set_status(&mut self, msg: String) {
        self.status = Some((msg, Instant::now() + STATUS_TTL));
    }

    fn log_diagnostic(&self) {
        let (x, y) = self.layout.block_origin(crate::driver::float_position(
            self.animator.elapsed_ms(),
            &self.cfg.floating,
            &self.animator.start(),
        ));
        tracing::info!(
            term_cols = self.term.cols,
            term_rows = self.term.rows,
            grid = ?self.cfg.grid,
            block_x = x,
            block_y = y,
            "alignment diagnostic: layout"
        );
        tracing::info!(
            globe = ?self.cfg.globe,
            camera = ?self.cfg.camera,
            rotation_y = self.animator.rotation_y(),
            "alignment diagnostic: globe"
        );
        tracing::info!(lighting = ?self.cfg.lighting, "alignment diagnostic: lighting");
        tracing::info!(pattern = ?self.cfg.test_pattern, "alignment diagnostic: pattern");
    }

    fn render_frame(&mut self, frame: &FrameOutput) -> Result<()> {
        let bg = Color::Black;
        self.term.cur.clear(bg);

        let fg = if self.cfg.display.show_test_pattern {
            Color::Yellow
        } else {
            Color::White
        };
        let (x, y) = self.layout.block_origin(frame.float_pos);
        self.term.cur.draw_block(x, y, &frame.text, fg, bg);

        if self.cfg.display.show_debug {
            let lines = debug_lines(&self.cfg, frame, &self.animator.start(), (x, y));
            for (i, line) in lines.iter().enumerate() {
                let text: String = line.chars().take(DEBUG_PANEL_W as usize - 1).collect();
                self.term.cur.draw_text(0, i as u16, &text, Color::Green, bg);
            }
        }

        let hint = match &self.status {
            Some((msg, until)) if Instant::now() < *until => msg.as_str(),
            _ => KEY_HINT,
        };
        let bottom = self.term.rows.saturating_sub(1);
        self.term.cur.draw_text(0, bottom, hint, Color::DarkGrey, bg);

        self.term.present()
    }
}

fn paused(p: bool) -> &'static str {
    if p {
        "Paused"
    } else {
        "Active"
    }
}

/// Contents of the debug panel.
pub(crate) fn debug_lines(
    cfg: &Config,
    frame: &FrameOutput,
    start: &StartPose,
    origin: (i32, i32),
) -> Vec<String> {
    let c = &cfg.camera;
    let g = &cfg.globe;
    let l = &cfg.lighting;
    let pattern = if cfg.display.show_test_pattern {
        format!("{} /{}", cfg.test_pattern.kind, cfg.test_pattern.spacing)
    } else {
        "Off".to_string()
    };
    vec![
        "DEBUG INFO (d or Esc closes)".to_string(),
        format!("Time: {:.1}s", frame.elapsed_ms / 1000.0),
        String::new(),
        format!("Grid: {}x{}", cfg.grid.cols, cfg.grid.rows),
        format!("Ramp: \"{}\"", cfg.characters),
        format!("Block at: {}, {}", origin.0, origin.1),
        format!("Float: {:.1}%, {:.1}%", frame.float_pos.x_pct, frame.float_pos.y_pct),
        String::new(),
        format!("Orbit V: {:.1}, H: {:.1}", c.orbit_x, c.orbit_y),
        format!("Distance: {:.2}  FOV: {:.0}", c.distance, c.fov),
        format!("Globe Y rotation: {:.2}", frame.rotation_y),
        format!(
            "Scale: {:.2}  Offset: {:.1}, {:.1}{}",
            g.scale,
            g.offset_x,
            g.offset_y,
            if g.flipped { "  flipped" } else { "" }
        ),
        String::new(),
        format!(
            "Light: {}",
            match l.mode {
                LightMode::Sun => "Sun",
                LightMode::Moon => "Moon",
            }
        ),
        format!("Sun: {}, Moon: {}", l.sun_intensity, l.moon_intensity),
        format!("Ambient: {}", l.ambient_intensity),
        String::new(),
        format!(
            "Start: {:.0}%, {:.0}%",
            start.float_x * 100.0,
            start.float_y * 100.0
        ),
        format!("Movement: {}", paused(cfg.animation.movement_paused)),
        format!("Rotation: {}", paused(cfg.animation.rotation_paused)),
        format!("Pattern: {pattern}"),
    ]
}

/// Interactive mode. The terminal is restored whether or not the loop failed.
pub(crate) fn run(cfg: Config, animator: Animator) -> Result<()> {
    let mut app = App::init(cfg, animator)?;
    let res = app.run();
    let end = app.term.end();
    res?;
    end
}

/// Headless mode: `frames` frames to `out`, separated by blank lines.
pub(crate) fn run_headless(
    cfg: &Config,
    animator: &mut Animator,
    frames: u32,
    out: &mut impl Write,
) -> Result<()> {
    for i in 0..frames {
        let frame = animator.advance(cfg);
        writeln!(out, "{}", frame.text)?;
        if i + 1 < frames {
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
