use crate::config::{Config, FloatingSettings};
use crate::mapper::{self, BUFFER_ROW_ORDER, BYTES_PER_PIXEL};
use crate::pattern;
use crate::scene::{GlobePose, SceneRenderer};
use rand::Rng;
use std::f64::consts::TAU;

/// Animation clock advance per frame, milliseconds.
pub(crate) const FRAME_MS: f64 = 16.0;

/// Where the display block sits, in percent of the viewport (its centre).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FloatPos {
    pub(crate) x_pct: f64,
    pub(crate) y_pct: f64,
}

/// Randomised starting state, fixed once at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StartPose {
    pub(crate) rotation_y: f64,
    pub(crate) float_x: f64,
    pub(crate) float_y: f64,
}

impl StartPose {
    /// Config values win; anything unset is drawn from `rng`.
    pub(crate) fn resolve(cfg: &Config, rng: &mut impl Rng) -> Self {
        Self {
            rotation_y: cfg
                .globe
                .start_rotation_y
                .unwrap_or_else(|| rng.gen_range(0.0..TAU)),
            float_x: cfg
                .floating
                .start_x
                .unwrap_or_else(|| rng.gen_range(-0.3..0.3)),
            float_y: cfg
                .floating
                .start_y
                .unwrap_or_else(|| rng.gen_range(-0.2..0.2)),
        }
    }
}

/// Two-frequency Lissajous drift around the start position.
pub(crate) fn float_position(elapsed_ms: f64, fl: &FloatingSettings, start: &StartPose) -> FloatPos {
    let mut x = 50.0 + start.float_x * 100.0;
    let mut y = 50.0 + start.float_y * 100.0;
    if fl.enabled {
        let t = elapsed_ms;
        let x1 = (t * fl.speed).sin() * fl.radius_x;
        let y1 = (t * fl.speed * 0.7).cos() * fl.radius_y;
        let x2 = (t * fl.speed2).sin() * fl.radius_x * 0.3;
        let y2 = (t * fl.speed2 * 1.3).cos() * fl.radius_y * 0.3;
        x += (x1 + x2) * 100.0;
        y += (y1 + y2) * 100.0;
    }
    FloatPos { x_pct: x, y_pct: y }
}

pub(crate) struct FrameOutput {
    pub(crate) text: String,
    pub(crate) float_pos: FloatPos,
    pub(crate) rotation_y: f64,
    pub(crate) elapsed_ms: f64,
}

/// Owns the animation clock, the globe pose and the pixel buffer.
pub(crate) struct Animator {
    scene: SceneRenderer,
    pixels: Vec<u8>,
    start: StartPose,
    elapsed_ms: f64,
    pose: GlobePose,
    float_pos: FloatPos,
    frames: u64,
}

impl Animator {
    pub(crate) fn new(scene: SceneRenderer, cfg: &Config, start: StartPose) -> Self {
        let dims = scene.dims();
        Self {
            pixels: vec![0; dims.pixel_count() * BYTES_PER_PIXEL],
            scene,
            start,
            elapsed_ms: 0.0,
            pose: GlobePose {
                rotation_x: 0.0,
                rotation_y: start.rotation_y,
            },
            float_pos: float_position(0.0, &cfg.floating, &start),
            frames: 0,
        }
    }

    pub(crate) fn rotation_y(&self) -> f64 {
        self.pose.rotation_y
    }

    pub(crate) fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub(crate) fn start(&self) -> StartPose {
        self.start
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }

    /// One frame: advance the clock and pose, render, convert to text.
    pub(crate) fn advance(&mut self, cfg: &Config) -> FrameOutput {
        let moving = !cfg.animation.movement_paused;
        let spinning = !cfg.animation.rotation_paused;

        if moving {
            self.elapsed_ms += FRAME_MS;
        }
        if spinning {
            self.pose.rotation_y -= cfg.globe.rotation_speed;
        }
        if moving {
            self.pose.rotation_x =
                (self.elapsed_ms * cfg.globe.wobble_speed).sin() * cfg.globe.wobble_amount;
        }
        // the clock is frozen while paused, so this repeats the last position
        self.float_pos = float_position(self.elapsed_ms, &cfg.floating, &self.start);

        self.scene.sync(cfg, self.pose);
        self.scene.render(&mut self.pixels);

        // grid size is fixed at construction; the buffer always matches it
        let dims = self.scene.dims();
        let text = if cfg.display.show_test_pattern {
            pattern::generate(dims, &cfg.test_pattern)
        } else {
            mapper::pixels_to_text(&self.pixels, dims, BUFFER_ROW_ORDER, &cfg.characters)
        };

        self.frames += 1;
        FrameOutput {
            text,
            float_pos: self.float_pos,
            rotation_y: self.pose.rotation_y,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigCommand, GridDims};
    use crate::pattern::PatternKind;
    use crate::texture::Texture;
    use rand::{rngs::StdRng, SeedableRng};

    const START: StartPose = StartPose {
        rotation_y: 1.0,
        float_x: 0.1,
        float_y: -0.1,
    };

    fn small_config() -> Config {
        Config {
            grid: GridDims { cols: 16, rows: 12 },
            ..Config::default()
        }
    }

    fn animator(cfg: &Config) -> Animator {
        let scene = SceneRenderer::new(cfg.grid, Texture::solid([180, 180, 180]), cfg);
        Animator::new(scene, cfg, START)
    }

    #[test]
    fn rotation_accumulates_and_freezes() {
        let mut cfg = small_config();
        let mut anim = animator(&cfg);
        for _ in 0..100 {
            anim.advance(&cfg);
        }
        let expected = 1.0 - 100.0 * 0.001;
        assert!((anim.rotation_y() - expected).abs() < 1e-9);

        cfg.apply(ConfigCommand::ToggleRotation);
        let frozen = anim.rotation_y();
        for _ in 0..10 {
            let out = anim.advance(&cfg);
            assert_eq!(out.rotation_y, frozen);
        }
        // the clock keeps running with only rotation paused
        assert_eq!(anim.elapsed_ms(), 110.0 * FRAME_MS);
    }

    #[test]
    fn rotation_is_never_normalised() {
        let mut cfg = small_config();
        cfg.globe.rotation_speed = 1.0;
        let mut anim = animator(&cfg);
        for _ in 0..10 {
            anim.advance(&cfg);
        }
        assert!((anim.rotation_y() - (1.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn movement_pause_freezes_clock_wobble_and_drift() {
        let mut cfg = small_config();
        let mut anim = animator(&cfg);
        let first = anim.advance(&cfg);
        assert_eq!(first.elapsed_ms, FRAME_MS);
        let wobble = anim.pose.rotation_x;
        assert!((wobble - (FRAME_MS * 0.0001).sin() * 0.02).abs() < 1e-12);

        cfg.apply(ConfigCommand::TogglePause);
        let a = anim.advance(&cfg);
        let b = anim.advance(&cfg);
        assert_eq!(a.elapsed_ms, FRAME_MS);
        assert_eq!(b.elapsed_ms, FRAME_MS);
        assert_eq!(a.float_pos, first.float_pos);
        assert_eq!(b.float_pos, first.float_pos);
        assert_eq!(anim.pose.rotation_x, wobble);
        assert_eq!(b.rotation_y, first.rotation_y);
        assert_eq!(anim.frames(), 3);
    }

    #[test]
    fn output_has_grid_shape() {
        let cfg = small_config();
        let mut anim = animator(&cfg);
        let out = anim.advance(&cfg);
        let lines: Vec<&str> = out.text.split('\n').collect();
        assert_eq!(lines.len(), 12);
        assert!(lines.iter().all(|l| l.chars().count() == 16));
        assert!(out.text.chars().any(|c| c != ' '), "globe should be visible");
    }

    #[test]
    fn test_pattern_replaces_globe() {
        let mut cfg = small_config();
        cfg.apply(ConfigCommand::ToggleTestPattern);
        cfg.apply(ConfigCommand::SetPatternKind(PatternKind::Grid));
        let mut anim = animator(&cfg);
        let out = anim.advance(&cfg);
        assert_eq!(out.text, pattern::generate(cfg.grid, &cfg.test_pattern));
        // still animating underneath
        assert_eq!(out.elapsed_ms, FRAME_MS);
    }

    #[test]
    fn drift_starts_from_start_pose() {
        let mut fl = FloatingSettings::default();
        let p = float_position(0.0, &fl, &START);
        assert!((p.x_pct - 60.0).abs() < 1e-9);
        // cos(0) terms: ry + 0.3 ry
        assert!((p.y_pct - (40.0 + 0.15 * 1.3 * 100.0)).abs() < 1e-9);

        fl.enabled = false;
        let p = float_position(123_456.0, &fl, &START);
        assert!((p.x_pct - 60.0).abs() < 1e-9 && (p.y_pct - 40.0).abs() < 1e-9);
    }

    #[test]
    fn start_pose_prefers_config() {
        let mut cfg = Config::default();
        cfg.globe.start_rotation_y = Some(2.0);
        cfg.floating.start_x = Some(0.0);
        let mut rng = StdRng::seed_from_u64(9);
        let s = StartPose::resolve(&cfg, &mut rng);
        assert_eq!(s.rotation_y, 2.0);
        assert_eq!(s.float_x, 0.0);
        assert!((-0.2..0.2).contains(&s.float_y));

        let s = StartPose::resolve(&Config::default(), &mut rng);
        assert!((0.0..TAU).contains(&s.rotation_y));
        assert!((-0.3..0.3).contains(&s.float_x));
    }
}
