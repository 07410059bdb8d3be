use crate::pattern::{PatternKind, PatternParams};
use crate::ramp::CharRamp;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

/// Largest accepted grid side; the pixel buffer scales with cols * rows.
pub(crate) const MAX_GRID_SIDE: u16 = 1024;

/// Character grid shape; also the offscreen buffer resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct GridDims {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
}

impl GridDims {
    pub(crate) fn pixel_count(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Both sides in 1..=MAX_GRID_SIDE.
    pub(crate) fn is_plausible(self) -> bool {
        (1..=MAX_GRID_SIDE).contains(&self.cols) && (1..=MAX_GRID_SIDE).contains(&self.rows)
    }
}

impl Default for GridDims {
    fn default() -> Self {
        Self { cols: 48, rows: 48 }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct GlobeSettings {
    pub(crate) scale: f32,
    pub(crate) offset_x: f32,
    pub(crate) offset_y: f32,
    pub(crate) flipped: bool,
    pub(crate) rotation_speed: f64,
    pub(crate) wobble_speed: f64,
    pub(crate) wobble_amount: f64,
    /// Random when unset.
    pub(crate) start_rotation_y: Option<f64>,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            scale: 0.5,
            offset_x: 0.0,
            offset_y: 0.0,
            flipped: false,
            rotation_speed: 0.001,
            wobble_speed: 0.0001,
            wobble_amount: 0.02,
            start_rotation_y: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct CameraSettings {
    pub(crate) distance: f32,
    /// Vertical orbit angle, radians.
    pub(crate) orbit_x: f32,
    /// Horizontal orbit angle, radians.
    pub(crate) orbit_y: f32,
    /// Vertical field of view, degrees.
    pub(crate) fov: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 5.0,
            orbit_x: 0.0,
            orbit_y: 0.8,
            fov: 35.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LightMode {
    Sun,
    Moon,
}

impl LightMode {
    pub(crate) fn toggled(self) -> Self {
        match self {
            LightMode::Sun => LightMode::Moon,
            LightMode::Moon => LightMode::Sun,
        }
    }
}

impl FromStr for LightMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sun" => Ok(LightMode::Sun),
            "moon" => Ok(LightMode::Moon),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct LightingSettings {
    pub(crate) mode: LightMode,
    pub(crate) sun_intensity: f32,
    pub(crate) sun_x: f32,
    pub(crate) sun_y: f32,
    pub(crate) sun_z: f32,
    pub(crate) moon_intensity: f32,
    pub(crate) moon_x: f32,
    pub(crate) moon_y: f32,
    pub(crate) moon_z: f32,
    pub(crate) ambient_intensity: f32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            mode: LightMode::Sun,
            sun_intensity: 1.2,
            sun_x: 5.5,
            sun_y: 3.0,
            sun_z: 5.0,
            moon_intensity: 0.1,
            moon_x: -5.0,
            moon_y: -5.0,
            moon_z: 5.0,
            ambient_intensity: 0.7,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct AnimationGates {
    pub(crate) movement_paused: bool,
    pub(crate) rotation_paused: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct FloatingSettings {
    pub(crate) enabled: bool,
    pub(crate) speed: f64,
    pub(crate) speed2: f64,
    pub(crate) radius_x: f64,
    pub(crate) radius_y: f64,
    /// Fractions of the viewport; random when unset.
    pub(crate) start_x: Option<f64>,
    pub(crate) start_y: Option<f64>,
}

impl Default for FloatingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 0.00002,
            speed2: 0.00003,
            radius_x: 0.25,
            radius_y: 0.15,
            start_x: None,
            start_y: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DisplaySettings {
    pub(crate) show_test_pattern: bool,
    pub(crate) show_debug: bool,
    pub(crate) fps_cap: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_test_pattern: false,
            show_debug: false,
            fps_cap: 60,
        }
    }
}

/// Every tunable the renderer, driver and front end read.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct Config {
    pub(crate) grid: GridDims,
    pub(crate) characters: CharRamp,
    pub(crate) globe: GlobeSettings,
    pub(crate) camera: CameraSettings,
    pub(crate) lighting: LightingSettings,
    pub(crate) animation: AnimationGates,
    pub(crate) floating: FloatingSettings,
    pub(crate) display: DisplaySettings,
    pub(crate) test_pattern: PatternParams,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PatternGlyph {
    Border,
    Cross,
    Fill,
    Grid,
    Circle,
    Diagonal,
}

/// One adjustment of one parameter. All mutation of a running `Config` goes
/// through `Config::apply`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ConfigCommand {
    SetRamp(CharRamp),
    SetGlobeScale(f32),
    NudgeGlobeScale(f32),
    SetGlobeOffset { x: f32, y: f32 },
    NudgeGlobeOffset { dx: f32, dy: f32 },
    SetFlipped(bool),
    ToggleFlipped,
    SetCameraDistance(f32),
    NudgeCameraDistance(f32),
    SetOrbit { x: f32, y: f32 },
    NudgeOrbit { dx: f32, dy: f32 },
    SetFov(f32),
    SetLightMode(LightMode),
    ToggleLightMode,
    SetSunIntensity(f32),
    SetSunPosition([f32; 3]),
    SetMoonIntensity(f32),
    SetMoonPosition([f32; 3]),
    SetAmbientIntensity(f32),
    SetMovementPaused(bool),
    SetRotationPaused(bool),
    ToggleMovement,
    ToggleRotation,
    /// Flips both gates, as the space bar does.
    TogglePause,
    SetFloating(bool),
    SetShowTestPattern(bool),
    ToggleTestPattern,
    ToggleDebug,
    SetPatternKind(PatternKind),
    NextPatternKind,
    SetPatternSpacing(u32),
    NudgePatternSpacing(i32),
    SetPatternGlyph(PatternGlyph, char),
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("unknown config field `{0}`")]
    UnknownField(String),
    #[error("invalid value {value:?} for `{field}`: expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },
    #[error("`{0}` is fixed for the lifetime of the process")]
    Immutable(String),
    #[error("patch must look like field=value, got {0:?}")]
    MalformedPatch(String),
}

fn parse<T: FromStr>(field: &str, value: &str, expected: &'static str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    })
}

fn parse_char(field: &str, value: &str) -> Result<char, ConfigError> {
    let mut it = value.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: "a single character",
        }),
    }
}

impl Config {
    pub(crate) fn apply(&mut self, cmd: ConfigCommand) {
        use ConfigCommand::*;
        match cmd {
            SetRamp(r) => self.characters = r,
            SetGlobeScale(s) => self.globe.scale = s,
            NudgeGlobeScale(d) => self.globe.scale += d,
            SetGlobeOffset { x, y } => {
                self.globe.offset_x = x;
                self.globe.offset_y = y;
            }
            NudgeGlobeOffset { dx, dy } => {
                self.globe.offset_x += dx;
                self.globe.offset_y += dy;
            }
            SetFlipped(f) => self.globe.flipped = f,
            ToggleFlipped => self.globe.flipped = !self.globe.flipped,
            SetCameraDistance(d) => self.camera.distance = d,
            NudgeCameraDistance(d) => self.camera.distance += d,
            SetOrbit { x, y } => {
                self.camera.orbit_x = x;
                self.camera.orbit_y = y;
            }
            NudgeOrbit { dx, dy } => {
                self.camera.orbit_x += dx;
                self.camera.orbit_y += dy;
            }
            SetFov(f) => self.camera.fov = f,
            SetLightMode(m) => self.lighting.mode = m,
            ToggleLightMode => self.lighting.mode = self.lighting.mode.toggled(),
            SetSunIntensity(i) => self.lighting.sun_intensity = i,
            SetSunPosition([x, y, z]) => {
                self.lighting.sun_x = x;
                self.lighting.sun_y = y;
                self.lighting.sun_z = z;
            }
            SetMoonIntensity(i) => self.lighting.moon_intensity = i,
            SetMoonPosition([x, y, z]) => {
                self.lighting.moon_x = x;
                self.lighting.moon_y = y;
                self.lighting.moon_z = z;
            }
            SetAmbientIntensity(i) => self.lighting.ambient_intensity = i,
            SetMovementPaused(p) => self.animation.movement_paused = p,
            SetRotationPaused(p) => self.animation.rotation_paused = p,
            ToggleMovement => self.animation.movement_paused = !self.animation.movement_paused,
            ToggleRotation => self.animation.rotation_paused = !self.animation.rotation_paused,
            TogglePause => {
                self.animation.movement_paused = !self.animation.movement_paused;
                self.animation.rotation_paused = !self.animation.rotation_paused;
            }
            SetFloating(e) => self.floating.enabled = e,
            SetShowTestPattern(s) => self.display.show_test_pattern = s,
            ToggleTestPattern => self.display.show_test_pattern = !self.display.show_test_pattern,
            ToggleDebug => self.display.show_debug = !self.display.show_debug,
            SetPatternKind(k) => self.test_pattern.kind = k,
            NextPatternKind => self.test_pattern.kind = self.test_pattern.kind.next(),
            SetPatternSpacing(s) => self.test_pattern.spacing = s,
            NudgePatternSpacing(d) => {
                let next = self.test_pattern.spacing as i64 + d as i64;
                self.test_pattern.spacing = next.clamp(1, u32::MAX as i64) as u32;
            }
            SetPatternGlyph(which, c) => {
                let p = &mut self.test_pattern;
                match which {
                    PatternGlyph::Border => p.border_char = c,
                    PatternGlyph::Cross => p.cross_char = c,
                    PatternGlyph::Fill => p.fill_char = c,
                    PatternGlyph::Grid => p.grid_char = c,
                    PatternGlyph::Circle => p.circle_char = c,
                    PatternGlyph::Diagonal => p.diagonal_char = c,
                }
            }
        }
    }

    /// Resolves a dotted field name (as spelled in the JSON file) and a textual
    /// value into a command against the current state.
    pub(crate) fn command_for(&self, field: &str, value: &str) -> Result<ConfigCommand, ConfigError> {
        use ConfigCommand::*;
        const NUM: &str = "a number";
        const BOOL: &str = "true or false";
        let num = || parse::<f32>(field, value, NUM);
        let flag = || parse::<bool>(field, value, BOOL);
        let glyph = |which| parse_char(field, value).map(|c| SetPatternGlyph(which, c));
        let l = &self.lighting;

        let cmd = match field {
            "grid.cols" | "grid.rows" => return Err(ConfigError::Immutable(field.to_string())),
            "characters" => SetRamp(CharRamp::new(value).map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                expected: "at least 2 characters",
            })?),
            "globe.scale" => SetGlobeScale(num()?),
            "globe.offsetX" => SetGlobeOffset {
                x: num()?,
                y: self.globe.offset_y,
            },
            "globe.offsetY" => SetGlobeOffset {
                x: self.globe.offset_x,
                y: num()?,
            },
            "globe.flipped" => SetFlipped(flag()?),
            "camera.distance" => SetCameraDistance(num()?),
            "camera.orbitX" => SetOrbit {
                x: num()?,
                y: self.camera.orbit_y,
            },
            "camera.orbitY" => SetOrbit {
                x: self.camera.orbit_x,
                y: num()?,
            },
            "camera.fov" => SetFov(num()?),
            "lighting.mode" => SetLightMode(parse(field, value, "sun or moon")?),
            "lighting.sunIntensity" => SetSunIntensity(num()?),
            "lighting.sunX" => SetSunPosition([num()?, l.sun_y, l.sun_z]),
            "lighting.sunY" => SetSunPosition([l.sun_x, num()?, l.sun_z]),
            "lighting.sunZ" => SetSunPosition([l.sun_x, l.sun_y, num()?]),
            "lighting.moonIntensity" => SetMoonIntensity(num()?),
            "lighting.moonX" => SetMoonPosition([num()?, l.moon_y, l.moon_z]),
            "lighting.moonY" => SetMoonPosition([l.moon_x, num()?, l.moon_z]),
            "lighting.moonZ" => SetMoonPosition([l.moon_x, l.moon_y, num()?]),
            "lighting.ambientIntensity" => SetAmbientIntensity(num()?),
            "animation.movementPaused" => SetMovementPaused(flag()?),
            "animation.rotationPaused" => SetRotationPaused(flag()?),
            "floating.enabled" => SetFloating(flag()?),
            "display.showTestPattern" => SetShowTestPattern(flag()?),
            // unknown kinds are accepted and render as plain fill
            "testPattern.kind" => SetPatternKind(value.trim().parse().unwrap_or(PatternKind::Unknown)),
            "testPattern.spacing" => {
                SetPatternSpacing(parse(field, value, "a non-negative integer")?)
            }
            "testPattern.borderChar" => glyph(PatternGlyph::Border)?,
            "testPattern.crossChar" => glyph(PatternGlyph::Cross)?,
            "testPattern.fillChar" => glyph(PatternGlyph::Fill)?,
            "testPattern.gridChar" => glyph(PatternGlyph::Grid)?,
            "testPattern.circleChar" => glyph(PatternGlyph::Circle)?,
            "testPattern.diagonalChar" => glyph(PatternGlyph::Diagonal)?,
            _ => return Err(ConfigError::UnknownField(field.to_string())),
        };
        Ok(cmd)
    }

    /// Validated single-field update. Nothing changes on error.
    pub(crate) fn apply_patch(&mut self, field: &str, value: &str) -> Result<(), ConfigError> {
        let cmd = self.command_for(field, value)?;
        self.apply(cmd);
        Ok(())
    }

    /// `field=value`, the form accepted by `--set`.
    pub(crate) fn apply_patch_str(&mut self, patch: &str) -> Result<(), ConfigError> {
        let (field, value) = patch
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedPatch(patch.to_string()))?;
        self.apply_patch(field.trim(), value)
    }
}

pub(crate) struct Paths {
    pub(crate) config_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "asciiglobe", "AsciiGlobe")
        .context("could not resolve project directories")?;
    let config_dir = proj.config_dir().to_path_buf();
    let data_dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&data_dir).ok();
    Ok(Paths {
        config_path: config_dir.join("config.json"),
        log_path: data_dir.join("asciiglobe.log"),
    })
}

/// Missing or unreadable files yield the defaults.
pub(crate) fn load_config(path: &Path) -> Config {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Config::default();
        }
    };
    match serde_json::from_str::<Config>(&s) {
        Ok(cfg) if cfg.grid.is_plausible() => cfg,
        Ok(cfg) => {
            tracing::warn!(path = %path.display(), grid = ?cfg.grid, "config grid out of range, using defaults");
            Config::default()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "invalid config file, using defaults");
            Config::default()
        }
    }
}
