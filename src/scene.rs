use crate::config::{CameraSettings, Config, GridDims, LightMode, LightingSettings};
use crate::mapper::BYTES_PER_PIXEL;
use crate::texture::Texture;
use glam::{EulerRot, Quat, Vec3};
use std::f32::consts::PI;

pub(crate) const BASE_RADIUS: f32 = 3.0;

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

const ROUGHNESS: f32 = 0.8;
const METALNESS: f32 = 0.2;

// #ffffff, #4040ff, #303030
const SUN_COLOR: Vec3 = Vec3::new(1.0, 1.0, 1.0);
const MOON_COLOR: Vec3 = Vec3::new(0.251, 0.251, 1.0);
const AMBIENT_COLOR: Vec3 = Vec3::splat(0.188);

#[derive(Clone, Copy, Debug)]
pub(crate) struct DirectionalLight {
    pub(crate) color: Vec3,
    pub(crate) intensity: f32,
    /// Shines from here towards the origin.
    pub(crate) position: Vec3,
}

impl DirectionalLight {
    fn towards_light(&self) -> Vec3 {
        self.position.normalize_or_zero()
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Camera {
    pub(crate) settings: CameraSettings,
    pub(crate) position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    tan_half_fov: f32,
}

impl Camera {
    /// Places the camera on a sphere around the origin and aims it there.
    pub(crate) fn orbit(settings: CameraSettings) -> Self {
        let CameraSettings {
            distance,
            orbit_x,
            orbit_y,
            fov,
        } = settings;
        let position = Vec3::new(
            distance * orbit_y.sin() * orbit_x.cos(),
            distance * orbit_x.sin(),
            distance * orbit_y.cos() * orbit_x.cos(),
        );

        let mut forward = (-position).normalize_or_zero();
        if forward == Vec3::ZERO {
            forward = Vec3::NEG_Z;
        }
        let mut right = forward.cross(Vec3::Y);
        if right.length_squared() < 1e-8 {
            // looking straight up or down
            right = forward.cross(Vec3::Z);
        }
        let right = right.normalize();
        let up = right.cross(forward);

        Self {
            settings,
            position,
            forward,
            right,
            up,
            tan_half_fov: (fov.to_radians() * 0.5).tan(),
        }
    }

    /// Ray through normalised device coordinates, y up. Aspect is 1.
    fn ray(&self, ndc_x: f32, ndc_y: f32) -> Vec3 {
        (self.forward + self.right * (ndc_x * self.tan_half_fov) + self.up * (ndc_y * self.tan_half_fov))
            .normalize()
    }
}

/// Time-driven part of the globe orientation, owned by the animator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct GlobePose {
    pub(crate) rotation_x: f64,
    pub(crate) rotation_y: f64,
}

struct Globe {
    radius: f32,
    center: Vec3,
    rotation: Quat,
}

/// Sphere, two directional lights, an ambient light and a camera, rendered by
/// ray casting into an RGBA buffer of `dims` pixels.
pub(crate) struct SceneRenderer {
    dims: GridDims,
    texture: Texture,
    globe: Globe,
    pub(crate) sun: DirectionalLight,
    pub(crate) moon: DirectionalLight,
    pub(crate) ambient_intensity: f32,
    pub(crate) camera: Camera,
}

impl SceneRenderer {
    pub(crate) fn new(dims: GridDims, texture: Texture, cfg: &Config) -> Self {
        let mut scene = Self {
            dims,
            texture,
            globe: Globe {
                radius: BASE_RADIUS,
                center: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
            sun: DirectionalLight {
                color: SUN_COLOR,
                intensity: 0.0,
                position: Vec3::ZERO,
            },
            moon: DirectionalLight {
                color: MOON_COLOR,
                intensity: 0.0,
                position: Vec3::ZERO,
            },
            ambient_intensity: 0.0,
            camera: Camera::orbit(cfg.camera),
        };
        scene.sync(cfg, GlobePose::default());
        scene
    }

    pub(crate) fn dims(&self) -> GridDims {
        self.dims
    }

    /// Pulls pose, lighting and camera from the config.
    pub(crate) fn sync(&mut self, cfg: &Config, pose: GlobePose) {
        self.apply_lighting(&cfg.lighting);

        if cfg.camera != self.camera.settings {
            self.camera = Camera::orbit(cfg.camera);
            tracing::debug!(position = ?self.camera.position, "camera orbit updated");
        }

        let g = &cfg.globe;
        let flip = if g.flipped { PI } else { 0.0 };
        self.globe.radius = BASE_RADIUS * g.scale;
        self.globe.center = Vec3::new(g.offset_x, g.offset_y, 0.0);
        // rem_euclid only for f32 precision; the accumulated angle stays untouched
        self.globe.rotation = Quat::from_euler(
            EulerRot::XYZ,
            pose.rotation_x as f32,
            pose.rotation_y.rem_euclid(std::f64::consts::TAU) as f32,
            flip,
        );
    }

    /// Exactly one directional light is lit; ambient always applies.
    fn apply_lighting(&mut self, ls: &LightingSettings) {
        match ls.mode {
            LightMode::Sun => {
                self.sun.intensity = ls.sun_intensity;
                self.sun.position = Vec3::new(ls.sun_x, ls.sun_y, ls.sun_z);
                self.moon.intensity = 0.0;
            }
            LightMode::Moon => {
                self.sun.intensity = 0.0;
                self.moon.intensity = ls.moon_intensity;
                self.moon.position = Vec3::new(ls.moon_x, ls.moon_y, ls.moon_z);
            }
        }
        self.ambient_intensity = ls.ambient_intensity;
    }

    /// Overwrites `buf` (bottom row first) with the current frame.
    pub(crate) fn render(&self, buf: &mut [u8]) {
        let (w, h) = (self.dims.cols as usize, self.dims.rows as usize);
        debug_assert_eq!(buf.len(), w * h * BYTES_PER_PIXEL);

        for py in 0..h {
            let ndc_y = (py as f32 + 0.5) / h as f32 * 2.0 - 1.0;
            for px in 0..w {
                let ndc_x = (px as f32 + 0.5) / w as f32 * 2.0 - 1.0;
                let c = self.shade(self.camera.ray(ndc_x, ndc_y));
                let i = (py * w + px) * BYTES_PER_PIXEL;
                buf[i] = to_byte(c.x);
                buf[i + 1] = to_byte(c.y);
                buf[i + 2] = to_byte(c.z);
                buf[i + 3] = 255;
            }
        }
    }

    fn intersect(&self, dir: Vec3) -> Option<Vec3> {
        let r = self.globe.radius;
        if r.abs() < 1e-6 {
            return None;
        }
        let oc = self.camera.position - self.globe.center;
        let b = oc.dot(dir);
        let c = oc.length_squared() - r * r;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        // front faces only: from inside the sphere nothing is visible
        let t = -b - disc.sqrt();
        if !(NEAR..=FAR).contains(&t) {
            return None;
        }
        Some(self.camera.position + dir * t)
    }

    fn shade(&self, dir: Vec3) -> Vec3 {
        let Some(hit) = self.intersect(dir) else {
            return Vec3::ZERO;
        };
        // a negative radius turns the normals inside out
        let normal = (hit - self.globe.center) / self.globe.radius;
        let local = self.globe.rotation.inverse() * normal;
        let albedo = self.texture.sample_dir(local.normalize_or_zero());

        let diffuse_color = albedo * (1.0 - METALNESS);
        let f0 = Vec3::splat(0.04).lerp(albedo, METALNESS);
        let shininess = (2.0 / ROUGHNESS.powi(4) - 2.0).max(1.0);
        let view = -dir;

        let mut irradiance = AMBIENT_COLOR * self.ambient_intensity;
        let mut specular = Vec3::ZERO;
        for light in [&self.sun, &self.moon] {
            if light.intensity <= 0.0 {
                continue;
            }
            let l = light.towards_light();
            let ndl = normal.dot(l).max(0.0);
            if ndl <= 0.0 {
                continue;
            }
            let radiance = light.color * light.intensity * ndl;
            irradiance += radiance;
            let half = (l + view).normalize_or_zero();
            let ndh = normal.dot(half).max(0.0);
            specular += f0 * radiance * ((shininess + 2.0) / 8.0) * ndh.powf(shininess);
        }

        diffuse_color * irradiance + specular
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: GridDims = GridDims { cols: 32, rows: 32 };

    fn front_config() -> Config {
        let mut cfg = Config::default();
        cfg.camera.orbit_y = 0.0;
        cfg
    }

    fn render(scene: &SceneRenderer) -> Vec<u8> {
        let mut buf = vec![0u8; DIMS.pixel_count() * BYTES_PER_PIXEL];
        scene.render(&mut buf);
        buf
    }

    fn lum(buf: &[u8], x: usize, y: usize) -> u32 {
        let i = (y * DIMS.cols as usize + x) * BYTES_PER_PIXEL;
        (buf[i] as u32 + buf[i + 1] as u32 + buf[i + 2] as u32) / 3
    }

    // mean (x, y) of lit pixels, buffer coordinates
    fn centroid(buf: &[u8]) -> (f32, f32) {
        let (mut sx, mut sy, mut n) = (0.0, 0.0, 0.0);
        for y in 0..DIMS.rows as usize {
            for x in 0..DIMS.cols as usize {
                if lum(buf, x, y) > 0 {
                    sx += x as f32;
                    sy += y as f32;
                    n += 1.0;
                }
            }
        }
        assert!(n > 0.0, "nothing rendered");
        (sx / n, sy / n)
    }

    #[test]
    fn default_orbit_position() {
        let cam = Camera::orbit(CameraSettings::default());
        let expected = Vec3::new(5.0 * 0.8f32.sin(), 0.0, 5.0 * 0.8f32.cos());
        assert!((cam.position - expected).length() < 1e-5);
        assert!((cam.forward + expected.normalize()).length() < 1e-5);
    }

    #[test]
    fn orbit_over_the_pole_stays_finite() {
        let cam = Camera::orbit(CameraSettings {
            orbit_x: std::f32::consts::FRAC_PI_2,
            ..CameraSettings::default()
        });
        assert!(cam.position.y > 4.99);
        assert!(cam.right.is_finite() && cam.up.is_finite());
        assert!((cam.right.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn only_one_directional_light_is_lit() {
        let mut cfg = Config::default();
        let mut scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        assert_eq!(scene.sun.intensity, 1.2);
        assert_eq!(scene.moon.intensity, 0.0);

        cfg.lighting.mode = LightMode::Moon;
        scene.sync(&cfg, GlobePose::default());
        assert_eq!(scene.sun.intensity, 0.0);
        assert_eq!(scene.moon.intensity, 0.1);
        assert_eq!(scene.moon.position, Vec3::new(-5.0, -5.0, 5.0));
        assert_eq!(scene.ambient_intensity, 0.7);
    }

    #[test]
    fn camera_follows_config_changes() {
        let mut cfg = Config::default();
        let mut scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        cfg.camera.distance = 9.0;
        scene.sync(&cfg, GlobePose::default());
        assert!((scene.camera.position.length() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn sphere_covers_centre_not_corners() {
        let cfg = Config::default();
        let scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        let buf = render(&scene);
        assert_eq!(buf.len(), 32 * 32 * 4);
        assert!(lum(&buf, 16, 16) > 0);
        for (x, y) in [(0, 0), (31, 0), (0, 31), (31, 31)] {
            assert_eq!(lum(&buf, x, y), 0);
        }
        assert!(buf.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn zero_scale_renders_black() {
        let mut cfg = Config::default();
        cfg.globe.scale = 0.0;
        let scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        assert!(render(&scene).chunks_exact(4).all(|p| p[..3] == [0, 0, 0]));
    }

    #[test]
    fn negative_scale_does_not_panic() {
        let mut cfg = Config::default();
        cfg.globe.scale = -0.5;
        let scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        assert_eq!(render(&scene).len(), DIMS.pixel_count() * 4);
    }

    #[test]
    fn offsets_move_the_globe_on_screen() {
        let mut cfg = front_config();
        cfg.globe.offset_x = 1.0;
        cfg.globe.offset_y = 1.0;
        let scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        let (cx, cy) = centroid(&render(&scene));
        assert!(cx > 16.5, "cx {cx}");
        // bottom-up storage: up in the world is a higher row index
        assert!(cy > 16.5, "cy {cy}");
    }

    #[test]
    fn sun_side_is_brighter() {
        let mut cfg = front_config();
        cfg.lighting.sun_x = 10.0;
        cfg.lighting.sun_y = 0.0;
        cfg.lighting.sun_z = 0.0;
        let scene = SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg);
        let buf = render(&scene);
        assert!(lum(&buf, 20, 16) > lum(&buf, 11, 16));
    }

    #[test]
    fn moon_mode_is_darker_than_sun_mode() {
        let mut cfg = front_config();
        let sun = render(&SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg));
        cfg.lighting.mode = LightMode::Moon;
        let moon = render(&SceneRenderer::new(DIMS, Texture::solid([200, 200, 200]), &cfg));
        assert!(lum(&sun, 16, 16) > lum(&moon, 16, 16));
        assert!(lum(&moon, 16, 16) > 0, "ambient keeps the night side visible");
    }

    #[test]
    fn spin_changes_the_picture() {
        let cfg = front_config();
        let mut scene = SceneRenderer::new(DIMS, Texture::procedural_earth(64, 32, 3), &cfg);
        let a = render(&scene);
        scene.sync(
            &cfg,
            GlobePose {
                rotation_x: 0.0,
                rotation_y: -1.5,
            },
        );
        let b = render(&scene);
        assert_ne!(a, b);
    }
}
