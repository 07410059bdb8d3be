use anyhow::{Context, Result};
use glam::{IVec3, Vec3};
use std::f32::consts::{PI, TAU};
use std::path::Path;

/// Equirectangular RGB map, row 0 at the north pole.
pub(crate) struct Texture {
    w: usize,
    h: usize,
    rgb: Vec<[u8; 3]>,
}

impl Texture {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("loading globe texture {}", path.display()))?
            .to_rgb8();
        let (w, h) = (img.width() as usize, img.height() as usize);
        if w == 0 || h == 0 {
            anyhow::bail!("globe texture {} is empty", path.display());
        }
        let rgb = img.pixels().map(|p| p.0).collect();
        tracing::info!(path = %path.display(), w, h, "loaded globe texture");
        Ok(Self { w, h, rgb })
    }

    /// Value-noise continents with polar caps.
    pub(crate) fn procedural_earth(w: usize, h: usize, seed: u32) -> Self {
        let mut rgb = Vec::with_capacity(w * h);
        for j in 0..h {
            let theta = (j as f32 + 0.5) / h as f32 * PI;
            for i in 0..w {
                let phi = (i as f32 + 0.5) / w as f32 * TAU;
                let n = dir_from_angles(theta, phi);
                rgb.push(earth_texel(n, seed));
            }
        }
        Self { w, h, rgb }
    }

    #[cfg(test)]
    pub(crate) fn solid(rgb: [u8; 3]) -> Self {
        Self {
            w: 1,
            h: 1,
            rgb: vec![rgb],
        }
    }

    fn texel(&self, x: usize, y: usize) -> Vec3 {
        let [r, g, b] = self.rgb[y * self.w + x];
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    /// Bilinear lookup; u wraps, t (0 = top) clamps.
    pub(crate) fn sample(&self, u: f32, t: f32) -> Vec3 {
        let fx = u.rem_euclid(1.0) * self.w as f32 - 0.5;
        let fy = (t.clamp(0.0, 1.0) * self.h as f32 - 0.5).clamp(0.0, (self.h - 1) as f32);
        let x0 = fx.floor();
        let y0 = fy.floor();
        let (ax, ay) = (fx - x0, fy - y0);

        let xi0 = (x0 as i64).rem_euclid(self.w as i64) as usize;
        let xi1 = (xi0 + 1) % self.w;
        let yi0 = y0 as usize;
        let yi1 = (yi0 + 1).min(self.h - 1);

        let top = self.texel(xi0, yi0).lerp(self.texel(xi1, yi0), ax);
        let bottom = self.texel(xi0, yi1).lerp(self.texel(xi1, yi1), ax);
        top.lerp(bottom, ay)
    }

    /// Colour at a unit direction in the sphere's local frame.
    pub(crate) fn sample_dir(&self, n: Vec3) -> Vec3 {
        let theta = n.y.clamp(-1.0, 1.0).acos();
        let phi = n.z.atan2(-n.x).rem_euclid(TAU);
        self.sample(phi / TAU, theta / PI)
    }
}

// Inverse of `sample_dir`'s angle convention (seam on -x, u grows towards +z).
fn dir_from_angles(theta: f32, phi: f32) -> Vec3 {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    Vec3::new(-cp * st, ct, sp * st)
}

const CONTINENT_FREQ: f32 = 1.6;
const COAST_WARP: f32 = 0.35;
const SEA_LEVEL: f32 = 0.5;

fn earth_texel(n: Vec3, seed: u32) -> [u8; 3] {
    const DEEP: Vec3 = Vec3::new(0.04, 0.12, 0.36);
    const SHALLOW: Vec3 = Vec3::new(0.10, 0.32, 0.55);
    const FOREST: Vec3 = Vec3::new(0.16, 0.46, 0.18);
    const DESERT: Vec3 = Vec3::new(0.74, 0.64, 0.40);
    const MOUNTAIN: Vec3 = Vec3::new(0.50, 0.44, 0.36);
    const ICE: Vec3 = Vec3::new(0.92, 0.94, 0.96);

    // coastlines wander by sampling through a low-frequency offset field
    let warp = Vec3::new(
        elevation(n * 3.0 + Vec3::X * 17.0, seed ^ 0x51ed, 2),
        elevation(n * 3.0 + Vec3::Y * 31.0, seed ^ 0x2c9b, 2),
        elevation(n * 3.0 + Vec3::Z * 47.0, seed ^ 0x7a13, 2),
    ) - Vec3::splat(0.5);
    let height = elevation((n + warp * COAST_WARP) * CONTINENT_FREQ, seed, 4);
    let lat = n.y.abs();

    let mut c = if height < SEA_LEVEL {
        DEEP.lerp(SHALLOW, smoothstep(((height - SEA_LEVEL) / 0.1 + 1.0).clamp(0.0, 1.0)))
    } else {
        // dry belt around the subtropics
        let arid = smoothstep((1.0 - (lat - 0.4).abs() / 0.15).clamp(0.0, 1.0));
        let land = FOREST.lerp(DESERT, arid);
        land.lerp(MOUNTAIN, ((height - SEA_LEVEL) / 0.25).clamp(0.0, 1.0))
    };

    c = c.lerp(ICE, smoothstep(((lat - 0.86) / 0.06).clamp(0.0, 1.0)));

    let c = (c * 255.0).round().clamp(Vec3::ZERO, Vec3::splat(255.0));
    [c.x as u8, c.y as u8, c.z as u8]
}

/// Pseudo-random value in [0, 1] for an integer lattice point.
fn lattice(cell: IVec3, seed: u32) -> f32 {
    let key = (cell.x as u32).wrapping_mul(73_856_093)
        ^ (cell.y as u32).wrapping_mul(19_349_663)
        ^ (cell.z as u32).wrapping_mul(83_492_791)
        ^ seed;
    // PCG output permutation
    let state = key.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    ((word >> 22) ^ word) as f32 / u32::MAX as f32
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Trilinear value noise with smoothstep fade, in [0, 1].
fn value_noise(p: Vec3, seed: u32) -> f32 {
    let floor = p.floor();
    let f = p - floor;
    let t = f * f * (Vec3::splat(3.0) - 2.0 * f);
    let base = floor.as_ivec3();
    let at = |dx: i32, dy: i32, dz: i32| lattice(base + IVec3::new(dx, dy, dz), seed);

    let front = mix(
        mix(at(0, 0, 0), at(1, 0, 0), t.x),
        mix(at(0, 1, 0), at(1, 1, 0), t.x),
        t.y,
    );
    let back = mix(
        mix(at(0, 0, 1), at(1, 0, 1), t.x),
        mix(at(0, 1, 1), at(1, 1, 1), t.x),
        t.y,
    );
    mix(front, back, t.z)
}

/// Fractal sum of `octaves` noise layers, normalised to [0, 1].
fn elevation(p: Vec3, seed: u32, octaves: u32) -> f32 {
    let (mut sum, mut weight, mut amp) = (0.0, 0.0, 1.0);
    let mut q = p;
    for octave in 0..octaves {
        sum += value_noise(q, seed.wrapping_add(octave)) * amp;
        weight += amp;
        amp *= 0.5;
        // shift each octave so lattice seams do not line up
        q = q * 2.0 + Vec3::splat(5.3);
    }
    if weight > 0.0 {
        (sum / weight).clamp(0.0, 1.0)
    } else {
        0.5
    }
}
