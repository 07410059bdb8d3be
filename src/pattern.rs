use crate::config::GridDims;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PatternKind {
    BorderCross,
    Grid,
    Circles,
    Diagonals,
    Numbered,
    /// Anything unrecognised in a config file; renders as plain fill.
    #[serde(other)]
    Unknown,
}

impl PatternKind {
    pub(crate) const ALL: [PatternKind; 5] = [
        PatternKind::BorderCross,
        PatternKind::Grid,
        PatternKind::Circles,
        PatternKind::Diagonals,
        PatternKind::Numbered,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            PatternKind::BorderCross => "border-cross",
            PatternKind::Grid => "grid",
            PatternKind::Circles => "circles",
            PatternKind::Diagonals => "diagonals",
            PatternKind::Numbered => "numbered",
            PatternKind::Unknown => "unknown",
        }
    }

    pub(crate) fn next(self) -> Self {
        let i = Self::ALL.iter().position(|k| *k == self).map_or(0, |i| i + 1);
        Self::ALL[i % Self::ALL.len()]
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .unwrap_or(PatternKind::Unknown))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct PatternParams {
    pub(crate) kind: PatternKind,
    pub(crate) spacing: u32,
    pub(crate) border_char: char,
    pub(crate) cross_char: char,
    pub(crate) fill_char: char,
    pub(crate) grid_char: char,
    pub(crate) circle_char: char,
    pub(crate) diagonal_char: char,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            kind: PatternKind::BorderCross,
            spacing: 4,
            border_char: '#',
            cross_char: '+',
            fill_char: '.',
            grid_char: '·',
            circle_char: 'o',
            diagonal_char: '/',
        }
    }
}

/// `a % s == 0` with truncating remainder; never true for a zero spacing.
fn on_line(a: i64, s: i64) -> bool {
    s != 0 && a % s == 0
}

/// Within one unit past a multiple of `s`. f64 `%` keeps the dividend's
/// sign; a zero spacing gives NaN, which compares false.
fn on_circle(dist: f64, s: u32) -> bool {
    (dist % s as f64).abs() < 1.0
}

fn cell(x: i64, y: i64, w: i64, h: i64, p: &PatternParams) -> char {
    let s = p.spacing as i64;
    match p.kind {
        PatternKind::BorderCross => {
            if x == 0 || x == w - 1 || y == 0 || y == h - 1 {
                p.border_char
            } else if x == w / 2 || y == h / 2 {
                p.cross_char
            } else {
                p.fill_char
            }
        }
        PatternKind::Grid => {
            if x == w / 2 || y == h / 2 {
                p.cross_char
            } else if on_line(x, s) || on_line(y, s) {
                p.grid_char
            } else {
                p.fill_char
            }
        }
        PatternKind::Circles => {
            let cx = w as f64 / 2.0;
            let cy = h as f64 / 2.0;
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if on_circle((dx * dx + dy * dy).sqrt(), p.spacing) {
                p.circle_char
            } else {
                p.fill_char
            }
        }
        PatternKind::Diagonals => {
            if on_line(x + y, s) || on_line(x - y, s) {
                p.diagonal_char
            } else {
                p.fill_char
            }
        }
        PatternKind::Numbered => {
            if on_line(x, s) && on_line(y, s) {
                let digit = ((x / s) % 10) as u32;
                char::from_digit(digit, 10).unwrap_or(p.grid_char)
            } else if on_line(x, s) || on_line(y, s) {
                p.grid_char
            } else {
                p.fill_char
            }
        }
        PatternKind::Unknown => p.fill_char,
    }
}

/// Renders the alignment pattern for `dims`. Same layout as the mapper: `rows`
/// lines of `cols` glyphs joined by `'\n'`.
pub(crate) fn generate(dims: GridDims, params: &PatternParams) -> String {
    let (w, h) = (dims.cols as i64, dims.rows as i64);
    let mut out = String::with_capacity(((w + 1) * h) as usize);
    for y in 0..h {
        for x in 0..w {
            out.push(cell(x, y, w, h, params));
        }
        if y + 1 < h {
            out.push('\n');
        }
    }
    out
}
