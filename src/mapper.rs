use crate::config::GridDims;
use crate::ramp::CharRamp;

/// RGBA, one byte per channel.
pub(crate) const BYTES_PER_PIXEL: usize = 4;

/// Vertical storage order of rows in a pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RowOrder {
    /// Row 0 is the bottom of the image (GL readback convention).
    BottomUp,
    TopDown,
}

/// The renderer always writes bottom-up.
pub(crate) const BUFFER_ROW_ORDER: RowOrder = RowOrder::BottomUp;

impl RowOrder {
    /// Buffer row holding output line `y`.
    pub(crate) fn source_row(self, y: usize, rows: usize) -> usize {
        match self {
            RowOrder::BottomUp => rows - 1 - y,
            RowOrder::TopDown => y,
        }
    }
}

/// Mean of R, G and B. Double precision keeps bucket edges exact for any ramp length.
pub(crate) fn luminance(px: &[u8]) -> f64 {
    (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0
}

/// floor(lum / 255 * (len - 1)), clamped into the ramp.
pub(crate) fn glyph_index(lum: f64, ramp_len: usize) -> usize {
    if ramp_len == 0 {
        return 0;
    }
    let top = ramp_len - 1;
    let idx = ((lum / 255.0) * top as f64).floor();
    if idx.is_nan() || idx <= 0.0 {
        0
    } else {
        (idx as usize).min(top)
    }
}

/// Converts an RGBA buffer of `dims` pixels into text, one glyph per pixel.
/// Caller guarantees `buf.len() == cols * rows * BYTES_PER_PIXEL`.
pub(crate) fn pixels_to_text(buf: &[u8], dims: GridDims, order: RowOrder, ramp: &CharRamp) -> String {
    let (cols, rows) = (dims.cols as usize, dims.rows as usize);
    let mut out = String::with_capacity((cols + 1) * rows * 2);
    for y in 0..rows {
        let row = order.source_row(y, rows);
        for x in 0..cols {
            let i = (row * cols + x) * BYTES_PER_PIXEL;
            let lum = luminance(&buf[i..i + BYTES_PER_PIXEL]);
            out.push(ramp.glyph(glyph_index(lum, ramp.len())));
        }
        if y + 1 < rows {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(cols: u16, rows: u16) -> GridDims {
        GridDims { cols, rows }
    }

    fn solid(d: GridDims, v: u8) -> Vec<u8> {
        let mut buf = vec![v; d.pixel_count() * BYTES_PER_PIXEL];
        for px in buf.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[3] = 255;
        }
        buf
    }

    #[test]
    fn glyph_index_is_monotonic_and_in_range() {
        for len in 2..=12usize {
            let mut last = 0;
            for v in 0..=255u32 {
                let idx = glyph_index(v as f64, len);
                assert!(idx < len, "len {len} v {v} -> {idx}");
                assert!(idx >= last, "len {len} v {v} not monotonic");
                last = idx;
            }
            assert_eq!(glyph_index(0.0, len), 0);
            assert_eq!(glyph_index(255.0, len), len - 1);
        }
    }

    #[test]
    fn glyph_index_clamps_wild_input() {
        assert_eq!(glyph_index(-10.0, 5), 0);
        assert_eq!(glyph_index(1000.0, 5), 4);
        assert_eq!(glyph_index(f64::NAN, 5), 0);
    }

    #[test]
    fn bucket_edges_follow_double_precision() {
        // (0 + 255 + 170) / 3 / 255 * 9 lands just under 5
        assert_eq!(glyph_index(luminance(&[0, 255, 170, 255]), 10), 4);
        assert_eq!(glyph_index(luminance(&[1, 254, 170, 255]), 10), 4);
        assert_eq!(glyph_index(luminance(&[42, 128, 255, 255]), 10), 4);

        for len in 2..=96usize {
            for v in [0u8, 1, 42, 85, 128, 170, 254, 255] {
                for px in [[v, 255, 170], [0, v, 255], [v, v, 1]] {
                    let sum = px[0] as f64 + px[1] as f64 + px[2] as f64;
                    let want = ((sum / 3.0) / 255.0 * (len - 1) as f64).floor() as usize;
                    let got = glyph_index(luminance(&[px[0], px[1], px[2], 255]), len);
                    assert_eq!(got, want.min(len - 1), "len {len} px {px:?}");
                }
            }
        }
    }

    #[test]
    fn luminance_ignores_alpha() {
        assert_eq!(luminance(&[30, 60, 90, 0]), 60.0);
        assert_eq!(luminance(&[30, 60, 90, 255]), 60.0);
    }

    #[test]
    fn output_shape_matches_grid() {
        let d = dims(7, 3);
        let text = pixels_to_text(&solid(d, 128), d, BUFFER_ROW_ORDER, &CharRamp::default());
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert_eq!(line.chars().count(), 7);
        }
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn bottom_row_of_buffer_is_first_line() {
        let d = dims(2, 3);
        let mut buf = solid(d, 0);
        // light up buffer row rows-1 (the top of the image)
        let start = 2 * 2 * BYTES_PER_PIXEL;
        for b in &mut buf[start..start + 2 * BYTES_PER_PIXEL] {
            *b = 255;
        }
        let ramp = CharRamp::new(" #").unwrap();
        let text = pixels_to_text(&buf, d, RowOrder::BottomUp, &ramp);
        assert_eq!(text, "##\n  \n  ");

        let text = pixels_to_text(&buf, d, RowOrder::TopDown, &ramp);
        assert_eq!(text, "  \n  \n##");
    }

    #[test]
    fn brightness_picks_ramp_bucket() {
        let d = dims(3, 1);
        let mut buf = solid(d, 0);
        buf[4..7].copy_from_slice(&[128, 128, 128]);
        buf[8..11].copy_from_slice(&[255, 255, 255]);
        let ramp = CharRamp::new(".:#").unwrap();
        assert_eq!(pixels_to_text(&buf, d, RowOrder::TopDown, &ramp), ".:#");
    }
}
