use serde::{Deserialize, Deserializer};
use std::fmt;

pub(crate) const DEFAULT_RAMP: &str = "   ·—+=##";

/// Glyphs ordered from darkest (index 0) to brightest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CharRamp {
    glyphs: Vec<char>,
}

impl CharRamp {
    pub(crate) fn new(s: &str) -> anyhow::Result<Self> {
        let glyphs: Vec<char> = s.chars().collect();
        if glyphs.len() < 2 {
            anyhow::bail!("character ramp needs at least 2 glyphs, got {:?}", s);
        }
        Ok(Self { glyphs })
    }

    pub(crate) fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Glyph at `idx`, or a space when the index is out of range.
    pub(crate) fn glyph(&self, idx: usize) -> char {
        self.glyphs.get(idx).copied().unwrap_or(' ')
    }
}

impl Default for CharRamp {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_RAMP.chars().collect(),
        }
    }
}

impl fmt::Display for CharRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.glyphs {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for CharRamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CharRamp::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ramp_keeps_multibyte_glyphs() {
        let ramp = CharRamp::default();
        assert_eq!(ramp.len(), 9);
        assert_eq!(ramp.glyph(3), '·');
        assert_eq!(ramp.glyph(4), '—');
        assert_eq!(ramp.glyph(8), '#');
        assert_eq!(ramp.to_string(), DEFAULT_RAMP);
    }

    #[test]
    fn out_of_range_glyph_is_space() {
        let ramp = CharRamp::new("ab").unwrap();
        assert_eq!(ramp.glyph(2), ' ');
        assert_eq!(ramp.glyph(usize::MAX), ' ');
    }

    #[test]
    fn rejects_short_ramps() {
        assert!(CharRamp::new("").is_err());
        assert!(CharRamp::new("#").is_err());
        assert!(CharRamp::new(" #").is_ok());
    }

    #[test]
    fn deserializes_from_plain_string() {
        let ramp: CharRamp = serde_json::from_str("\" .#\"").unwrap();
        assert_eq!(ramp.len(), 3);
        assert_eq!(ramp.glyph(2), '#');
        assert!(serde_json::from_str::<CharRamp>("\"x\"").is_err());
    }
}
