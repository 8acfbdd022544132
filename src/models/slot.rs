//! Named asset roles.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Poster,
    Fanart,
    Banner,
    Clearlogo,
    Clearart,
    Discart,
    Landscape,
    Thumb,
    Keyart,
    Trailer,
    Subtitle,
    Theme,
}

impl Slot {
    pub const IMAGE_SLOTS: [Slot; 9] = [
        Slot::Poster,
        Slot::Fanart,
        Slot::Banner,
        Slot::Clearlogo,
        Slot::Clearart,
        Slot::Discart,
        Slot::Landscape,
        Slot::Thumb,
        Slot::Keyart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Poster => "poster",
            Slot::Fanart => "fanart",
            Slot::Banner => "banner",
            Slot::Clearlogo => "clearlogo",
            Slot::Clearart => "clearart",
            Slot::Discart => "discart",
            Slot::Landscape => "landscape",
            Slot::Thumb => "thumb",
            Slot::Keyart => "keyart",
            Slot::Trailer => "trailer",
            Slot::Subtitle => "subtitle",
            Slot::Theme => "theme",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aspect-ratio/dimension spec used by the image classifier to validate
/// exact-filename and keyword matches.
#[derive(Debug, Clone, Copy)]
pub struct SlotDimensionSpec {
    pub aspect_min: f64,
    pub aspect_max: f64,
    pub min_width: u32,
    pub min_height: u32,
}

impl SlotDimensionSpec {
    /// 90% tolerance on minimums.
    pub fn validate(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let aspect = width as f64 / height as f64;
        let aspect_ok = aspect >= self.aspect_min * 0.97 && aspect <= self.aspect_max * 1.03;
        let dims_ok = width as f64 >= self.min_width as f64 * 0.9
            && height as f64 >= self.min_height as f64 * 0.9;
        aspect_ok && dims_ok
    }
}

pub fn dimension_spec(slot: Slot) -> Option<SlotDimensionSpec> {
    Some(match slot {
        Slot::Poster => SlotDimensionSpec { aspect_min: 0.65, aspect_max: 0.72, min_width: 500, min_height: 700 },
        Slot::Fanart => SlotDimensionSpec { aspect_min: 1.70, aspect_max: 1.85, min_width: 1280, min_height: 720 },
        Slot::Banner => SlotDimensionSpec { aspect_min: 4.5, aspect_max: 6.0, min_width: 758, min_height: 140 },
        Slot::Clearlogo => SlotDimensionSpec { aspect_min: 1.5, aspect_max: 4.0, min_width: 400, min_height: 100 },
        Slot::Clearart => SlotDimensionSpec { aspect_min: 1.5, aspect_max: 3.0, min_width: 500, min_height: 200 },
        Slot::Discart => SlotDimensionSpec { aspect_min: 0.95, aspect_max: 1.05, min_width: 500, min_height: 500 },
        Slot::Landscape => SlotDimensionSpec { aspect_min: 1.70, aspect_max: 1.85, min_width: 1280, min_height: 720 },
        Slot::Thumb => SlotDimensionSpec { aspect_min: 1.3, aspect_max: 1.5, min_width: 400, min_height: 300 },
        Slot::Keyart => SlotDimensionSpec { aspect_min: 0.65, aspect_max: 0.72, min_width: 500, min_height: 700 },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poster_dims_validate_at_90_percent_tolerance() {
        let spec = dimension_spec(Slot::Poster).unwrap();
        assert!(spec.validate(500, 700));
        assert!(spec.validate(450, 630)); // 90% of minimums
        assert!(!spec.validate(400, 560));
    }
}
