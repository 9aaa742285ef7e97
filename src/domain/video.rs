use serde::{Deserialize, Serialize};
use std::fmt;

pub const TARGET_HEIGHT: u32 = 720;
pub const FALLBACK_DIMENSIONS: VideoDimensions = VideoDimensions {
    width: 1280,
    height: TARGET_HEIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for VideoDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Scales `source` to 720 lines, keeping the aspect ratio. The width is
/// rounded up to an even number because 4:2:0 chroma needs it.
pub fn scale_to_height(source: VideoDimensions) -> Option<VideoDimensions> {
    if source.width == 0 || source.height == 0 {
        return None;
    }
    let scaled = u64::from(TARGET_HEIGHT) * u64::from(source.width) / u64::from(source.height);
    let mut width = u32::try_from(scaled).ok()?;
    if width % 2 != 0 {
        width = width.checked_add(1)?;
    }
    Some(VideoDimensions {
        width,
        height: TARGET_HEIGHT,
    })
}
