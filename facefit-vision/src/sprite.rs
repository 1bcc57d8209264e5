use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Product category, selecting the placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Earrings,
    Glasses,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Earrings => write!(f, "earrings"),
            Category::Glasses => write!(f, "glasses"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "earrings" => Ok(Category::Earrings),
            "glasses" => Ok(Category::Glasses),
            other => Err(format!("unknown category '{other}' (expected earrings|glasses)")),
        }
    }
}

/// The seller-provided product image, pre-composited with transparency.
///
/// Loaded once per try-on session and reused read-only across every frame
/// of that session.
pub struct ProductSprite {
    image: RgbaImage,
    category: Category,
}

impl ProductSprite {
    pub fn from_path(path: &Path, category: Category) -> Result<Self, OverlayError> {
        let image = image::open(path)
            .map_err(|e| OverlayError::SpriteLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::SpriteLoad {
                path: path.to_path_buf(),
                reason: "zero-dimension image".to_string(),
            });
        }
        Ok(Self { image, category })
    }

    pub fn from_image(image: RgbaImage, category: Category) -> Self {
        Self { image, category }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Intrinsic height/width ratio. Placement applies uniform scale only,
    /// so every placed instance preserves this ratio exactly.
    pub fn aspect(&self) -> f32 {
        self.image.height() as f32 / self.image.width().max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        assert_eq!("earrings".parse::<Category>().unwrap(), Category::Earrings);
        assert_eq!("Glasses".parse::<Category>().unwrap(), Category::Glasses);
        assert!("hats".parse::<Category>().is_err());
        assert_eq!(Category::Glasses.to_string(), "glasses");
    }

    #[test]
    fn aspect_is_height_over_width() {
        let sprite = ProductSprite::from_image(RgbaImage::new(200, 100), Category::Glasses);
        assert_eq!(sprite.aspect(), 0.5);
        let tall = ProductSprite::from_image(RgbaImage::new(100, 150), Category::Earrings);
        assert_eq!(tall.aspect(), 1.5);
    }
}
