use crate::geometry::{self, AnchorSet};
use crate::landmark::LandmarkSet;
use crate::sprite::{Category, ProductSprite};

/// Earring width as a fraction of the inter-eye distance. Scale is taken
/// from the eye landmarks even though position uses the ear landmarks;
/// this cross-reference is deliberate and calibrated.
const EARRING_WIDTH_RATIO: f32 = 0.50;
/// Downward shift of an earring, as a fraction of its height.
const EARRING_DROP_RATIO: f32 = 0.10;
/// Glasses width as a fraction of the inter-eye distance.
const GLASSES_WIDTH_RATIO: f32 = 1.4;
/// Downward shift of the glasses center below the nose bridge.
const GLASSES_DROP_RATIO: f32 = 0.05;

/// Where and how to draw one sprite instance for one frame, in
/// destination pixel space. Recomputed every frame, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTransform {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    /// Radians, counter-clockwise positive in image coordinates.
    pub rotation: f32,
}

/// Per-category placement logic. The compositor only ever sees
/// `PlacementTransform`s, so new categories plug in here without
/// touching it.
pub trait PlacementStrategy: Sync {
    fn place(&self, anchors: &AnchorSet, sprite_aspect: f32) -> Vec<PlacementTransform>;
}

pub fn strategy_for(category: Category) -> &'static dyn PlacementStrategy {
    match category {
        Category::Earrings => &EarringPlacement,
        Category::Glasses => &GlassesPlacement,
    }
}

/// Two instances centered on the ear anchors, scaled from the inter-eye
/// distance, never rotated.
pub struct EarringPlacement;

impl PlacementStrategy for EarringPlacement {
    fn place(&self, anchors: &AnchorSet, sprite_aspect: f32) -> Vec<PlacementTransform> {
        let AnchorSet::Earrings {
            left_ear,
            right_ear,
            left_eye,
            right_eye,
        } = anchors
        else {
            return Vec::new();
        };

        let face_width = left_eye.distance(right_eye);
        let width = face_width * EARRING_WIDTH_RATIO;
        let height = width * sprite_aspect;
        let drop = height * EARRING_DROP_RATIO;

        [left_ear, right_ear]
            .into_iter()
            .map(|ear| PlacementTransform {
                center_x: ear.x,
                center_y: ear.y + drop,
                width,
                height,
                rotation: 0.0,
            })
            .collect()
    }
}

/// One instance centered just below the nose bridge, rotated to the eye
/// line.
pub struct GlassesPlacement;

impl PlacementStrategy for GlassesPlacement {
    fn place(&self, anchors: &AnchorSet, sprite_aspect: f32) -> Vec<PlacementTransform> {
        let AnchorSet::Glasses {
            left_eye,
            right_eye,
            nose_bridge,
        } = anchors
        else {
            return Vec::new();
        };

        let eye_distance = left_eye.distance(right_eye);
        let width = eye_distance * GLASSES_WIDTH_RATIO;
        let height = width * sprite_aspect;
        let drop = height * GLASSES_DROP_RATIO;

        vec![PlacementTransform {
            center_x: nose_bridge.x,
            center_y: nose_bridge.y + drop,
            width,
            height,
            rotation: geometry::eye_line_angle(*left_eye, *right_eye),
        }]
    }
}

/// Per-frame placement entry point: landmarks in, transforms out.
///
/// A missing sprite ("not loaded yet") or unresolvable anchors produce an
/// empty plan — the frame is drawn without an overlay and the next frame
/// retries.
pub fn plan_overlay(
    landmarks: &LandmarkSet,
    sprite: Option<&ProductSprite>,
    frame_w: u32,
    frame_h: u32,
) -> Vec<PlacementTransform> {
    let Some(sprite) = sprite else {
        return Vec::new();
    };
    let Some(anchors) = geometry::resolve_anchors(landmarks, sprite.category(), frame_w, frame_h)
    else {
        return Vec::new();
    };
    strategy_for(sprite.category()).place(&anchors, sprite.aspect())
}
