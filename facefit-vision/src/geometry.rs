use crate::landmark::{index, Landmark, LandmarkSet};
use crate::sprite::Category;

/// A landmark mapped into destination pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PixelPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The named pixel-space anchor points a placement strategy consumes.
///
/// Anchors are valid only for the frame whose dimensions produced them;
/// they are recomputed from scratch every frame with no temporal
/// filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorSet {
    Earrings {
        left_ear: PixelPoint,
        right_ear: PixelPoint,
        left_eye: PixelPoint,
        right_eye: PixelPoint,
    },
    Glasses {
        left_eye: PixelPoint,
        right_eye: PixelPoint,
        nose_bridge: PixelPoint,
    },
}

fn to_pixel(lm: Landmark, frame_w: u32, frame_h: u32) -> PixelPoint {
    PixelPoint::new(lm.x * frame_w as f32, lm.y * frame_h as f32)
}

/// Maps the named landmarks a category needs into pixel-space anchors.
///
/// Returns `None` when the set is empty or any required landmark index is
/// missing; both cases mean "skip the overlay this frame".
pub fn resolve_anchors(
    landmarks: &LandmarkSet,
    category: Category,
    frame_w: u32,
    frame_h: u32,
) -> Option<AnchorSet> {
    if landmarks.is_empty() {
        return None;
    }
    match category {
        Category::Earrings => Some(AnchorSet::Earrings {
            left_ear: to_pixel(landmarks.get(index::LEFT_EAR)?, frame_w, frame_h),
            right_ear: to_pixel(landmarks.get(index::RIGHT_EAR)?, frame_w, frame_h),
            left_eye: to_pixel(landmarks.get(index::LEFT_EYE)?, frame_w, frame_h),
            right_eye: to_pixel(landmarks.get(index::RIGHT_EYE)?, frame_w, frame_h),
        }),
        Category::Glasses => Some(AnchorSet::Glasses {
            left_eye: to_pixel(landmarks.get(index::LEFT_EYE)?, frame_w, frame_h),
            right_eye: to_pixel(landmarks.get(index::RIGHT_EYE)?, frame_w, frame_h),
            nose_bridge: to_pixel(landmarks.get(index::NOSE_BRIDGE)?, frame_w, frame_h),
        }),
    }
}

/// Angle of the eye line, radians; 0 when the eyes are level.
pub fn eye_line_angle(left_eye: PixelPoint, right_eye: PixelPoint) -> f32 {
    (right_eye.y - left_eye.y).atan2(right_eye.x - left_eye.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LANDMARK_COUNT;

    fn full_mesh() -> LandmarkSet {
        let mut points = vec![Landmark::default(); LANDMARK_COUNT];
        points[index::LEFT_EYE] = Landmark { x: 0.3, y: 0.35, z: 0.0 };
        points[index::RIGHT_EYE] = Landmark { x: 0.7, y: 0.35, z: 0.0 };
        points[index::NOSE_BRIDGE] = Landmark { x: 0.5, y: 0.4, z: 0.0 };
        points[index::LEFT_EAR] = Landmark { x: 0.1, y: 0.5, z: 0.0 };
        points[index::RIGHT_EAR] = Landmark { x: 0.9, y: 0.5, z: 0.0 };
        LandmarkSet::new(points)
    }

    #[test]
    fn empty_set_resolves_to_none() {
        let empty = LandmarkSet::default();
        assert!(resolve_anchors(&empty, Category::Earrings, 640, 480).is_none());
        assert!(resolve_anchors(&empty, Category::Glasses, 640, 480).is_none());
    }

    #[test]
    fn truncated_set_resolves_to_none() {
        // Enough points for the eyes but not the right ear (index 454).
        let short = LandmarkSet::new(vec![Landmark::default(); index::RIGHT_EAR]);
        assert!(resolve_anchors(&short, Category::Earrings, 640, 480).is_none());
    }

    #[test]
    fn anchors_scale_by_frame_dimensions() {
        let mesh = full_mesh();
        match resolve_anchors(&mesh, Category::Glasses, 1000, 500).unwrap() {
            AnchorSet::Glasses {
                left_eye,
                right_eye,
                nose_bridge,
            } => {
                assert_eq!(left_eye, PixelPoint::new(300.0, 175.0));
                assert_eq!(right_eye, PixelPoint::new(700.0, 175.0));
                assert_eq!(nose_bridge, PixelPoint::new(500.0, 200.0));
            }
            other => panic!("expected glasses anchors, got {other:?}"),
        }
    }

    #[test]
    fn eye_line_angle_zero_when_level() {
        let a = PixelPoint::new(100.0, 50.0);
        let b = PixelPoint::new(300.0, 50.0);
        assert_eq!(eye_line_angle(a, b), 0.0);
    }

    #[test]
    fn eye_line_angle_matches_atan2() {
        let a = PixelPoint::new(0.0, 0.0);
        let b = PixelPoint::new(100.0, 100.0);
        let angle = eye_line_angle(a, b);
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn pixel_distance_is_euclidean() {
        let a = PixelPoint::new(0.0, 0.0);
        let b = PixelPoint::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
