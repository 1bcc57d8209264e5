use facefit_vision::compositor::{self, Surface};
use facefit_vision::landmark::{index, Landmark, LandmarkSet, LANDMARK_COUNT};
use facefit_vision::placement::plan_overlay;
use facefit_vision::sprite::{Category, ProductSprite};
use image::{Rgba, RgbaImage};

fn mesh_with(points: &[(usize, f32, f32)]) -> LandmarkSet {
    let mut all = vec![Landmark::default(); LANDMARK_COUNT];
    for &(idx, x, y) in points {
        all[idx] = Landmark { x, y, z: 0.0 };
    }
    LandmarkSet::new(all)
}

#[test]
fn glasses_end_to_end_scenario() {
    // 200x200 frame, eyes 100px apart and level, sprite 200x100.
    let landmarks = mesh_with(&[
        (index::LEFT_EYE, 0.25, 0.5),
        (index::RIGHT_EYE, 0.75, 0.5),
        (index::NOSE_BRIDGE, 0.5, 0.5),
    ]);
    let sprite = ProductSprite::from_image(RgbaImage::new(200, 100), Category::Glasses);

    let placements = plan_overlay(&landmarks, Some(&sprite), 200, 200);
    assert_eq!(placements.len(), 1);
    let p = placements[0];
    assert_eq!(p.width, 140.0);
    assert_eq!(p.height, 70.0);
    assert_eq!(p.rotation, 0.0);
}

#[test]
fn glasses_rotation_follows_tilted_eye_line() {
    // Right eye 100px right and 100px down from the left: 45 degrees.
    let landmarks = mesh_with(&[
        (index::LEFT_EYE, 0.25, 0.25),
        (index::RIGHT_EYE, 0.5, 0.5),
        (index::NOSE_BRIDGE, 0.375, 0.375),
    ]);
    let sprite = ProductSprite::from_image(RgbaImage::new(200, 100), Category::Glasses);

    let placements = plan_overlay(&landmarks, Some(&sprite), 400, 400);
    assert_eq!(placements.len(), 1);
    assert!((placements[0].rotation - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
}

#[test]
fn earrings_end_to_end_scenario() {
    // 400x200 frame: ears at (50,80)/(250,80), eyes at (90,70)/(210,70),
    // sprite 100x150. Expect 60x90 instances dropped 9px.
    let landmarks = mesh_with(&[
        (index::LEFT_EAR, 0.125, 0.4),
        (index::RIGHT_EAR, 0.625, 0.4),
        (index::LEFT_EYE, 0.225, 0.35),
        (index::RIGHT_EYE, 0.525, 0.35),
    ]);
    let sprite = ProductSprite::from_image(RgbaImage::new(100, 150), Category::Earrings);

    let placements = plan_overlay(&landmarks, Some(&sprite), 400, 200);
    assert_eq!(placements.len(), 2);
    for p in &placements {
        assert_eq!(p.width, 60.0);
        assert_eq!(p.height, 90.0);
        assert_eq!(p.rotation, 0.0);
        assert!((p.height / p.width - sprite.aspect()).abs() < 1e-6);
    }
    assert_eq!((placements[0].center_x, placements[0].center_y), (50.0, 89.0));
    assert_eq!((placements[1].center_x, placements[1].center_y), (250.0, 89.0));
}

#[test]
fn empty_landmarks_produce_source_only_composite() {
    let landmarks = LandmarkSet::default();
    let sprite = ProductSprite::from_image(
        RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])),
        Category::Glasses,
    );
    let placements = plan_overlay(&landmarks, Some(&sprite), 64, 64);
    assert!(placements.is_empty());

    let source = RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255]));
    let mut surface = Surface::new();
    compositor::render(&mut surface, &source, &placements, Some(&sprite));
    for px in surface.image().pixels() {
        assert_eq!(*px, Rgba([10, 20, 30, 255]));
    }
}
