use std::time::Duration;

use facefit_vision::error::OverlayError;
use facefit_vision::landmark::{index, shared, JsonLandmarkSource, Landmark, LANDMARK_COUNT};
use facefit_vision::pump::{FrameFeed, FramePump, PumpState};
use facefit_vision::sprite::{Category, ProductSprite};
use image::{Rgba, RgbaImage};

const SOURCE_PX: Rgba<u8> = Rgba([40, 40, 40, 255]);

fn face_points() -> Vec<Landmark> {
    let mut points = vec![Landmark::default(); LANDMARK_COUNT];
    points[index::LEFT_EYE] = Landmark { x: 0.3, y: 0.5, z: 0.0 };
    points[index::RIGHT_EYE] = Landmark { x: 0.7, y: 0.5, z: 0.0 };
    points[index::NOSE_BRIDGE] = Landmark { x: 0.5, y: 0.5, z: 0.0 };
    points
}

struct CountingFeed {
    remaining: usize,
    served: usize,
}

impl FrameFeed for CountingFeed {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, OverlayError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.served += 1;
        Ok(Some(RgbaImage::from_pixel(160, 120, SOURCE_PX)))
    }
}

#[test]
fn live_alternating_face_and_no_face_frames() {
    // Detector script alternates found/lost; overlay pixels must appear
    // only on the found frames and no stale overlay may carry over.
    let script: Vec<Vec<Landmark>> = (0..8)
        .map(|i| if i % 2 == 0 { face_points() } else { vec![] })
        .collect();
    let source = shared(JsonLandmarkSource::from_frames(script, false));
    let sprite = ProductSprite::from_image(
        RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 255])),
        Category::Glasses,
    );
    let mut pump =
        FramePump::new(source, Some(sprite)).with_frame_interval(Duration::from_millis(1));

    let mut feed = CountingFeed {
        remaining: 8,
        served: 0,
    };
    let mut overlay_per_frame = Vec::new();
    pump.run_live(&mut feed, |img| {
        let overlay = img.pixels().filter(|px| **px != SOURCE_PX).count();
        overlay_per_frame.push(overlay);
    })
    .unwrap();

    assert_eq!(feed.served, 8);
    assert_eq!(overlay_per_frame.len(), 8);
    for (i, overlay) in overlay_per_frame.iter().enumerate() {
        if i % 2 == 0 {
            assert!(*overlay > 0, "frame {i} should carry the overlay");
        } else {
            assert_eq!(*overlay, 0, "frame {i} must not carry a stale overlay");
        }
    }
    assert_eq!(pump.state(), PumpState::Stopped);
}

#[test]
fn stopping_twice_leaves_the_same_end_state() {
    let source = shared(JsonLandmarkSource::from_frames(vec![face_points()], true));
    let mut pump = FramePump::new(source, None).with_frame_interval(Duration::from_millis(1));
    let handle = pump.stop_handle();

    let mut feed = CountingFeed {
        remaining: 50,
        served: 0,
    };
    let mut processed = 0usize;
    pump.run_live(&mut feed, |_| {
        processed += 1;
        if processed == 2 {
            handle.stop();
            handle.stop();
        }
    })
    .unwrap();

    assert_eq!(processed, 2);
    assert!(handle.is_stopped());
    assert_eq!(pump.state(), PumpState::Stopped);
    // A second stop after the loop has exited is still safe.
    handle.stop();
}
