use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::compositor::{self, Surface};
use crate::error::OverlayError;
use crate::landmark::SharedSource;
use crate::placement;
use crate::sprite::ProductSprite;

/// Minimum spacing between live-mode detections (~30fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Frame cap for the bounded video path (~5 seconds at 30fps).
pub const DEFAULT_MAX_VIDEO_FRAMES: usize = 150;

/// Supplies source frames to the pump. `Ok(None)` signals end of stream
/// (a decoded video running out of frames); a live camera never returns
/// it.
pub trait FrameFeed: Send {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, OverlayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    AwaitingSource,
    Detecting,
    Rendering,
    Stopped,
}

/// Cloneable cancellation token for a running pump. `stop` is idempotent
/// and safe to call from any thread.
#[derive(Clone)]
pub struct StopHandle {
    cancel: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Emitted once when a one-shot or bounded run finishes; feeds the
/// fire-and-forget try-on submission.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    pub frames_rendered: usize,
}

/// Drives frames through detect → resolve → place → composite.
///
/// The detector handle and the sprite are the only state shared across
/// frames; both are read-only during a frame. Landmarks and placements
/// are computed fresh per frame and discarded, and a frame's landmarks
/// are only ever composited onto that same frame.
pub struct FramePump {
    source: SharedSource,
    sprite: Option<ProductSprite>,
    surface: Surface,
    state: PumpState,
    cancel: Arc<AtomicBool>,
    in_flight: AtomicBool,
    frame_interval: Duration,
    on_complete: Option<Box<dyn FnMut(Completion) + Send>>,
}

impl FramePump {
    pub fn new(source: SharedSource, sprite: Option<ProductSprite>) -> Self {
        Self {
            source,
            sprite,
            surface: Surface::new(),
            state: PumpState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
            in_flight: AtomicBool::new(false),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            on_complete: None,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Registers the completion hook fired by the photo and video paths.
    pub fn on_complete(&mut self, hook: impl FnMut(Completion) + Send + 'static) {
        self.on_complete = Some(Box::new(hook));
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            cancel: Arc::clone(&self.cancel),
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn surface(&self) -> &RgbaImage {
        self.surface.image()
    }

    /// One-shot path: detect and composite a single uploaded image.
    ///
    /// The detection result is awaited directly; the bounded-wait the
    /// push-callback model needed does not apply here.
    pub fn run_photo(&mut self, frame: &RgbaImage) -> Result<&RgbaImage, OverlayError> {
        self.state = PumpState::AwaitingSource;
        self.process_frame(frame)?;
        self.state = PumpState::Idle;
        self.fire_completion(1);
        Ok(self.surface.image())
    }

    /// Bounded multi-frame path: runs until `max_frames` or the feed
    /// ends, whichever comes first. Returns the number of frames
    /// composited.
    pub fn run_video<F>(
        &mut self,
        feed: &mut dyn FrameFeed,
        max_frames: usize,
        mut on_frame: F,
    ) -> Result<usize, OverlayError>
    where
        F: FnMut(&RgbaImage),
    {
        self.state = PumpState::AwaitingSource;
        let mut rendered = 0;
        while rendered < max_frames && !self.cancel.load(Ordering::SeqCst) {
            let Some(frame) = feed.next_frame()? else { break };
            match self.process_frame(&frame) {
                Ok(true) => {
                    rendered += 1;
                    on_frame(self.surface.image());
                }
                Ok(false) => break,
                Err(OverlayError::Detection(e)) => log::warn!("frame skipped: {e}"),
                Err(e) => return Err(e),
            }
        }
        self.state = if self.cancel.load(Ordering::SeqCst) {
            PumpState::Stopped
        } else {
            PumpState::Idle
        };
        self.fire_completion(rendered);
        Ok(rendered)
    }

    /// Continuous live path: ticks at the configured minimum interval
    /// until stopped or the feed ends. A tick whose predecessor has not
    /// finished is dropped outright, never queued.
    pub fn run_live<F>(&mut self, feed: &mut dyn FrameFeed, mut on_frame: F) -> Result<(), OverlayError>
    where
        F: FnMut(&RgbaImage),
    {
        self.state = PumpState::AwaitingSource;
        while !self.cancel.load(Ordering::SeqCst) {
            let tick_started = Instant::now();
            if self.in_flight.swap(true, Ordering::SeqCst) {
                log::debug!("previous detection still in flight, dropping tick");
            } else {
                let outcome = self.live_tick(feed, &mut on_frame);
                self.in_flight.store(false, Ordering::SeqCst);
                match outcome {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(OverlayError::Detection(e)) => log::warn!("frame skipped: {e}"),
                    Err(e) => {
                        self.state = PumpState::Stopped;
                        return Err(e);
                    }
                }
            }
            let elapsed = tick_started.elapsed();
            if elapsed < self.frame_interval && !self.cancel.load(Ordering::SeqCst) {
                thread::sleep(self.frame_interval - elapsed);
            }
        }
        self.state = PumpState::Stopped;
        Ok(())
    }

    fn live_tick<F>(&mut self, feed: &mut dyn FrameFeed, on_frame: &mut F) -> Result<bool, OverlayError>
    where
        F: FnMut(&RgbaImage),
    {
        let Some(frame) = feed.next_frame()? else {
            return Ok(false);
        };
        if self.process_frame(&frame)? {
            on_frame(self.surface.image());
        }
        Ok(true)
    }

    /// Runs one frame through the pipeline. Returns `Ok(false)` when the
    /// pump was cancelled while the detection was outstanding; the late
    /// result is discarded without touching the surface.
    fn process_frame(&mut self, frame: &RgbaImage) -> Result<bool, OverlayError> {
        self.state = PumpState::Detecting;
        let landmarks = {
            let mut source = self
                .source
                .lock()
                .map_err(|_| OverlayError::Detection("detector lock poisoned".to_string()))?;
            source.detect(frame)?
        };
        if self.cancel.load(Ordering::SeqCst) {
            return Ok(false);
        }

        self.state = PumpState::Rendering;
        let placements = match &landmarks {
            Some(set) => {
                placement::plan_overlay(set, self.sprite.as_ref(), frame.width(), frame.height())
            }
            // No face this frame: composite the bare source, never a
            // stale overlay.
            None => Vec::new(),
        };
        compositor::render(&mut self.surface, frame, &placements, self.sprite.as_ref());
        Ok(true)
    }

    fn fire_completion(&mut self, frames_rendered: usize) {
        if let Some(hook) = self.on_complete.as_mut() {
            hook(Completion { frames_rendered });
        }
    }
}
