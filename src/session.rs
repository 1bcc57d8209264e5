use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use facefit_vision::landmark::{DetectorOptions, JsonLandmarkSource, LandmarkSource, SharedSource};
use facefit_vision::pump::{Completion, FrameFeed, FramePump};
use facefit_vision::{Camera, Category, OverlayError, ProductSprite};
use image::RgbaImage;
use log::{error, info, warn};
use once_cell::sync::Lazy;

use crate::config::{Config, TRYON_STORE_PREFIX};
use crate::history::{self, TryOnRecord};

/// Registry slot for the long-lived detector instance. Sessions hold a
/// shared-ownership handle; as long as one is alive new sessions reuse
/// the same detector (reconfiguring it in place), and the instance is
/// torn down only when the last handle drops.
static DETECTOR: Lazy<Mutex<Option<Weak<Mutex<dyn LandmarkSource>>>>> =
    Lazy::new(|| Mutex::new(None));

fn acquire_detector(cfg: &Config, landmarks: &Path, looped: bool) -> Result<SharedSource> {
    let options = DetectorOptions {
        max_faces: 1,
        refine_landmarks: cfg.refine_landmarks,
        min_detection_confidence: cfg.min_detection_confidence,
        min_tracking_confidence: cfg.min_tracking_confidence,
    };

    let mut slot = DETECTOR
        .lock()
        .map_err(|_| anyhow::anyhow!("detector registry poisoned"))?;

    if let Some(existing) = slot.as_ref().and_then(Weak::upgrade) {
        existing
            .lock()
            .map_err(|_| anyhow::anyhow!("detector lock poisoned"))?
            .configure(options)
            .context("reconfiguring shared detector")?;
        info!("reusing shared landmark detector");
        return Ok(existing);
    }

    let mut source = JsonLandmarkSource::from_path(landmarks, looped)
        .context("initializing landmark detector")?;
    source.configure(options)?;
    let shared: SharedSource = Arc::new(Mutex::new(source));
    *slot = Some(Arc::downgrade(&shared));
    Ok(shared)
}

/// Frame feed over a directory of host-decoded video frames, consumed in
/// file-name order.
pub struct DirFrameFeed {
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl DirFrameFeed {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("reading frames from {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png" | "jpg" | "jpeg" | "bmp")
                )
            })
            .collect();
        paths.sort();
        if paths.is_empty() {
            anyhow::bail!("no decoded frames found in {}", dir.display());
        }
        Ok(Self { paths, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameFeed for DirFrameFeed {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, OverlayError> {
        while self.cursor < self.paths.len() {
            let path = &self.paths[self.cursor];
            self.cursor += 1;
            match image::open(path) {
                Ok(img) => return Ok(Some(img.to_rgba8())),
                Err(e) => warn!("skipping undecodable frame {}: {e}", path.display()),
            }
        }
        Ok(None)
    }
}

/// One try-on: a product sprite, a shared detector handle, and one of
/// the three driving modes.
pub struct TryOnSession {
    cfg: Config,
    product_id: String,
    detector: SharedSource,
    sprite: ProductSprite,
}

impl TryOnSession {
    pub fn new(
        cfg: Config,
        product_id: &str,
        product_image: &Path,
        category: Category,
        landmarks: &Path,
        looped: bool,
    ) -> Result<Self> {
        let detector = acquire_detector(&cfg, landmarks, looped)?;
        let sprite = ProductSprite::from_path(product_image, category)
            .context("loading product sprite")?;
        Ok(Self {
            cfg,
            product_id: product_id.to_string(),
            detector,
            sprite,
        })
    }

    fn pump(detector: SharedSource, sprite: ProductSprite, cfg: &Config) -> FramePump {
        FramePump::new(detector, Some(sprite))
            .with_frame_interval(Duration::from_millis(cfg.frame_interval_ms))
    }

    fn submit_hook(product_id: String, category: Category, mode: &'static str) -> impl FnMut(Completion) + Send {
        move |c: Completion| {
            let record = TryOnRecord::new(&category.to_string(), mode, c.frames_rendered as u32);
            // Fire-and-forget: a failed submission never fails the try-on.
            if let Err(e) = history::record_try_on(&TRYON_STORE_PREFIX, &product_id, record) {
                warn!("failed to record try-on for {product_id}: {e}");
            }
        }
    }

    /// One-shot path: composite a single uploaded photo.
    pub fn photo(self, input: &Path, output: &Path) -> Result<()> {
        let TryOnSession {
            cfg,
            product_id,
            detector,
            sprite,
        } = self;
        let category = sprite.category();

        let frame = image::open(input)
            .with_context(|| format!("loading photo {}", input.display()))?
            .to_rgba8();

        let mut pump = Self::pump(detector, sprite, &cfg);
        pump.on_complete(Self::submit_hook(product_id, category, "photo"));

        let composited = pump.run_photo(&frame).context("processing photo")?;
        composited
            .save(output)
            .with_context(|| format!("writing result to {}", output.display()))?;
        info!("✓ Try-on result written to {}", output.display());
        Ok(())
    }

    /// Bounded path: composite a directory of host-decoded video frames.
    pub fn video(self, frames_dir: &Path, output_dir: &Path) -> Result<usize> {
        let TryOnSession {
            cfg,
            product_id,
            detector,
            sprite,
        } = self;
        let category = sprite.category();

        let mut feed = DirFrameFeed::open(frames_dir)?;
        info!("processing up to {} of {} frames", cfg.max_video_frames, feed.len());
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;

        let mut pump = Self::pump(detector, sprite, &cfg);
        pump.on_complete(Self::submit_hook(product_id, category, "video"));

        let mut written = 0usize;
        let out = output_dir.to_path_buf();
        let rendered = pump
            .run_video(&mut feed, cfg.max_video_frames, |img| {
                let path = out.join(format!("frame_{written:04}.png"));
                match img.save(&path) {
                    Ok(()) => written += 1,
                    Err(e) => warn!("failed to write {}: {e}", path.display()),
                }
            })
            .context("processing video frames")?;
        info!("✓ Composited {rendered} frame(s) into {}", output_dir.display());
        Ok(rendered)
    }

    /// Continuous path: live camera preview until Enter is pressed.
    ///
    /// Camera failures are fatal to live mode only; the caller can fall
    /// back to the upload paths.
    pub fn live(self, preview: &Path) -> Result<()> {
        let TryOnSession {
            cfg,
            product_id: _,
            detector,
            sprite,
        } = self;

        let mut camera = match Camera::open(&cfg.camera) {
            Ok(camera) => camera,
            Err(OverlayError::CameraPermissionDenied) => {
                error!("Camera permission denied. Allow access to {} and retry.", cfg.camera);
                return Err(OverlayError::CameraPermissionDenied.into());
            }
            Err(e) => return Err(e).context("opening camera"),
        };

        let mut pump = Self::pump(detector, sprite, &cfg);
        let handle = pump.stop_handle();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let _ = stdin.lock().lines().next();
            handle.stop();
        });

        info!("Live try-on running. Press Enter to stop.");
        let mirror = cfg.mirror_preview;
        let preview_path = preview.to_path_buf();
        let mut frames = 0usize;
        let started = Instant::now();
        pump.run_live(&mut camera, |img| {
            frames += 1;
            let result = if mirror {
                image::imageops::flip_horizontal(img).save(&preview_path)
            } else {
                img.save(&preview_path)
            };
            if let Err(e) = result {
                warn!("failed to write preview {}: {e}", preview_path.display());
            }
            if frames % 30 == 0 {
                let fps = frames as f32 / started.elapsed().as_secs_f32();
                info!("live: {frames} frames, {fps:.1} fps");
            }
        })
        .context("live try-on loop")?;
        // Dropping the camera releases its capture stream.
        drop(camera);
        info!("✓ Live try-on stopped after {frames} frame(s)");
        Ok(())
    }
}
