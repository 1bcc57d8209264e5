use image::RgbaImage;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::error::OverlayError;
use crate::pump::FrameFeed;

/// Live camera source for continuous try-on mode.
///
/// The mmap capture stream holds only a handful of buffers, so frames
/// the pipeline is too slow to pull are overwritten in place — dropped,
/// never queued. Dropping the `Camera` releases the stream and the
/// device.
pub struct Camera {
    stream: Stream<'static>,
    width: u32,
    height: u32,
    fourcc: FourCC,
}

impl Camera {
    pub fn open(device: &str) -> Result<Self, OverlayError> {
        let dev = Device::with_path(device).map_err(|e| open_error(device, e))?;
        let mut fmt = dev.format().map_err(|e| open_error(device, e))?;
        // Prefer RGB, fall back to YUYV, else accept whatever is set.
        let desired = Format::new(fmt.width, fmt.height, FourCC::new(b"RGB3"));
        fmt = dev.set_format(&desired).unwrap_or(fmt);
        if fmt.fourcc != FourCC::new(b"RGB3") {
            let yuyv = Format::new(fmt.width, fmt.height, FourCC::new(b"YUYV"));
            fmt = dev.set_format(&yuyv).unwrap_or(fmt);
        }
        let fourcc = fmt.fourcc;
        let width = fmt.width;
        let height = fmt.height;
        let stream = Stream::with_buffers(&dev, Type::VideoCapture, 4)
            .map_err(|e| open_error(device, e))?;
        log::info!("camera {device} open: {width}x{height} {fourcc:?}");
        Ok(Self {
            stream,
            width,
            height,
            fourcc,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn capture(&mut self) -> Result<RgbaImage, OverlayError> {
        let (data, meta) = self
            .stream
            .next()
            .map_err(|e| OverlayError::CameraUnavailable(format!("capture frame: {e}")))?;
        log::debug!(
            "captured frame seq={} len={} fourcc={:?}",
            meta.sequence,
            data.len(),
            self.fourcc
        );
        let rgba = match self.fourcc {
            f if f == FourCC::new(b"RGB3") => rgb_to_rgba(self.width, self.height, data)?,
            f if f == FourCC::new(b"YUYV") => yuyv_to_rgba(self.width, self.height, data)?,
            f if f == FourCC::new(b"GREY") => grey_to_rgba(self.width, self.height, data)?,
            other => {
                return Err(OverlayError::CameraUnavailable(format!(
                    "unsupported pixel format {other:?}"
                )))
            }
        };
        RgbaImage::from_raw(self.width, self.height, rgba).ok_or_else(|| {
            OverlayError::CameraUnavailable("failed to build frame buffer".to_string())
        })
    }
}

impl FrameFeed for Camera {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, OverlayError> {
        self.capture().map(Some)
    }
}

fn open_error(device: &str, err: std::io::Error) -> OverlayError {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        OverlayError::CameraPermissionDenied
    } else {
        OverlayError::CameraUnavailable(format!("{device}: {err}"))
    }
}

fn rgb_to_rgba(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>, OverlayError> {
    let expected = (width * height * 3) as usize;
    if data.len() < expected {
        return Err(OverlayError::CameraUnavailable(format!(
            "short RGB3 buffer: {} < {expected}",
            data.len()
        )));
    }
    let mut out = Vec::with_capacity((width * height * 4) as usize);
    for px in data[..expected].chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    Ok(out)
}

fn yuyv_to_rgba(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>, OverlayError> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        return Err(OverlayError::CameraUnavailable(format!(
            "short YUYV buffer: {} < {expected}",
            data.len()
        )));
    }
    let mut out = Vec::with_capacity((width * height * 4) as usize);
    for chunk in data[..expected].chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;
        for &y in &[y0, y1] {
            let r = y + 1.402 * v;
            let g = y - 0.344136 * u - 0.714136 * v;
            let b = y + 1.772 * u;
            out.extend_from_slice(&[clamp(r), clamp(g), clamp(b), 255]);
        }
    }
    Ok(out)
}

fn grey_to_rgba(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>, OverlayError> {
    let expected = (width * height) as usize;
    if data.len() < expected {
        return Err(OverlayError::CameraUnavailable(format!(
            "short GREY buffer: {} < {expected}",
            data.len()
        )));
    }
    let mut out = Vec::with_capacity((width * height * 4) as usize);
    for &y in data.iter().take(expected) {
        out.extend_from_slice(&[y, y, y, 255]);
    }
    Ok(out)
}

fn clamp(v: f32) -> u8 {
    v.max(0.0).min(255.0) as u8
}
