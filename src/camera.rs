// Opens the camera and converts frames into packed 0x00RRGGBB buffers.
// Backends are tried in a fixed per-platform order; the first that opens wins.

use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
};
use tracing::{info, warn};

#[cfg(target_os = "windows")]
const BACKENDS: &[ApiBackend] = &[ApiBackend::MediaFoundation, ApiBackend::Auto];
#[cfg(target_os = "macos")]
const BACKENDS: &[ApiBackend] = &[ApiBackend::AVFoundation, ApiBackend::Auto];
#[cfg(target_os = "linux")]
const BACKENDS: &[ApiBackend] = &[ApiBackend::Video4Linux, ApiBackend::Auto];
#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
const BACKENDS: &[ApiBackend] = &[ApiBackend::Auto];

/// Anything that hands out frames one at a time. The capture thread only
/// needs this; the real camera is one implementation.
pub trait FrameSource {
    /// Next frame, or an error that ends capturing.
    fn next_frame(&mut self) -> Result<FrameBuffer, Error>;
}

/// Small wrapper around nokhwa::Camera; the stream closes when this is dropped.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
    mirror: bool,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution (the driver may pick another).
    /// Nothing shows on screen yet; we only hold an open stream on success.
    pub fn open(index: u32, width: u32, height: u32, mirror: bool) -> Result<Self, Error> {
        let mut failures = Vec::new();

        // 1) Walk the backends for this platform; the first that streams wins.
        for &backend in BACKENDS {
            match Self::open_with(backend, index, width, height) {
                Ok(cam) => {
                    // 2) The stream may have settled on a different resolution than asked.
                    let actual = cam.resolution();
                    info!(
                        ?backend,
                        width = actual.width(),
                        height = actual.height(),
                        "camera opened"
                    );
                    return Ok(Self {
                        cam,
                        width: actual.width(),
                        height: actual.height(),
                        mirror,
                    });
                }
                Err(e) => {
                    warn!(?backend, "camera backend failed: {e}");
                    failures.push(format!("{backend:?}: {e}"));
                }
            }
        }

        // 3) Nobody could open it: the game cannot start.
        Err(Error::CameraUnavailable(failures.join("; ")))
    }

    fn open_with(backend: ApiBackend, index: u32, width: u32, height: u32) -> Result<Camera, String> {
        // 1) Ask for the closest format to our request; YUYV is uncompressed and cheap to convert.
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV,
            30, // target FPS
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // 2) Create the camera on this backend (fails if the device or backend is missing).
        let mut cam = Camera::with_backend(CameraIndex::Index(index), req, backend)
            .map_err(|e| format!("create camera: {e}"))?;

        // 3) Start streaming frames.
        cam.open_stream().map_err(|e| format!("open stream: {e}"))?;
        Ok(cam)
    }

    /// The resolution the camera is actually delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// Grab one frame and convert it to 0x00RRGGBB pixels.
    /// What you'll see: the preview window shows this frame (masked) one tick later.
    fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        // 1) Pull a frame (blocks until the driver has one ready).
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::FrameRead(format!("fetch frame: {e}")))?;

        // 2) Decode whatever raw format arrived into an RGB ImageBuffer.
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::FrameRead(format!("decode RGB: {e}")))?;

        // 3) Pack to u32 pixels, then flip so moving right on camera moves right on screen.
        let mut out = FrameBuffer::from_rgb_image(&rgb_img);
        if self.mirror {
            out.mirror_horizontal();
        }
        Ok(out)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            warn!("stopping camera stream: {e}");
        }
    }
}
