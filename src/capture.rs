// Capture worker: owns the camera on its own thread, runs the tracker on every
// frame and drops the result into the shared slot. The game loop never waits on it.
// Visual expectation: the paddle/snake reacts to the latest frame the camera
// delivered; if the camera dies, control freezes and the HUD says NO CAMERA.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::camera::{CameraCapture, FrameSource};
use crate::config::{CaptureConfig, TrackerParams};
use crate::draw::render_preview;
use crate::error::Error;
use crate::slot::TrackerSlot;
use crate::vision::analyze;

/// Running capture thread. Dropping it stops the thread and releases the camera.
pub struct CaptureHandle {
    slot: Arc<TrackerSlot>,
    thread: Option<JoinHandle<()>>,
    resolution: (u32, u32),
}

impl CaptureHandle {
    /// Start capturing. Returns once the camera is open (or failed to open),
    /// so a missing camera is reported here rather than later.
    pub fn spawn(cfg: CaptureConfig, params: TrackerParams, slot: Arc<TrackerSlot>) -> Result<Self, Error> {
        // 1) One-shot channel: the thread tells us whether the camera opened.
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(u32, u32), Error>>(1);
        let worker_slot = Arc::clone(&slot);

        // 2) The camera is created *on* the capture thread and never leaves it.
        let thread = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                let cam = match CameraCapture::open(cfg.index, cfg.width, cfg.height, cfg.mirror) {
                    Ok(cam) => cam,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                worker_slot.set_capture_alive(true);
                let _ = ready_tx.send(Ok(cam.resolution()));
                capture_loop(cam, &params, cfg.preview, &worker_slot);
                // `cam` is dropped here: the stream stops on every way out of the loop.
            })
            .map_err(|e| Error::CaptureThread(format!("spawn: {e}")))?;

        // 3) Wait for the verdict. A failed open is fatal for the whole game.
        match ready_rx.recv() {
            Ok(Ok(resolution)) => Ok(Self { slot, thread: Some(thread), resolution }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::CaptureThread("exited before the camera was ready".into()))
            }
        }
    }

    /// Resolution the camera is actually delivering.
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        // Ask the loop to finish, then wait so the camera is released before we return.
        self.slot.request_stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("capture thread panicked");
            }
        }
    }
}

/// Grab -> detect -> publish until a stop is requested or a frame cannot be read.
/// On the way out the slot is reset to "not found" and marked dead.
pub fn capture_loop<S: FrameSource>(mut source: S, params: &TrackerParams, preview: bool, slot: &TrackerSlot) {
    info!("capture started");

    while !slot.stop_requested() {
        // 1) Next frame; a read failure ends capturing but not the game.
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("{e}; capture stopped");
                break;
            }
        };

        // 2) Run the tracker and overwrite whatever the game has not read yet.
        let detection = analyze(&frame, params);
        slot.publish(detection.blob);

        // 3) Operator feedback: masked frame with the blob boxed.
        if preview {
            slot.publish_preview(render_preview(&frame, &detection.mask, detection.blob.as_ref()));
        }
    }

    // Control freezes from here on: the game reads "not found" every tick.
    slot.publish(None);
    slot.set_capture_alive(false);
    info!("capture finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Blob, FrameBuffer};
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    fn frame_with_blue_square() -> FrameBuffer {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([90, 90, 90]));
        for y in 100..140 {
            for x in 140..180 {
                img.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }
        FrameBuffer::from_rgb_image(&img)
    }

    /// Replays a script of results and records what the slot held at each call.
    struct Scripted {
        script: VecDeque<Result<FrameBuffer, Error>>,
        slot: Arc<TrackerSlot>,
        seen: Vec<Option<Blob>>,
    }

    impl FrameSource for &mut Scripted {
        fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
            self.seen.push(self.slot.latest());
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(Error::FrameRead("script exhausted".into())))
        }
    }

    /// Endless frames; asks for a stop after `stop_after` of them.
    struct Endless {
        frame: FrameBuffer,
        slot: Arc<TrackerSlot>,
        served: usize,
        stop_after: usize,
    }

    impl FrameSource for &mut Endless {
        fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
            self.served += 1;
            if self.served == self.stop_after {
                self.slot.request_stop();
            }
            Ok(self.frame.clone())
        }
    }

    #[test]
    fn read_failure_clears_the_slot_and_marks_capture_dead() {
        let slot = Arc::new(TrackerSlot::new());
        slot.set_capture_alive(true);
        let mut source = Scripted {
            script: VecDeque::from([
                Ok(frame_with_blue_square()),
                Err(Error::FrameRead("unplugged".into())),
            ]),
            slot: Arc::clone(&slot),
            seen: Vec::new(),
        };

        capture_loop(&mut source, &crate::config::TrackerParams::breakout(800), true, &slot);

        // before the first frame nothing was published; before the failing read the blob was there
        assert_eq!(source.seen.len(), 2);
        assert_eq!(source.seen[0], None);
        let blob = source.seen[1].expect("blob published after the first frame");
        assert!((blob.centroid.x - 159.5).abs() <= 1.0);

        assert_eq!(slot.latest(), None);
        assert!(!slot.capture_alive());
        assert!(slot.take_preview().is_some());
        assert!(source.script.is_empty());
    }

    #[test]
    fn stop_request_ends_the_loop() {
        let slot = Arc::new(TrackerSlot::new());
        slot.set_capture_alive(true);
        let mut source = Endless {
            frame: frame_with_blue_square(),
            slot: Arc::clone(&slot),
            served: 0,
            stop_after: 3,
        };

        capture_loop(&mut source, &crate::config::TrackerParams::breakout(800), false, &slot);

        assert_eq!(source.served, 3);
        assert!(slot.stop_requested());
        assert_eq!(slot.latest(), None);
        assert!(!slot.capture_alive());
        assert!(slot.take_preview().is_none());
    }

    #[test]
    fn already_stopped_slot_reads_nothing() {
        let slot = Arc::new(TrackerSlot::new());
        slot.request_stop();
        let mut source = Endless {
            frame: FrameBuffer::new(4, 4),
            slot: Arc::clone(&slot),
            served: 0,
            stop_after: usize::MAX,
        };
        capture_loop(&mut source, &crate::config::TrackerParams::snake(1), false, &slot);
        assert_eq!(source.served, 0);
    }
}
