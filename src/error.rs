// One error type for the whole arcade.
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),        // Creating a window failed
    WindowUpdate(String),      // Pushing a buffer to a window failed
    CameraUnavailable(String), // No backend could open/start the camera
    FrameRead(String),         // Grabbing/decoding a single frame failed
    CaptureThread(String),     // The capture worker died or vanished before reporting
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::CameraUnavailable(s) => write!(f, "Camera unavailable: {s}"),
            Error::FrameRead(s) => write!(f, "Camera frame error: {s}"),
            Error::CaptureThread(s) => write!(f, "Capture thread error: {s}"),
        }
    }
}

impl std::error::Error for Error {}
