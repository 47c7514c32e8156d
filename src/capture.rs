//! Scoped access to the camera or a video file.
//!
//! A [`Camera`] holds the capture device for exactly one session: it is
//! opened by [`Camera::open`] and released when dropped.

use crate::{Error, Result};
use log::{info, warn};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

impl VideoSource {
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, VideoSource::File(_))
    }
}

/// Exclusive handle on a capture device
pub struct Camera {
    source: VideoSource,
    capture: VideoCapture,
    mirror: bool,
}

impl Camera {
    /// Open the source. Fails if the device or file cannot be opened.
    pub fn open(source: VideoSource, mirror: bool) -> Result<Self> {
        let capture = match &source {
            VideoSource::Camera(index) => {
                info!("Opening camera {}", index);
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                // Keep only the newest frame so the light follows the face with minimal lag
                if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
                    warn!("Could not reduce camera buffer size: {e}");
                }
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {}", path);
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
        };

        if !capture.is_opened()? {
            return Err(Error::CaptureError(format!("Could not open {source:?}")));
        }

        Ok(Self {
            source,
            capture,
            mirror,
        })
    }

    #[must_use]
    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    /// Read the next frame. `Ok(None)` means the device produced nothing this
    /// time (or the file has ended).
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }

        if self.mirror {
            let mut flipped = Mat::default();
            core::flip(&frame, &mut flipped, 1)?;
            return Ok(Some(flipped));
        }
        Ok(Some(frame))
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release {:?}: {e}", self.source);
        } else {
            info!("Released {:?}", self.source);
        }
    }
}
