//! Live webcam capture over V4L2.
//!
//! The camera asks the driver for 640x480 YUYV and accepts MJPG or GREY as
//! substitutes. One mmap stream is started at open and kept running until
//! the camera is dropped.

use crate::frame;
use image::RgbImage;
use rollcall_core::{Frame, FrameError, FrameSource};
use std::io;
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Resolution requested from the driver. The driver may pick another.
pub const REQUESTED_SIZE: (u32, u32) = (640, 480);
const STREAM_BUFFERS: u32 = 4;
const MAX_PROBED_DEVICES: u32 = 16;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("no capture device at {0}")]
    NotFound(String),
    #[error("{0} is in use by another process")]
    Busy(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} cannot capture video")]
    NotCapture(String),
    #[error("format negotiation failed: {0}")]
    Format(String),
    #[error("stream error: {0}")]
    Stream(#[source] io::Error),
    #[error("{format:?} buffer could not be converted: {reason}")]
    Convert { format: PixelFormat, reason: String },
}

/// A V4L2 capture device found by [`Camera::list_devices`].
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Pixel layouts the camera can turn into RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed YUYV 4:2:2.
    Yuyv,
    /// Motion JPEG, one image per buffer.
    Mjpg,
    /// 8-bit luma only.
    Grey,
}

impl PixelFormat {
    pub fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"MJPG" => Some(Self::Mjpg),
            b"GREY" => Some(Self::Grey),
            _ => None,
        }
    }

    fn to_rgb(self, buf: &[u8], width: u32, height: u32) -> Result<RgbImage, frame::FrameError> {
        match self {
            Self::Yuyv => frame::yuyv_to_rgb(buf, width, height),
            Self::Mjpg => frame::mjpg_to_rgb(buf),
            Self::Grey => frame::grey_to_rgb(buf, width, height),
        }
    }
}

/// `/dev/video<index>` for a numeric capture index.
pub fn device_path_for_index(index: u32) -> String {
    format!("/dev/video{index}")
}

/// A streaming webcam. Streaming stops and the device closes on drop.
pub struct Camera {
    // Declared before the device so it is dropped first.
    stream: MmapStream<'static>,
    _device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub fourcc: FourCC,
    pixel_format: PixelFormat,
}

impl Camera {
    /// Open `device_path` (e.g. `/dev/video0`), negotiate a format and start streaming.
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::NotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|source| {
            if source.raw_os_error() == Some(16) {
                CameraError::Busy(device_path.to_string())
            } else {
                CameraError::Open {
                    path: device_path.to_string(),
                    source,
                }
            }
        })?;

        let caps = device.query_caps().map_err(|source| CameraError::Open {
            path: device_path.to_string(),
            source,
        })?;
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(CameraError::NotCapture(device_path.to_string()));
        }
        tracing::debug!(device = device_path, driver = %caps.driver, card = %caps.card, "capture device found");

        let format = negotiate(&device)?;
        let pixel_format = PixelFormat::from_fourcc(format.fourcc).ok_or_else(|| {
            CameraError::Format(format!("driver chose {:?}; need YUYV, MJPG or GREY", format.fourcc))
        })?;

        let stream = MmapStream::with_buffers(&device, BufType::VideoCapture, STREAM_BUFFERS)
            .map_err(CameraError::Stream)?;

        Ok(Self {
            stream,
            _device: device,
            width: format.width,
            height: format.height,
            device_path: device_path.to_string(),
            fourcc: format.fourcc,
            pixel_format,
        })
    }

    /// Block for the next buffer and convert it to RGB.
    pub fn capture_frame(&mut self) -> Result<Frame, CameraError> {
        let (buf, meta) = self.stream.next().map_err(CameraError::Stream)?;

        // Some drivers leave bytesused at zero.
        let used = match meta.bytesused as usize {
            0 => buf.len(),
            n => n.min(buf.len()),
        };
        let image = self
            .pixel_format
            .to_rgb(&buf[..used], self.width, self.height)
            .map_err(|e| CameraError::Convert {
                format: self.pixel_format,
                reason: e.to_string(),
            })?;

        Ok(Frame::new(image, u64::from(meta.sequence)))
    }

    /// Probe `/dev/video0` through `/dev/video15` for capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        (0..MAX_PROBED_DEVICES)
            .map(device_path_for_index)
            .filter(|path| Path::new(path).exists())
            .filter_map(|path| {
                let caps = Device::with_path(&path).ok()?.query_caps().ok()?;
                caps.capabilities
                    .contains(Flags::VIDEO_CAPTURE)
                    .then(|| DeviceInfo {
                        path,
                        name: caps.card,
                        driver: caps.driver,
                        bus: caps.bus,
                    })
            })
            .collect()
    }
}

/// Request YUYV at [`REQUESTED_SIZE`] and return whatever the driver settled on.
fn negotiate(device: &Device) -> Result<Format, CameraError> {
    let mut wanted = device
        .format()
        .map_err(|e| CameraError::Format(format!("reading current format: {e}")))?;
    wanted.fourcc = FourCC::new(b"YUYV");
    wanted.width = REQUESTED_SIZE.0;
    wanted.height = REQUESTED_SIZE.1;

    let got = device
        .set_format(&wanted)
        .map_err(|e| CameraError::Format(format!("setting format: {e}")))?;
    tracing::info!(width = got.width, height = got.height, fourcc = ?got.fourcc, "camera format negotiated");
    Ok(got)
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        let frame = self
            .capture_frame()
            .map_err(|e| FrameError::Capture(e.to_string()))?;
        if frame.is_empty() {
            return Err(FrameError::Empty);
        }
        Ok(frame)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        tracing::info!(device = %self.device_path, "camera released");
    }
}
