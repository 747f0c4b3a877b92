//! Looping playback of a finite video asset.

use crate::frame::{Frame, FrameError, FrameSource};

/// A sequential decoder over a finite clip.
pub trait ClipDecoder {
    /// Decode the next frame. `Ok(None)` signals end of stream.
    fn read(&mut self) -> Result<Option<Frame>, FrameError>;

    /// Seek back to the first frame.
    fn rewind(&mut self) -> Result<(), FrameError>;
}

/// Presents a finite clip as an endless frame stream.
///
/// On end of stream the decoder is rewound and read exactly once more. If
/// that read also comes back empty the tick is skipped; the next call starts
/// over normally.
pub struct LoopingClip<D> {
    decoder: D,
    loops: u64,
}

impl<D: ClipDecoder> LoopingClip<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder, loops: 0 }
    }

    /// Number of times the clip has wrapped back to its first frame.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: ClipDecoder> FrameSource for LoopingClip<D> {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        let frame = match self.decoder.read()? {
            Some(frame) => frame,
            None => {
                self.decoder.rewind()?;
                self.loops += 1;
                tracing::debug!(loops = self.loops, "clip rewound");
                self.decoder.read()?.ok_or(FrameError::EndOfStream)?
            }
        };

        if frame.is_empty() {
            return Err(FrameError::Empty);
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// In-memory clip whose frames are tagged by their red channel.
    struct MemoryClip {
        frames: Vec<RgbImage>,
        pos: usize,
        rewinds: usize,
    }

    impl MemoryClip {
        fn tagged(tags: &[u8]) -> Self {
            let frames = tags
                .iter()
                .map(|&t| RgbImage::from_pixel(2, 2, Rgb([t, 0, 0])))
                .collect();
            Self {
                frames,
                pos: 0,
                rewinds: 0,
            }
        }
    }

    impl ClipDecoder for MemoryClip {
        fn read(&mut self) -> Result<Option<Frame>, FrameError> {
            let frame = self.frames.get(self.pos).cloned();
            if frame.is_some() {
                self.pos += 1;
            }
            Ok(frame.map(|image| Frame::new(image, self.pos as u64)))
        }

        fn rewind(&mut self) -> Result<(), FrameError> {
            self.pos = 0;
            self.rewinds += 1;
            Ok(())
        }
    }

    fn tag(frame: &Frame) -> u8 {
        frame.image.get_pixel(0, 0)[0]
    }

    #[test]
    fn test_wraps_to_first_frame() {
        let mut clip = LoopingClip::new(MemoryClip::tagged(b"ABC"));
        let seq: Vec<u8> = (0..5).map(|_| tag(&clip.next_frame().unwrap())).collect();
        assert_eq!(seq, b"ABCAB");
        assert_eq!(clip.loops(), 1);
        assert_eq!(clip.decoder().rewinds, 1);
    }

    #[test]
    fn test_n_plus_one_is_first() {
        let tags = b"qrstuvw";
        let mut clip = LoopingClip::new(MemoryClip::tagged(tags));
        let mut last = 0;
        for _ in 0..=tags.len() {
            last = tag(&clip.next_frame().unwrap());
        }
        assert_eq!(last, tags[0]);
    }

    #[test]
    fn test_empty_clip_skips_without_spinning() {
        let mut clip = LoopingClip::new(MemoryClip::tagged(&[]));
        assert!(matches!(clip.next_frame(), Err(FrameError::EndOfStream)));
        assert_eq!(clip.decoder().rewinds, 1);
        assert!(matches!(clip.next_frame(), Err(FrameError::EndOfStream)));
        assert_eq!(clip.decoder().rewinds, 2);
    }

    #[test]
    fn test_zero_size_frame_is_skipped() {
        let mut decoder = MemoryClip::tagged(b"A");
        decoder.frames.push(RgbImage::new(0, 0));
        let mut clip = LoopingClip::new(decoder);
        assert!(clip.next_frame().is_ok());
        assert!(matches!(clip.next_frame(), Err(FrameError::Empty)));
        assert_eq!(tag(&clip.next_frame().unwrap()), b'A');
    }
}
