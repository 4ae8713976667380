use log::debug;

use crate::{
    delta::DeltaPair,
    error::{AnimError, Result},
    plane::PlanePair,
    quantize::{self, GrayscaleFrame},
    sequence::FrameSequence,
};

/// Output of [`Encoder::push`] for a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedFrame {
    Key(PlanePair),
    Delta(DeltaPair),
}

/// Frame-by-frame pipeline: quantize, split into planes, diff against the previous frame.
#[derive(Default)]
pub struct Encoder {
    previous: PlanePair,
    sequence: Option<FrameSequence>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: &GrayscaleFrame, delay_ms: u32) -> EncodedFrame {
        let planes = PlanePair::from_quantized(&quantize::quantize(frame));

        let encoded = match &mut self.sequence {
            None => {
                self.sequence = Some(FrameSequence::new(planes.clone(), delay_ms));
                EncodedFrame::Key(planes.clone())
            }
            Some(sequence) => {
                let pair = DeltaPair::between(&self.previous, &planes);
                debug!(
                    "frame {}: {} + {} delta bytes",
                    sequence.len(),
                    pair.bit0.len(),
                    pair.bit4.len()
                );
                sequence.push_encoded(pair.clone(), delay_ms);
                EncodedFrame::Delta(pair)
            }
        };

        self.previous = planes;
        encoded
    }

    pub fn frames(&self) -> usize {
        self.sequence.as_ref().map_or(0, FrameSequence::len)
    }

    pub fn finish(self) -> Result<FrameSequence> {
        self.sequence.ok_or(AnimError::Empty)
    }
}

/// Encode a whole animation of `(frame, delay_ms)` pairs.
pub fn encode_sequence<'a>(
    frames: impl IntoIterator<Item = (&'a GrayscaleFrame, u32)>,
) -> Result<FrameSequence> {
    let mut encoder = Encoder::new();
    for (frame, delay_ms) in frames {
        encoder.push(frame, delay_ms);
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::{
        delta,
        device::Plane,
        geometry::{PIXEL_COUNT, PLANE_SIZE, WIDTH},
    };

    fn gradient(shift: usize) -> GrayscaleFrame {
        let pixels: Vec<u8> = (0..PIXEL_COUNT)
            .map(|i| (((i % WIDTH) + shift) * 255 / (WIDTH + shift)) as u8)
            .collect();
        GrayscaleFrame::new(pixels).unwrap()
    }

    #[test]
    fn test_first_frame_is_key() {
        let mut encoder = Encoder::new();
        let frame = GrayscaleFrame::filled(255);
        let EncodedFrame::Key(planes) = encoder.push(&frame, 40) else {
            panic!("expected keyframe");
        };
        assert_eq!(planes.level(0, 0), 3);
        assert!(matches!(encoder.push(&frame, 50), EncodedFrame::Delta(_)));
        assert_eq!(encoder.frames(), 2);

        let sequence = encoder.finish().unwrap();
        assert_eq!(sequence.delays(), [40, 50]);
    }

    #[test]
    fn test_repeated_frame_has_empty_delta() {
        let frame = gradient(0);
        let sequence = encode_sequence([(&frame, 10), (&frame, 10)]).unwrap();
        for plane in [Plane::Bit0, Plane::Bit4] {
            let stream = sequence.delta(1).unwrap().stream(plane);
            assert_eq!(delta::validate(stream, PLANE_SIZE), Ok(0));
        }
    }

    #[test]
    fn test_deltas_rebuild_frames() {
        let frames: Vec<_> = (0..4).map(|i| gradient(i * 9)).collect();
        let sequence = encode_sequence(frames.iter().map(|f| (f, 100))).unwrap();
        assert_eq!(sequence.len(), 4);

        let mut planes = sequence.keyframe().clone();
        for (index, frame) in frames.iter().enumerate().skip(1) {
            let pair = sequence.delta(index).unwrap();
            for plane in [Plane::Bit0, Plane::Bit4] {
                delta::decode(planes.plane_mut(plane), pair.stream(plane)).unwrap();
            }
            let expected = PlanePair::from_quantized(&quantize::quantize(frame));
            assert!(planes == expected, "frame {index}");
        }
    }

    #[test]
    fn test_empty_encoder() {
        assert_eq!(Encoder::new().finish().err(), Some(AnimError::Empty));
    }
}
