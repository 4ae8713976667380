use alloc::vec::Vec;
use core::time::Duration;

use strum::IntoEnumIterator;

use crate::{
    delta::{self, DeltaPair},
    device::Plane,
    error::{AnimError, Result},
    geometry::PLANE_SIZE,
    plane::PlanePair,
};

/// A keyframe, the delta pairs that follow it and one delay per frame.
///
/// Frame 0 is the keyframe; frame `i > 0` is `deltas[i - 1]` applied on top of frame `i - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    keyframe: PlanePair,
    deltas: Vec<DeltaPair>,
    delays: Vec<u32>,
}

impl FrameSequence {
    pub fn new(keyframe: PlanePair, delay_ms: u32) -> Self {
        Self {
            keyframe,
            deltas: Vec::new(),
            delays: alloc::vec![delay_ms],
        }
    }

    /// Assemble a sequence from stored parts, checking counts and every stream.
    pub fn from_parts(keyframe: PlanePair, deltas: Vec<DeltaPair>, delays: Vec<u32>) -> Result<Self> {
        if delays.is_empty() {
            return Err(AnimError::Empty);
        }
        if delays.len() != deltas.len() + 1 {
            return Err(AnimError::FrameCount {
                delays: delays.len(),
                deltas: deltas.len(),
            });
        }
        for (index, pair) in deltas.iter().enumerate() {
            check_pair(index + 1, pair)?;
        }
        Ok(Self {
            keyframe,
            deltas,
            delays,
        })
    }

    /// Append the next frame. Both streams must fit the plane geometry.
    pub fn push(&mut self, delta: DeltaPair, delay_ms: u32) -> Result<()> {
        check_pair(self.len(), &delta)?;
        self.push_encoded(delta, delay_ms);
        Ok(())
    }

    /// Append a pair produced by the delta encoder, which is well formed by construction.
    pub(crate) fn push_encoded(&mut self, delta: DeltaPair, delay_ms: u32) {
        self.deltas.push(delta);
        self.delays.push(delay_ms);
    }

    pub fn keyframe(&self) -> &PlanePair {
        &self.keyframe
    }

    pub fn deltas(&self) -> &[DeltaPair] {
        &self.deltas
    }

    /// Delta pair that produces frame `index` (1-based, frame 0 is the keyframe).
    pub fn delta(&self, index: usize) -> Option<&DeltaPair> {
        index.checked_sub(1).and_then(|i| self.deltas.get(i))
    }

    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    pub fn delay(&self, index: usize) -> Duration {
        Duration::from_millis(self.delays[index] as u64)
    }

    /// Number of frames, keyframe included.
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    /// Always false: a sequence holds at least its keyframe.
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }
}

/// Validate both streams of the pair that produces `frame`.
pub(crate) fn check_pair(frame: usize, pair: &DeltaPair) -> Result<()> {
    for plane in Plane::iter() {
        delta::validate(pair.stream(plane), PLANE_SIZE)
            .map_err(|error| AnimError::Delta { frame, plane, error })?;
    }
    Ok(())
}
