use log::debug;
use strum::IntoEnumIterator;

use crate::{
    delta::{self, DeltaError, DeltaPair},
    device::{Device, Plane, device_address},
    geometry::{HEIGHT, PLANE_SIZE, ROW_STRIDE, VISIBLE_BYTES, column_of, row_of},
    plane::PlanePair,
};

/// How a delta pair reaches the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlace {
    /// Two passes over each stream: even rows first, then odd rows. The panel shows a coarse
    /// every-other-line update half way through the frame.
    #[default]
    Interlaced,
    /// One pass in stream order.
    Progressive,
}

/// Shadow copy of the panel's two planes, patched by deltas and mirrored to a [`Device`].
#[derive(Default)]
pub struct FramebufferProjector {
    shadow: PlanePair,
}

impl FramebufferProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadow(&self) -> &PlanePair {
        &self.shadow
    }

    /// Replace both shadow planes and push every visible byte to the device.
    pub fn load_keyframe(&mut self, device: &mut impl Device, keyframe: &PlanePair) {
        self.shadow.clone_from(keyframe);
        for plane in Plane::iter() {
            device.select_plane(plane);
            let buffer = self.shadow.plane(plane);
            for row in 0..HEIGHT {
                let start = row * ROW_STRIDE;
                for (column, value) in buffer[start..start + VISIBLE_BYTES].iter().enumerate() {
                    device.write(device_address(row, column), *value);
                }
            }
        }
        debug!("keyframe loaded");
    }

    /// Apply one frame's delta pair. Both streams are validated before the shadow or the device
    /// is touched.
    pub fn apply(
        &mut self,
        device: &mut impl Device,
        delta: &DeltaPair,
        interlace: Interlace,
    ) -> Result<(), DeltaError> {
        let mut changed = 0;
        for plane in Plane::iter() {
            changed += delta::validate(delta.stream(plane), PLANE_SIZE)?;
        }

        match interlace {
            Interlace::Interlaced => {
                for parity in [0, 1] {
                    for plane in Plane::iter() {
                        self.project(device, plane, delta.stream(plane), Some(parity));
                    }
                }
            }
            Interlace::Progressive => {
                for plane in Plane::iter() {
                    self.project(device, plane, delta.stream(plane), None);
                }
            }
        }
        debug!("applied delta, {changed} bytes changed");
        Ok(())
    }

    /// One pass over a validated stream. Every run lands in the shadow; the device only sees
    /// visible bytes on rows of the requested parity.
    fn project(
        &mut self,
        device: &mut impl Device,
        plane: Plane,
        stream: &[u8],
        parity: Option<usize>,
    ) {
        device.select_plane(plane);
        let shadow = self.shadow.plane_mut(plane);
        for run in delta::runs(stream, PLANE_SIZE).flatten() {
            for (offset, value) in (run.offset..).zip(run.bytes.iter().copied()) {
                shadow[offset] = value;

                let row = row_of(offset);
                let column = column_of(offset);
                if parity.is_some_and(|p| row & 1 != p) || column >= VISIBLE_BYTES {
                    continue;
                }
                device.write(device_address(row, column), value);
            }
        }
    }
}
