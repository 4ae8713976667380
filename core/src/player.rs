use core::{ops::ControlFlow, time::Duration};

use log::{debug, info};
use strum::IntoEnumIterator;

use crate::{
    delta,
    device::{self, Device, Plane},
    error::{AnimError, Result},
    geometry::PLANE_SIZE,
    projector::{FramebufferProjector, Interlace},
    sequence::FrameSequence,
};

/// Frame pacing. Called once per displayed frame with that frame's delay.
///
/// Returning [`ControlFlow::Break`] ends playback.
pub trait Pacer {
    fn wait(&mut self, delay: Duration) -> ControlFlow<()>;
}

impl<P: Pacer + ?Sized> Pacer for &mut P {
    fn wait(&mut self, delay: Duration) -> ControlFlow<()> {
        (**self).wait(delay)
    }
}

/// What happens after the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Continue with the first delta on top of the last frame.
    #[default]
    Wrap,
    /// Show the keyframe again for its own delay, then continue with the first delta.
    Keyframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    pub interlace: Interlace,
    pub loop_mode: LoopMode,
    /// Zero the whole panel before the first keyframe.
    pub clear_on_start: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            interlace: Interlace::Interlaced,
            loop_mode: LoopMode::Wrap,
            clear_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    /// `next` is the index of the frame the next step shows.
    Steady { next: usize },
}

/// Plays a [`FrameSequence`] into a [`Device`], one frame per [`Player::step`].
pub struct Player<D: Device, P: Pacer> {
    sequence: FrameSequence,
    projector: FramebufferProjector,
    device: D,
    pacer: P,
    config: PlayerConfig,
    state: State,
    current: Option<usize>,
    shown: usize,
}

impl<D: Device, P: Pacer> Player<D, P> {
    pub fn new(sequence: FrameSequence, device: D, pacer: P, config: PlayerConfig) -> Self {
        Self {
            sequence,
            projector: FramebufferProjector::new(),
            device,
            pacer,
            config,
            state: State::Uninitialized,
            current: None,
            shown: 0,
        }
    }

    /// Index of the frame currently on the panel, `None` before the first step.
    pub fn frame_index(&self) -> Option<usize> {
        self.current
    }

    /// Frames shown since the player started.
    pub fn frames_shown(&self) -> usize {
        self.shown
    }

    pub fn projector(&self) -> &FramebufferProjector {
        &self.projector
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_parts(self) -> (FrameSequence, D, P) {
        (self.sequence, self.device, self.pacer)
    }

    fn show_keyframe(&mut self) {
        self.projector
            .load_keyframe(&mut self.device, self.sequence.keyframe());
    }

    /// Show the next frame, then wait for its delay.
    ///
    /// A delta that does not fit the planes is returned as [`AnimError::Delta`]; the panel keeps
    /// the previous frame.
    pub fn step(&mut self) -> Result<ControlFlow<()>> {
        let frames = self.sequence.len();
        let index = match self.state {
            State::Uninitialized => {
                info!("starting playback of {frames} frames");
                if self.config.clear_on_start {
                    device::clear(&mut self.device);
                }
                self.show_keyframe();
                0
            }
            State::Steady { next: 0 } => {
                // A still image stays on the panel untouched.
                if frames > 1 {
                    debug!("loop: reloading keyframe");
                    self.show_keyframe();
                }
                0
            }
            State::Steady { next } => {
                if let Some(pair) = self.sequence.delta(next) {
                    self.projector
                        .apply(&mut self.device, pair, self.config.interlace)
                        .map_err(|error| {
                            let plane = Plane::iter()
                                .find(|&p| delta::validate(pair.stream(p), PLANE_SIZE).is_err())
                                .unwrap_or(Plane::Bit0);
                            AnimError::Delta {
                                frame: next,
                                plane,
                                error,
                            }
                        })?;
                }
                next
            }
        };

        let next = if index + 1 < frames {
            index + 1
        } else {
            match self.config.loop_mode {
                LoopMode::Wrap if frames > 1 => 1,
                _ => 0,
            }
        };
        self.state = State::Steady { next };
        self.current = Some(index);
        self.shown += 1;
        Ok(self.pacer.wait(self.sequence.delay(index)))
    }

    /// Step until the pacer stops playback or a frame fails to apply.
    pub fn run(&mut self) -> Result<()> {
        while self.step()?.is_continue() {}
        info!("playback stopped after {} frames", self.shown);
        Ok(())
    }
}
