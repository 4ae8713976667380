use std::{ops::ControlFlow, time::Duration};

use log::debug;
use planedelta_core::{
    device::{Device, Plane},
    player::Pacer,
};

/// Device that only counts traffic, for running the player without a window.
#[derive(Default)]
pub struct CountingDevice {
    pub selects: usize,
    pub writes: usize,
}

impl Device for CountingDevice {
    fn select_plane(&mut self, _plane: Plane) {
        self.selects += 1;
    }

    fn write(&mut self, _address: u16, _value: u8) {
        self.writes += 1;
    }
}

/// Sleeps the thread for each delay.
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn wait(&mut self, delay: Duration) -> ControlFlow<()> {
        std::thread::sleep(delay);
        ControlFlow::Continue(())
    }
}

/// Stops an inner pacer after a fixed number of frames.
pub struct Limited<P> {
    inner: P,
    remaining: Option<usize>,
}

impl<P: Pacer> Limited<P> {
    pub fn new(inner: P, frames: Option<usize>) -> Self {
        Self {
            inner,
            remaining: frames,
        }
    }
}

impl<P: Pacer> Pacer for Limited<P> {
    fn wait(&mut self, delay: Duration) -> ControlFlow<()> {
        if self.inner.wait(delay).is_break() {
            return ControlFlow::Break(());
        }
        match &mut self.remaining {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                debug!("{remaining} frames left");
                if *remaining == 0 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
            None => ControlFlow::Continue(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Instant;

    impl Pacer for Instant {
        fn wait(&mut self, _delay: Duration) -> ControlFlow<()> {
            ControlFlow::Continue(())
        }
    }

    #[test]
    fn test_limited() {
        let mut pacer = Limited::new(Instant, Some(2));
        assert!(pacer.wait(Duration::ZERO).is_continue());
        assert!(pacer.wait(Duration::ZERO).is_break());

        let mut unlimited = Limited::new(Instant, None);
        for _ in 0..100 {
            assert!(unlimited.wait(Duration::ZERO).is_continue());
        }
    }
}
