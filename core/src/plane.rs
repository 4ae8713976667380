use alloc::boxed::Box;
use embedded_graphics::{
    Pixel,
    pixelcolor::{Gray2, GrayColor},
    prelude::{DrawTarget, OriginDimensions, Point, Size},
};

use crate::{
    device::Plane,
    geometry::{HEIGHT, PLANE_SIZE, ROW_STRIDE, WIDTH},
    quantize::QuantizedFrame,
};

/// One bit of every pixel, `ROW_STRIDE` bytes per row, bit 7 = leftmost pixel of a byte.
pub type BitPlane = [u8; PLANE_SIZE];

#[inline]
fn locate(x: usize, y: usize) -> (usize, u8) {
    let index = y * ROW_STRIDE + (x >> 3);
    let mask = 1 << (7 - (x & 7));
    (index, mask)
}

/// Both bitplanes of a 2-bit frame.
#[derive(Clone, PartialEq, Eq)]
pub struct PlanePair {
    bit0: Box<BitPlane>,
    bit4: Box<BitPlane>,
}

impl Default for PlanePair {
    fn default() -> Self {
        Self {
            bit0: Box::new([0; PLANE_SIZE]),
            bit4: Box::new([0; PLANE_SIZE]),
        }
    }
}

impl core::fmt::Debug for PlanePair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlanePair").finish_non_exhaustive()
    }
}

impl PlanePair {
    pub fn new(bit0: Box<BitPlane>, bit4: Box<BitPlane>) -> Self {
        Self { bit0, bit4 }
    }

    /// Pack a quantized frame: the low index bit goes to `bit0`, the high bit to `bit4`.
    /// Padding columns past `WIDTH` stay zero.
    pub fn from_quantized(frame: &QuantizedFrame) -> Self {
        let mut planes = Self::default();
        let pixels = (0..HEIGHT).flat_map(|y| {
            (0..WIDTH).map(move |x| {
                Pixel(
                    Point::new(x as i32, y as i32),
                    Gray2::new(frame.get(x, y)),
                )
            })
        });
        let Ok(()) = planes.draw_iter(pixels);
        planes
    }

    pub fn plane(&self, plane: Plane) -> &BitPlane {
        match plane {
            Plane::Bit0 => &self.bit0,
            Plane::Bit4 => &self.bit4,
        }
    }

    pub fn plane_mut(&mut self, plane: Plane) -> &mut BitPlane {
        match plane {
            Plane::Bit0 => &mut self.bit0,
            Plane::Bit4 => &mut self.bit4,
        }
    }

    /// Level index (0..=3) of a visible pixel.
    pub fn level(&self, x: usize, y: usize) -> u8 {
        let (index, mask) = locate(x, y);
        let low = (self.bit0[index] & mask != 0) as u8;
        let high = (self.bit4[index] & mask != 0) as u8;
        high << 1 | low
    }

    pub fn set_level(&mut self, x: usize, y: usize, level: u8) {
        let (index, mask) = locate(x, y);
        for (plane, bit) in [(&mut self.bit0, 1), (&mut self.bit4, 2)] {
            if level & bit != 0 {
                plane[index] |= mask;
            } else {
                plane[index] &= !mask;
            }
        }
    }
}

impl OriginDimensions for PlanePair {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for PlanePair {
    type Color = Gray2;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.y < 0 {
                continue;
            }
            let (x, y) = (coord.x as usize, coord.y as usize);
            if x < WIDTH && y < HEIGHT {
                self.set_level(x, y, color.luma());
            }
        }
        Ok(())
    }
}
