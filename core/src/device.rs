use crate::geometry::{HEIGHT, ROW_STRIDE, VISIBLE_BYTES};

/// First framebuffer register of the LCD controller.
pub const FRAMEBUFFER_BASE: u16 = 0xF800;
/// Bytes of framebuffer memory from [`FRAMEBUFFER_BASE`] to the top of the address space.
pub const FRAMEBUFFER_SPAN: usize = 0x1_0000 - FRAMEBUFFER_BASE as usize;
/// Register a driver writes the plane-select value to.
pub const PLANE_SELECT_REGISTER: u16 = 0xF037;

const _: () = assert!(ROW_STRIDE * HEIGHT <= FRAMEBUFFER_SPAN);

/// One of the two bitplanes of a 2-bit pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumIter)]
pub enum Plane {
    /// Low bit of the level index.
    Bit0,
    /// High bit of the level index.
    Bit4,
}

impl Plane {
    /// Value the controller expects in [`PLANE_SELECT_REGISTER`].
    pub fn select_value(self) -> u8 {
        match self {
            Plane::Bit0 => 0,
            Plane::Bit4 => 4,
        }
    }

    pub fn repr(self) -> &'static str {
        match self {
            Plane::Bit0 => "bit0",
            Plane::Bit4 => "bit4",
        }
    }
}

/// Byte-level register interface of the panel.
///
/// Writes are synchronous: a call returns once the controller has taken the byte.
pub trait Device {
    /// Route subsequent [`Device::write`] calls to `plane`.
    fn select_plane(&mut self, plane: Plane);
    fn write(&mut self, address: u16, value: u8);
}

impl<D: Device + ?Sized> Device for &mut D {
    fn select_plane(&mut self, plane: Plane) {
        (**self).select_plane(plane)
    }

    fn write(&mut self, address: u16, value: u8) {
        (**self).write(address, value)
    }
}

/// Controller address of a plane byte. The plane itself is chosen by
/// [`Device::select_plane`], not by the address.
#[inline]
pub fn device_address(row: usize, column: usize) -> u16 {
    debug_assert!(row < HEIGHT && column < VISIBLE_BYTES);
    FRAMEBUFFER_BASE + (row * ROW_STRIDE + column) as u16
}

/// Zero every framebuffer register of both planes.
pub fn clear(device: &mut impl Device) {
    use strum::IntoEnumIterator;

    for plane in Plane::iter() {
        device.select_plane(plane);
        for offset in 0..FRAMEBUFFER_SPAN {
            device.write(FRAMEBUFFER_BASE + offset as u16, 0);
        }
    }
}
