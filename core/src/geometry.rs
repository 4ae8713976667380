//! Panel geometry shared by the encoder and the player.
//!
//! Both sides must agree on these values exactly: a plane written with one geometry cannot be
//! patched by a player built with another.

/// Visible pixels per row.
pub const WIDTH: usize = 192;
/// Visible rows.
pub const HEIGHT: usize = 63;
/// Bytes allocated per row in a bitplane, including the addressing padding after the visible
/// columns.
pub const ROW_STRIDE: usize = 32;
/// Leading bytes of each row that the panel actually shows.
pub const VISIBLE_BYTES: usize = 24;
/// Size of one bitplane in bytes.
pub const PLANE_SIZE: usize = ROW_STRIDE * HEIGHT;
/// Samples in a grayscale or quantized frame.
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

const _: () = assert!(ROW_STRIDE * 8 >= WIDTH);
const _: () = assert!(VISIBLE_BYTES * 8 == WIDTH);
const _: () = assert!(VISIBLE_BYTES <= ROW_STRIDE);

/// Row of a plane byte offset.
#[inline]
pub const fn row_of(offset: usize) -> usize {
    offset / ROW_STRIDE
}

/// Column (in bytes) of a plane byte offset within its row.
#[inline]
pub const fn column_of(offset: usize) -> usize {
    offset % ROW_STRIDE
}

/// Whether a plane byte offset falls inside the visible part of its row.
#[inline]
pub const fn is_visible(offset: usize) -> bool {
    column_of(offset) < VISIBLE_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(PLANE_SIZE, 2016);
        assert_eq!(row_of(0), 0);
        assert_eq!(row_of(ROW_STRIDE - 1), 0);
        assert_eq!(row_of(ROW_STRIDE), 1);
        assert_eq!(column_of(ROW_STRIDE + 5), 5);
        assert!(is_visible(VISIBLE_BYTES - 1));
        assert!(!is_visible(VISIBLE_BYTES));
        assert!(!is_visible(ROW_STRIDE - 1));
        assert!(is_visible(ROW_STRIDE));
    }
}
