use alloc::{vec, vec::Vec};
use embedded_io::{ErrorType, Read, Seek, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    /// Create or truncate.
    Write,
}

pub trait File: Read + Write + Seek {
    fn size(&self) -> usize;
}

/// Storage the artifacts live on: `std::fs` on the desktop, an SD card on hardware.
pub trait Filesystem: ErrorType {
    type File: File;

    fn open_file(&self, path: &str, mode: Mode) -> Result<Self::File, Self::Error>;
    fn create_dir_all(&self, path: &str) -> Result<(), Self::Error>;
}

/// Read a whole file from its current position.
pub fn read_to_end<F: File>(file: &mut F) -> Result<Vec<u8>, embedded_io::ReadExactError<F::Error>> {
    let position = file.stream_position().map_err(embedded_io::ReadExactError::Other)? as usize;
    let mut data = vec![0u8; file.size().saturating_sub(position)];
    file.read_exact(&mut data)?;
    Ok(data)
}
