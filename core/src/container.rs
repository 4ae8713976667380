//! On-disk layout of an encoded animation.
//!
//! A sequence directory holds:
//! - `frame000.bin`: the keyframe, plane `bit0` then plane `bit4`, `PLANE_SIZE` bytes each;
//! - `frameNNN.d0` / `frameNNN.d4` for every later frame: one delta stream per plane;
//! - `frames.txt`: one decimal delay in milliseconds per line, keyframe first.

use alloc::{boxed::Box, vec::Vec};
use core::fmt::Write as _;

use embedded_io::Write as _;
use log::info;
use strum::IntoEnumIterator;

use crate::{
    delta::DeltaPair,
    device::Plane,
    error::{AnimError, Path, Result},
    fs::{self, File, Filesystem, Mode},
    geometry::PLANE_SIZE,
    plane::{BitPlane, PlanePair},
    sequence::FrameSequence,
};

pub const KEYFRAME_NAME: &str = "frame000.bin";
pub const DELAY_TABLE_NAME: &str = "frames.txt";

fn join(dir: &str, name: core::fmt::Arguments<'_>) -> Result<Path> {
    let mut path = Path::new();
    if !dir.is_empty() {
        write!(path, "{}/", dir.trim_end_matches('/')).map_err(|_| AnimError::PathTooLong)?;
    }
    path.write_fmt(name).map_err(|_| AnimError::PathTooLong)?;
    Ok(path)
}

pub fn keyframe_path(dir: &str) -> Result<Path> {
    join(dir, format_args!("{KEYFRAME_NAME}"))
}

pub fn delay_table_path(dir: &str) -> Result<Path> {
    join(dir, format_args!("{DELAY_TABLE_NAME}"))
}

/// `frame{index:03}.d0` for `bit0`, `.d4` for `bit4`.
pub fn delta_path(dir: &str, index: usize, plane: Plane) -> Result<Path> {
    join(dir, format_args!("frame{index:03}.d{}", plane.select_value()))
}

pub fn write_keyframe(file: &mut impl File, path: &Path, planes: &PlanePair) -> Result<()> {
    for plane in Plane::iter() {
        file.write_all(planes.plane(plane))
            .map_err(|e| AnimError::from_io_error(path, e))?;
    }
    file.flush().map_err(|e| AnimError::from_io_error(path, e))
}

/// Read a keyframe. The file must hold exactly two planes.
pub fn parse_keyframe(file: &mut impl File, path: &Path) -> Result<PlanePair> {
    let expected = 2 * PLANE_SIZE;
    if file.size() != expected {
        return Err(AnimError::Geometry {
            path: path.clone(),
            expected,
            actual: file.size(),
        });
    }
    let mut bit0: Box<BitPlane> = Box::new([0; PLANE_SIZE]);
    let mut bit4: Box<BitPlane> = Box::new([0; PLANE_SIZE]);
    file.read_exact(&mut bit0[..])
        .map_err(|e| AnimError::from_read_exact_error(path, e))?;
    file.read_exact(&mut bit4[..])
        .map_err(|e| AnimError::from_read_exact_error(path, e))?;
    Ok(PlanePair::new(bit0, bit4))
}

pub fn write_delays(file: &mut impl File, path: &Path, delays: &[u32]) -> Result<()> {
    for delay in delays {
        let mut line = heapless::String::<12>::new();
        // u32::MAX is ten digits.
        let _ = writeln!(line, "{delay}");
        file.write_all(line.as_bytes())
            .map_err(|e| AnimError::from_io_error(path, e))?;
    }
    file.flush().map_err(|e| AnimError::from_io_error(path, e))
}

/// Parse a delay table. Blank lines are ignored.
pub fn parse_delays(text: &[u8]) -> Result<Vec<u32>> {
    let mut delays = Vec::new();
    for (index, line) in text.split(|&b| b == b'\n').enumerate() {
        let line = core::str::from_utf8(line)
            .map_err(|_| AnimError::InvalidDelay { line: index + 1 })?
            .trim();
        if line.is_empty() {
            continue;
        }
        let delay = line
            .parse()
            .map_err(|_| AnimError::InvalidDelay { line: index + 1 })?;
        delays.push(delay);
    }
    Ok(delays)
}

fn read_artifact<F: Filesystem>(filesystem: &F, path: &Path) -> Result<Vec<u8>> {
    let mut file = filesystem
        .open_file(path, Mode::Read)
        .map_err(|e| AnimError::from_io_error(path, e))?;
    fs::read_to_end(&mut file).map_err(|e| AnimError::from_read_exact_error(path, e))
}

fn write_artifact<F: Filesystem>(filesystem: &F, path: &Path, data: &[u8]) -> Result<()> {
    let mut file = filesystem
        .open_file(path, Mode::Write)
        .map_err(|e| AnimError::from_io_error(path, e))?;
    file.write_all(data)
        .map_err(|e| AnimError::from_io_error(path, e))?;
    file.flush().map_err(|e| AnimError::from_io_error(path, e))
}

/// Write every artifact of `sequence` into `dir`, creating it if needed.
pub fn store<F: Filesystem>(filesystem: &F, dir: &str, sequence: &FrameSequence) -> Result<()> {
    if !dir.is_empty() {
        filesystem.create_dir_all(dir).map_err(|e| {
            let mut path = Path::new();
            let _ = path.push_str(dir);
            AnimError::from_io_error(&path, e)
        })?;
    }

    let path = keyframe_path(dir)?;
    let mut file = filesystem
        .open_file(&path, Mode::Write)
        .map_err(|e| AnimError::from_io_error(&path, e))?;
    write_keyframe(&mut file, &path, sequence.keyframe())?;

    for (offset, pair) in sequence.deltas().iter().enumerate() {
        for plane in Plane::iter() {
            let path = delta_path(dir, offset + 1, plane)?;
            write_artifact(filesystem, &path, pair.stream(plane))?;
        }
    }

    let path = delay_table_path(dir)?;
    let mut file = filesystem
        .open_file(&path, Mode::Write)
        .map_err(|e| AnimError::from_io_error(&path, e))?;
    write_delays(&mut file, &path, sequence.delays())?;

    info!("stored {} frames in {:?}", sequence.len(), dir);
    Ok(())
}

/// Read and validate every artifact in `dir`.
///
/// Everything is checked here, so a sequence that loads can be played without further
/// failure.
pub fn load<F: Filesystem>(filesystem: &F, dir: &str) -> Result<FrameSequence> {
    let delays = parse_delays(&read_artifact(filesystem, &delay_table_path(dir)?)?)?;
    if delays.is_empty() {
        return Err(AnimError::Empty);
    }

    let path = keyframe_path(dir)?;
    let mut file = filesystem
        .open_file(&path, Mode::Read)
        .map_err(|e| AnimError::from_io_error(&path, e))?;
    let keyframe = parse_keyframe(&mut file, &path)?;

    let mut deltas = Vec::with_capacity(delays.len() - 1);
    for index in 1..delays.len() {
        let mut pair = DeltaPair::default();
        for plane in Plane::iter() {
            *pair.stream_mut(plane) = read_artifact(filesystem, &delta_path(dir, index, plane)?)?;
        }
        deltas.push(pair);
    }

    let sequence = FrameSequence::from_parts(keyframe, deltas, delays)?;
    info!("loaded {} frames from {:?}", sequence.len(), dir);
    Ok(sequence)
}
