//! Skip/count delta streams between two equal-length buffers.
//!
//! A stream is a sequence of records `skip, count, bytes[count]`. `skip` unchanged bytes are
//! stepped over, then `count` bytes are replaced. Both counts are single bytes, so longer runs
//! are split into several records; a record may carry `count == 0` when only the skip was needed.
//! Decoding stops once the stream runs out or the cursor reaches the end of the target, which is
//! why the encoder's final `skip, 0` pair is never read as a run.

use alloc::vec::Vec;
use core::fmt;

use crate::{device::Plane, plane::PlanePair};

/// Longest skip or change run a single record can express.
pub const MAX_RUN: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaError {
    /// The two buffers passed to [`encode`] differ in length.
    LengthMismatch { previous: usize, current: usize },
    /// A record announces more literal bytes than the stream still holds.
    Truncated {
        position: usize,
        needed: usize,
        available: usize,
    },
    /// A record would write past the end of the target.
    Overrun { offset: usize, count: usize, len: usize },
}

impl fmt::Display for DeltaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaError::LengthMismatch { previous, current } => {
                write!(f, "cannot diff buffers of {previous} and {current} bytes")
            }
            DeltaError::Truncated {
                position,
                needed,
                available,
            } => write!(
                f,
                "record at stream offset {position} needs {needed} bytes, {available} left"
            ),
            DeltaError::Overrun { offset, count, len } => write!(
                f,
                "run of {count} bytes at {offset} overruns a {len} byte target"
            ),
        }
    }
}

impl core::error::Error for DeltaError {}

/// Encode the changes that turn `previous` into `current`.
pub fn encode(previous: &[u8], current: &[u8]) -> Result<Vec<u8>, DeltaError> {
    if previous.len() != current.len() {
        return Err(DeltaError::LengthMismatch {
            previous: previous.len(),
            current: current.len(),
        });
    }
    Ok(encode_equal(previous, current))
}

fn encode_equal(previous: &[u8], current: &[u8]) -> Vec<u8> {
    let n = current.len();
    let mut out = Vec::new();
    let mut i = 0;

    while i < n {
        let mut skip = 0;
        while i < n && current[i] == previous[i] && skip < MAX_RUN {
            skip += 1;
            i += 1;
        }
        out.push(skip as u8);

        if i >= n {
            out.push(0);
            break;
        }

        let start = i;
        let mut count = 0;
        while i < n && current[i] != previous[i] && count < MAX_RUN {
            count += 1;
            i += 1;
        }
        out.push(count as u8);
        out.extend_from_slice(&current[start..start + count]);
    }
    out
}

/// Replacement bytes for `target[offset..offset + bytes.len()]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    pub offset: usize,
    pub bytes: &'a [u8],
}

/// Iterator over the non-empty runs of a stream applied to a `len` byte target.
///
/// Yields an error (and then ends) on the first malformed record.
pub struct Runs<'a> {
    stream: &'a [u8],
    len: usize,
    position: usize,
    cursor: usize,
    done: bool,
}

pub fn runs(stream: &[u8], len: usize) -> Runs<'_> {
    Runs {
        stream,
        len,
        position: 0,
        cursor: 0,
        done: false,
    }
}

impl<'a> Runs<'a> {
    fn fail(&mut self, error: DeltaError) -> Option<Result<Run<'a>, DeltaError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Result<Run<'a>, DeltaError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.position >= self.stream.len() || self.cursor >= self.len {
                break;
            }
            self.cursor += self.stream[self.position] as usize;
            self.position += 1;
            if self.position >= self.stream.len() || self.cursor >= self.len {
                break;
            }

            let count = self.stream[self.position] as usize;
            self.position += 1;
            let available = self.stream.len() - self.position;
            if count > available {
                return self.fail(DeltaError::Truncated {
                    position: self.position - 2,
                    needed: count,
                    available,
                });
            }
            if self.cursor + count > self.len {
                return self.fail(DeltaError::Overrun {
                    offset: self.cursor,
                    count,
                    len: self.len,
                });
            }
            if count == 0 {
                continue;
            }

            let run = Run {
                offset: self.cursor,
                bytes: &self.stream[self.position..self.position + count],
            };
            self.position += count;
            self.cursor += count;
            return Some(Ok(run));
        }
        self.done = true;
        None
    }
}

/// Check a stream against a `len` byte target without applying it.
///
/// Returns the number of bytes the stream replaces.
pub fn validate(stream: &[u8], len: usize) -> Result<usize, DeltaError> {
    let mut changed = 0;
    for run in runs(stream, len) {
        changed += run?.bytes.len();
    }
    Ok(changed)
}

/// Apply a stream to `target` in place. A malformed stream leaves `target` untouched.
pub fn decode(target: &mut [u8], stream: &[u8]) -> Result<(), DeltaError> {
    validate(stream, target.len())?;
    for run in runs(stream, target.len()).flatten() {
        target[run.offset..run.offset + run.bytes.len()].copy_from_slice(run.bytes);
    }
    Ok(())
}

/// Delta streams of both planes of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaPair {
    pub bit0: Vec<u8>,
    pub bit4: Vec<u8>,
}

impl DeltaPair {
    /// Streams turning `previous` into `current`, plane by plane.
    pub fn between(previous: &PlanePair, current: &PlanePair) -> Self {
        Self {
            bit0: encode_equal(previous.plane(Plane::Bit0), current.plane(Plane::Bit0)),
            bit4: encode_equal(previous.plane(Plane::Bit4), current.plane(Plane::Bit4)),
        }
    }

    pub fn stream(&self, plane: Plane) -> &[u8] {
        match plane {
            Plane::Bit0 => &self.bit0,
            Plane::Bit4 => &self.bit4,
        }
    }

    pub fn stream_mut(&mut self, plane: Plane) -> &mut Vec<u8> {
        match plane {
            Plane::Bit0 => &mut self.bit0,
            Plane::Bit4 => &mut self.bit4,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{vec, vec::Vec};

    use super::*;
    use crate::geometry::PLANE_SIZE;

    /// xorshift32, enough to scatter changes deterministically.
    struct Noise(u32);

    impl Noise {
        fn next(&mut self) -> u32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            self.0
        }

        fn buffer(&mut self, len: usize) -> Vec<u8> {
            (0..len).map(|_| self.next() as u8).collect()
        }

        /// `base` with roughly one byte in `density` changed, in clusters.
        fn mutate(&mut self, base: &[u8], density: u32) -> Vec<u8> {
            let mut out = base.to_vec();
            let mut i = 0;
            while i < out.len() {
                if self.next() % density == 0 {
                    let burst = (self.next() % 600) as usize;
                    for byte in out.iter_mut().skip(i).take(burst) {
                        *byte = byte.wrapping_add(1 + (self.next() % 255) as u8);
                    }
                    i += burst;
                }
                i += 1;
            }
            out
        }
    }

    fn literal_bytes(stream: &[u8], len: usize) -> usize {
        validate(stream, len).unwrap()
    }

    #[test]
    fn test_toy_example() {
        let previous = [0u8, 0, 0, 0];
        let current = [0u8, 7, 7, 0];
        let stream = encode(&previous, &current).unwrap();
        assert_eq!(stream, [1, 2, 7, 7, 1, 0]);

        let mut target = previous;
        decode(&mut target, &stream).unwrap();
        assert_eq!(target, current);
    }

    #[test]
    fn test_identical_buffers_have_no_literals() {
        let mut noise = Noise(0x1234_5678);
        let a = noise.buffer(PLANE_SIZE);
        let stream = encode(&a, &a).unwrap();
        assert_eq!(literal_bytes(&stream, PLANE_SIZE), 0);

        // 2016 = 7 * 255 + 231: seven capped skips, each followed by an empty change run,
        // then the final skip and its terminator.
        let mut expected = Vec::new();
        for _ in 0..7 {
            expected.extend_from_slice(&[255, 0]);
        }
        expected.extend_from_slice(&[231, 0]);
        assert_eq!(stream, expected);
    }

    #[test]
    fn test_round_trip() {
        let mut noise = Noise(0xDEAD_BEEF);
        for density in [2, 7, 50, 400, 5000] {
            let a = noise.buffer(PLANE_SIZE);
            let b = noise.mutate(&a, density);
            let stream = encode(&a, &b).unwrap();
            let mut target = a.clone();
            decode(&mut target, &stream).unwrap();
            assert_eq!(target, b, "density {density}");
        }
    }

    #[test]
    fn test_long_change_run_is_split() {
        let a = vec![0u8; 600];
        let b = vec![1u8; 600];
        let stream = encode(&a, &b).unwrap();
        assert_eq!(&stream[..2], &[0, 255]);
        assert_eq!(&stream[257..259], &[0, 255]);
        assert_eq!(&stream[514..516], &[0, 90]);
        // The last change run ends the buffer, so no skip/terminator pair follows.
        assert_eq!(stream.len(), 606);
        assert_eq!(literal_bytes(&stream, 600), 600);

        let mut target = a.clone();
        decode(&mut target, &stream).unwrap();
        assert_eq!(target, b);
    }

    #[test]
    fn test_change_after_long_skip() {
        let a = vec![0u8; 300];
        let mut b = a.clone();
        b[299] = 9;
        let stream = encode(&a, &b).unwrap();
        assert_eq!(stream, [255, 0, 44, 1, 9]);

        let mut target = a.clone();
        decode(&mut target, &stream).unwrap();
        assert_eq!(target, b);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            encode(&[0; 3], &[0; 4]),
            Err(DeltaError::LengthMismatch {
                previous: 3,
                current: 4
            })
        );
    }

    #[test]
    fn test_empty_stream_is_no_change() {
        let mut target = [5u8; 8];
        decode(&mut target, &[]).unwrap();
        decode(&mut target, &[3]).unwrap();
        assert_eq!(target, [5; 8]);
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let mut target = [0u8; 8];
        let result = decode(&mut target, &[1, 4, 9, 9]);
        assert_eq!(
            result,
            Err(DeltaError::Truncated {
                position: 0,
                needed: 4,
                available: 2
            })
        );
        assert_eq!(target, [0; 8]);

        // The bad record comes after a good one; nothing is applied.
        let result = decode(&mut target, &[0, 1, 7, 1, 3, 1]);
        assert!(matches!(result, Err(DeltaError::Truncated { position: 3, .. })));
        assert_eq!(target, [0; 8]);
    }

    #[test]
    fn test_overrun_is_rejected() {
        let mut target = [0u8; 4];
        let result = decode(&mut target, &[2, 3, 1, 1, 1]);
        assert_eq!(
            result,
            Err(DeltaError::Overrun {
                offset: 2,
                count: 3,
                len: 4
            })
        );
        assert_eq!(target, [0; 4]);
    }

    #[test]
    fn test_skip_past_end_stops() {
        let mut target = [0u8; 4];
        decode(&mut target, &[9, 2, 1, 1]).unwrap();
        assert_eq!(target, [0; 4]);
    }

    #[test]
    fn test_runs_skip_empty_records() {
        let stream = [255, 0, 1, 2, 4, 5, 0, 0];
        let collected: Vec<_> = runs(&stream, 300).map(|r| r.unwrap()).collect();
        assert_eq!(
            collected,
            [Run {
                offset: 256,
                bytes: &[4, 5]
            }]
        );
    }
}
