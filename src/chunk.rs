//! File chunking: splitting a byte source into offset-tagged payloads.
//!
//! [`ChunkSource`] reads a file (or any [`Read`] impl) lazily in
//! [`DATA_SIZE`]-byte pieces, tagging each with its byte offset.  All three
//! reliability strategies need random access by index for retransmission,
//! so the source is collected into an ordered `Vec<Chunk>` with
//! [`load_chunks`] before protocol execution begins.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::packet::DATA_SIZE;

/// One payload-sized piece of the file, tagged with its byte offset.
///
/// Offsets are monotonically increasing and non-overlapping: each equals the
/// cumulative byte count preceding the chunk.  A chunk is immutable once
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte position of `payload[0]` within the file.
    pub offset: u32,
    pub payload: Vec<u8>,
}

impl Chunk {
    /// The first byte offset *after* this chunk's payload.
    ///
    /// A cumulative acknowledgement of at least this value means the chunk
    /// has been fully received.  Widened to `i64` so comparisons against
    /// signed wire acknowledgements need no casts at call sites.
    pub fn end_offset(&self) -> i64 {
        i64::from(self.offset) + self.payload.len() as i64
    }
}

/// Lazy, finite, non-restartable sequence of [`Chunk`]s read from `reader`.
///
/// Yields chunks of exactly `capacity` bytes except possibly the last.
/// Stops permanently after the first empty read or I/O error.
pub struct ChunkSource<R: Read> {
    reader: R,
    capacity: usize,
    offset: u32,
    done: bool,
}

impl<R: Read> ChunkSource<R> {
    /// `capacity` is the payload size per chunk (transport packet size minus
    /// header size); must be non-zero.
    pub fn new(reader: R, capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be non-zero");
        Self {
            reader,
            capacity,
            offset: 0,
            done: false,
        }
    }
}

impl<R: Read> Iterator for ChunkSource<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Fill up to `capacity` bytes; a short read near EOF is not an error.
        let mut payload = vec![0u8; self.capacity];
        let mut filled = 0;
        while filled < self.capacity {
            match self.reader.read(&mut payload[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        if filled == 0 {
            self.done = true;
            return None;
        }

        payload.truncate(filled);
        let chunk = Chunk {
            offset: self.offset,
            payload,
        };
        self.offset += filled as u32;
        Some(Ok(chunk))
    }
}

/// Read `path` fully into an ordered chunk list with the default payload
/// capacity ([`DATA_SIZE`]).
pub fn load_chunks(path: &Path) -> io::Result<Vec<Chunk>> {
    let reader = BufReader::new(File::open(path)?);
    ChunkSource::new(reader, DATA_SIZE).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunks_of(data: &[u8], capacity: usize) -> Vec<Chunk> {
        ChunkSource::new(Cursor::new(data.to_vec()), capacity)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn chunk_count_is_ceil_of_size_over_capacity() {
        // 250 bytes at capacity 100 -> ceil(250/100) = 3 chunks.
        let chunks = chunks_of(&vec![7u8; 250], 100);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn offsets_step_by_capacity_and_lengths_sum_to_file_size() {
        let data: Vec<u8> = (0..=255).cycle().take(2500).map(|b| b as u8).collect();
        let chunks = chunks_of(&data, 1020);

        let offsets: Vec<u32> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 1020, 2040]);

        let total: usize = chunks.iter().map(|c| c.payload.len()).sum();
        assert_eq!(total, data.len());

        // Reassembly by offset reproduces the file exactly.
        let mut rebuilt = Vec::new();
        for c in &chunks {
            assert_eq!(c.offset as usize, rebuilt.len());
            rebuilt.extend_from_slice(&c.payload);
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn exact_multiple_has_no_trailing_runt() {
        let chunks = chunks_of(&vec![1u8; 300], 100);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.payload.len() == 100));
    }

    #[test]
    fn empty_source_yields_no_chunks() {
        assert!(chunks_of(&[], 100).is_empty());
    }

    #[test]
    fn source_is_exhausted_after_completion() {
        let mut src = ChunkSource::new(Cursor::new(vec![1u8; 10]), 100);
        assert!(src.next().is_some());
        assert!(src.next().is_none());
        assert!(src.next().is_none()); // stays done
    }

    #[test]
    fn end_offset_covers_payload() {
        let c = Chunk {
            offset: 1020,
            payload: vec![0u8; 500],
        };
        assert_eq!(c.end_offset(), 1520);
    }
}
