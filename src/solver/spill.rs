//! On-disk checkpoint stack.
//!
//! Each checkpoint is one file holding a single frame:
//!
//! ```text
//! magic "PTCPSPIL" | version u32 | comp u8 | ulen u64 | clen u64 | crc32 u32 | body
//! ```
//!
//! All integers are little endian. The CRC covers the uncompressed bincode
//! payload, so a frame that decompresses cleanly but carries the wrong bytes
//! is still rejected.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crc32fast::Hasher as Crc32;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SpillError;
use crate::solver::checkpoint::{Checkpoint, CheckpointStore};

const SPILL_MAGIC: [u8; 8] = *b"PTCPSPIL";
pub const SPILL_VERSION: u32 = 1;

const HEADER_LEN: usize = 8 + 4 + 1 + 8 + 8 + 4;

/// Largest output an LZ4 block of `clen` bytes can decode to.
#[inline]
fn lz4_max_output(clen: usize) -> usize {
    clen.saturating_mul(255).saturating_add(16)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpillCompression {
    None,
    #[default]
    Lz4,
}

impl SpillCompression {
    #[inline]
    fn tag(self) -> u8 {
        match self {
            SpillCompression::None => 0,
            SpillCompression::Lz4 => 1,
        }
    }

    #[inline]
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SpillCompression::None),
            1 => Some(SpillCompression::Lz4),
            _ => None,
        }
    }
}

fn io_error(stage: &'static str, path: &Path, error: std::io::Error) -> SpillError {
    SpillError::Io {
        stage,
        path: path.display().to_string(),
        error,
    }
}

fn corrupt(path: &Path, reason: String) -> SpillError {
    SpillError::Corrupt {
        path: path.display().to_string(),
        reason,
    }
}

/// Serialize `value` into a single frame at `path`, replacing any file there.
pub fn write_frame<T: Serialize>(
    path: &Path,
    value: &T,
    compression: SpillCompression,
) -> Result<(), SpillError> {
    let payload = bincode::serialize(value).map_err(|e| SpillError::Codec {
        stage: "serialize",
        error: e.to_string(),
    })?;

    let mut hasher = Crc32::new();
    hasher.update(&payload);
    let crc = hasher.finalize();
    let ulen = payload.len() as u64;

    let body = match compression {
        SpillCompression::None => payload,
        SpillCompression::Lz4 => lz4_flex::block::compress(&payload),
    };
    let clen = body.len() as u64;

    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(&SPILL_MAGIC);
    header.extend_from_slice(&SPILL_VERSION.to_le_bytes());
    header.push(compression.tag());
    header.extend_from_slice(&ulen.to_le_bytes());
    header.extend_from_slice(&clen.to_le_bytes());
    header.extend_from_slice(&crc.to_le_bytes());

    let file = File::create(path).map_err(|e| io_error("create", path, e))?;
    let mut out = BufWriter::new(file);
    out.write_all(&header)
        .map_err(|e| io_error("write header", path, e))?;
    out.write_all(&body)
        .map_err(|e| io_error("write body", path, e))?;
    out.flush().map_err(|e| io_error("flush", path, e))?;
    Ok(())
}

/// Split `N` bytes off the front of `buf`.
fn take<const N: usize>(buf: &mut &[u8]) -> [u8; N] {
    let (head, rest) = buf.split_at(N);
    *buf = rest;
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    out
}

/// Read and verify a frame written by [`write_frame`].
pub fn read_frame<T: DeserializeOwned>(path: &Path) -> Result<T, SpillError> {
    let bytes = fs::read(path).map_err(|e| io_error("read", path, e))?;
    if bytes.len() < HEADER_LEN {
        return Err(corrupt(
            path,
            format!("truncated header: {} bytes", bytes.len()),
        ));
    }

    let mut buf = bytes.as_slice();
    let magic: [u8; 8] = take(&mut buf);
    if magic != SPILL_MAGIC {
        return Err(corrupt(path, "invalid magic".into()));
    }
    let version = u32::from_le_bytes(take(&mut buf));
    if version != SPILL_VERSION {
        return Err(corrupt(
            path,
            format!("version mismatch: got {version}, expected {SPILL_VERSION}"),
        ));
    }
    let [tag] = take::<1>(&mut buf);
    let compression = SpillCompression::from_tag(tag)
        .ok_or_else(|| corrupt(path, format!("unknown compression tag {tag}")))?;
    let ulen = usize::try_from(u64::from_le_bytes(take(&mut buf))).unwrap_or(usize::MAX);
    let clen = usize::try_from(u64::from_le_bytes(take(&mut buf))).unwrap_or(usize::MAX);
    let crc_expected = u32::from_le_bytes(take(&mut buf));

    if buf.len() != clen {
        return Err(corrupt(
            path,
            format!("body length {} does not match header {clen}", buf.len()),
        ));
    }

    let payload = match compression {
        SpillCompression::None => {
            if clen != ulen {
                return Err(corrupt(
                    path,
                    format!("uncompressed frame with clen {clen} and ulen {ulen}"),
                ));
            }
            buf.to_vec()
        }
        SpillCompression::Lz4 => {
            if ulen > lz4_max_output(clen) {
                return Err(corrupt(
                    path,
                    format!("uncompressed length {ulen} impossible for {clen} lz4 bytes"),
                ));
            }
            lz4_flex::block::decompress(buf, ulen)
                .map_err(|e| corrupt(path, format!("lz4 decompress error: {e}")))?
        }
    };

    let mut hasher = Crc32::new();
    hasher.update(&payload);
    let crc = hasher.finalize();
    if crc != crc_expected {
        return Err(corrupt(
            path,
            format!("crc mismatch: got {crc:08x}, expected {crc_expected:08x}"),
        ));
    }

    bincode::deserialize(&payload).map_err(|e| SpillError::Codec {
        stage: "deserialize",
        error: e.to_string(),
    })
}

/// Checkpoints written to one file each under a directory.
///
/// Popping reads, verifies and deletes the newest file. Files still present
/// when the stack is dropped are removed, including one that failed to read. The directory should not be shared
/// with another live stack.
#[derive(Debug)]
pub struct SpillStack<M> {
    dir: PathBuf,
    compression: SpillCompression,
    files: Vec<PathBuf>,
    next_id: u64,
    _moves: PhantomData<fn() -> M>,
}

impl<M> SpillStack<M> {
    pub fn create<P: AsRef<Path>>(dir: P, compression: SpillCompression) -> Result<Self, SpillError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| io_error("create dir", &dir, e))?;
        Ok(Self {
            dir,
            compression,
            files: Vec::new(),
            next_id: 0,
            _moves: PhantomData,
        })
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn compression(&self) -> SpillCompression {
        self.compression
    }

    /// Files of the stored checkpoints, oldest first.
    #[inline]
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

impl<M> CheckpointStore<M> for SpillStack<M>
where
    M: Serialize + DeserializeOwned,
{
    type Error = SpillError;

    fn push(&mut self, checkpoint: Checkpoint<M>) -> Result<(), SpillError> {
        let path = self.dir.join(format!("checkpoint-{:06}.spill", self.next_id));
        self.next_id += 1;
        write_frame(&path, &checkpoint, self.compression)?;
        debug!(
            "spilled {} sequences to {}",
            checkpoint.frontier.len(),
            path.display()
        );
        self.files.push(path);
        Ok(())
    }

    /// A file that fails to read stays on the stack, so it is still
    /// removed when the stack is dropped.
    fn pop(&mut self) -> Result<Option<Checkpoint<M>>, SpillError> {
        let Some(path) = self.files.last() else {
            return Ok(None);
        };
        let checkpoint: Checkpoint<M> = read_frame(path)?;
        let path = self.files.pop().unwrap_or_default();
        fs::remove_file(&path).map_err(|e| io_error("remove", &path, e))?;
        debug!(
            "restored {} sequences from {}",
            checkpoint.frontier.len(),
            path.display()
        );
        Ok(Some(checkpoint))
    }

    #[inline]
    fn len(&self) -> usize {
        self.files.len()
    }
}

impl<M> Drop for SpillStack<M> {
    fn drop(&mut self) {
        for path in self.files.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                debug!("leaving {}: {e}", path.display());
            }
        }
    }
}
