//! Persisted grid snapshots.
//!
//! Building a grid for a large lake means running a point-in-polygon test for
//! every lattice coordinate, so finished grids can be written to disk and
//! reloaded on the next start. A cached grid is only reused when it was built
//! from exactly the same inputs, which is checked through the fingerprint
//! produced by [`grid_fingerprint`](crate::grid::grid_fingerprint).
//!
//! # Serialization Format
//!
//! ```text
//! Header (16 bytes):
//!   - Magic: b"WWGC" (4 bytes)
//!   - Version: u8 (1 byte)
//!   - Flags: u8 (1 byte) - bit 0: points carry depth samples
//!   - Point count: u32 LE (4 bytes)
//!   - Reserved: 6 bytes
//!
//! Fingerprint (32 bytes):
//!   - SHA-256 over grid settings, minimum safe depth and source digests
//!
//! Body:
//!   - postcard-serialized GridCacheBody
//!   - zstd compressed
//!
//! Footer (32 bytes):
//!   - SHA-256 checksum of compressed body
//! ```

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::grid::{GridLayout, GridPoint, GridSnapshot};

const CACHE_MAGIC: &[u8; 4] = b"WWGC";

const CACHE_VERSION: u8 = 1;

const FLAG_HAS_DEPTHS: u8 = 0x01;

const HEADER_SIZE: usize = 16;

const FINGERPRINT_SIZE: usize = 32;

const CHECKSUM_SIZE: usize = 32;

/// zstd compression level (balanced speed/ratio).
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct GridCacheBody {
    layout: Option<GridLayout>,
    min_safe_depth: f64,
    points: Vec<GridPoint>,
}

/// Write a snapshot to `path`, replacing any existing file atomically.
pub fn save_grid(snapshot: &GridSnapshot, path: &Path) -> Result<()> {
    let body = GridCacheBody {
        layout: snapshot.layout().copied(),
        min_safe_depth: snapshot.minimum_safe_depth(),
        points: snapshot.points().to_vec(),
    };

    let serialized = postcard::to_allocvec(&body).map_err(|e| Error::GridCacheSerialize {
        message: format!("postcard serialization failed: {}", e),
    })?;
    let compressed = zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
        Error::GridCacheSerialize {
            message: format!("zstd compression failed: {}", e),
        }
    })?;
    let checksum = Sha256::digest(&compressed);

    let has_depths = body.points.iter().any(|p| p.depth_meters.is_some());
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(CACHE_MAGIC);
    header[4] = CACHE_VERSION;
    header[5] = if has_depths { FLAG_HAS_DEPTHS } else { 0 };
    header[6..10].copy_from_slice(&(body.points.len() as u32).to_le_bytes());

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(&header)?;
    temp.write_all(&snapshot.fingerprint())?;
    temp.write_all(&compressed)?;
    temp.write_all(&checksum)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    info!(
        path = %path.display(),
        points = body.points.len(),
        compressed_size = compressed.len(),
        "saved grid cache"
    );
    Ok(())
}

/// Load a snapshot, requiring it to match `expected_fingerprint`.
pub fn load_grid(path: &Path, expected_fingerprint: &[u8; 32]) -> Result<GridSnapshot> {
    debug!(path = %path.display(), "loading grid cache");
    let load_error = |message: String| Error::GridCacheLoad {
        path: path.to_path_buf(),
        message,
    };

    let bytes = fs::read(path)?;
    if bytes.len() < HEADER_SIZE + FINGERPRINT_SIZE + CHECKSUM_SIZE {
        return Err(load_error(format!("file too short ({} bytes)", bytes.len())));
    }

    let (header, rest) = bytes.split_at(HEADER_SIZE);
    if &header[0..4] != CACHE_MAGIC {
        return Err(load_error("invalid magic bytes".to_string()));
    }
    let version = header[4];
    if version != CACHE_VERSION {
        return Err(load_error(format!(
            "unsupported version {} (expected {})",
            version, CACHE_VERSION
        )));
    }
    let point_count = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);

    let (fingerprint, rest) = rest.split_at(FINGERPRINT_SIZE);
    if fingerprint != expected_fingerprint.as_slice() {
        return Err(Error::GridCacheStale {
            path: path.to_path_buf(),
        });
    }

    let (compressed, stored_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);
    if Sha256::digest(compressed).as_slice() != stored_checksum {
        return Err(load_error(
            "checksum mismatch - file may be corrupted".to_string(),
        ));
    }

    let decompressed = zstd::decode_all(compressed)
        .map_err(|e| load_error(format!("zstd decompression failed: {}", e)))?;
    let body: GridCacheBody = postcard::from_bytes(&decompressed)
        .map_err(|e| load_error(format!("postcard deserialization failed: {}", e)))?;

    if body.points.len() != point_count as usize {
        return Err(load_error(format!(
            "point count mismatch (header {}, body {})",
            point_count,
            body.points.len()
        )));
    }

    info!(
        path = %path.display(),
        points = body.points.len(),
        "loaded grid cache"
    );

    Ok(GridSnapshot::from_parts(
        body.layout,
        body.points,
        body.min_safe_depth,
        *expected_fingerprint,
    ))
}

/// Like [`load_grid`], but any failure yields `None` so the caller can rebuild.
pub fn try_load_grid(path: &Path, expected_fingerprint: &[u8; 32]) -> Option<GridSnapshot> {
    match load_grid(path, expected_fingerprint) {
        Ok(snapshot) => Some(snapshot),
        Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no grid cache present");
            None
        }
        Err(Error::GridCacheStale { .. }) => {
            info!(path = %path.display(), "grid cache is stale; rebuilding");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable grid cache");
            None
        }
    }
}
