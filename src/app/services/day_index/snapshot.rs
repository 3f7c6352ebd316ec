//! Binary snapshot persistence for day indexes
//!
//! A snapshot is a single hidden file `{root}/.{yyyymmdd}`:
//!
//! ```text
//! +--------+---------+--------+-------------+------------------------+
//! | "RDIX" | version | crc32  | payload len | bincode(SnapshotPayload) |
//! | 4 B    | u16 LE  | u32 LE | u32 LE      | payload len bytes        |
//! +--------+---------+--------+-------------+------------------------+
//! ```
//!
//! Snapshots are written to a temporary file in the same directory and
//! renamed into place, so readers never observe a partial write. Any header,
//! checksum or decode mismatch is reported as [`Error::Snapshot`].

use super::{DayIndex, ProductFile, snapshot_path};
use crate::app::services::naming;
use crate::constants::{SNAPSHOT_HEADER_LEN, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotPayload {
    day: String,
    stations: BTreeMap<String, Vec<ProductFile>>,
}

impl DayIndex {
    /// Persist this index as `{root}/.{day}`, replacing any previous file
    pub fn persist(&self) -> Result<PathBuf> {
        let path = self.snapshot_path();
        let payload = SnapshotPayload {
            day: self.day.clone(),
            stations: self.stations().clone(),
        };
        let bytes = encode(&payload)?;

        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| {
            Error::io(
                format!("Failed to create temporary snapshot in {}", self.root.display()),
                e,
            )
        })?;
        temp.write_all(&bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| Error::io(format!("Failed to write snapshot {}", path.display()), e))?;
        temp.persist(&path).map_err(|e| {
            Error::io(
                format!("Failed to move snapshot into place at {}", path.display()),
                e.error,
            )
        })?;

        debug!(
            "Persisted snapshot {} ({} stations, {} bytes)",
            path.display(),
            self.station_count(),
            bytes.len()
        );
        Ok(path)
    }

    /// Load a persisted snapshot file
    ///
    /// The day is taken from the file name and must match the payload.
    pub fn load(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let day = naming::day_of_snapshot_file(file_name)
            .ok_or_else(|| Error::snapshot(path, "file name is not a day snapshot"))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));

        let bytes = fs::read(path)
            .map_err(|e| Error::io(format!("Failed to read snapshot {}", path.display()), e))?;
        let payload = decode(path, &bytes)?;

        if payload.day != day {
            return Err(Error::snapshot(
                path,
                format!("payload is for day {}, expected {}", payload.day, day),
            ));
        }

        Ok(Self::from_parts(root, payload.day, payload.stations))
    }

    /// Load the snapshot for `day` under `root`
    pub fn load_day(root: &Path, day: &str) -> Result<Self> {
        Self::load(&snapshot_path(root, day))
    }
}

fn encode(payload: &SnapshotPayload) -> Result<Vec<u8>> {
    let body = bincode::serialize(payload)?;
    let length = u32::try_from(body.len())
        .map_err(|_| Error::serialization("snapshot payload exceeds 4 GiB"))?;

    let mut bytes = Vec::with_capacity(SNAPSHOT_HEADER_LEN + body.len());
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

fn decode(path: &Path, bytes: &[u8]) -> Result<SnapshotPayload> {
    if bytes.len() < SNAPSHOT_HEADER_LEN {
        return Err(Error::snapshot(path, "truncated header"));
    }

    let (header, body) = bytes.split_at(SNAPSHOT_HEADER_LEN);
    if &header[0..4] != SNAPSHOT_MAGIC {
        return Err(Error::snapshot(path, "bad magic"));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != SNAPSHOT_VERSION {
        return Err(Error::snapshot(
            path,
            format!("unsupported version {} (expected {})", version, SNAPSHOT_VERSION),
        ));
    }

    let checksum = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
    let length = u32::from_le_bytes([header[10], header[11], header[12], header[13]]) as usize;
    if body.len() != length {
        return Err(Error::snapshot(
            path,
            format!("payload is {} bytes, header says {}", body.len(), length),
        ));
    }
    if crc32fast::hash(body) != checksum {
        return Err(Error::snapshot(path, "checksum mismatch"));
    }

    bincode::deserialize(body)
        .map_err(|e| Error::snapshot(path, format!("undecodable payload: {}", e)))
}
