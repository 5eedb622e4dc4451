//! Session file naming and on-disk layout.
//!
//! A session file starts with a magic line and a TOML header describing the
//! recorded streams, closed by a `---` line. Frame records follow, each laid
//! out as:
//!
//! ```text
//! u64 LE  timestamp, microseconds since the file was created
//! u8      stream id (0 = color, 1 = depth)
//! u32 LE  payload length
//! [u8]    payload
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::device::{DeviceError, StreamConfig, StreamKind};

const MAGIC: &[u8] = b"GAZEREC1\n";
const HEADER_END: &str = "---";

/// Current date and time as almost-ISO string, usable in file names.
pub fn timestamp_name(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Full path of the session file for a run started at `started`.
pub fn session_path(dir: &Path, started: &DateTime<Local>, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", timestamp_name(started), extension))
}

/// Header stored at the top of every session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHeader {
    pub created: String,
    pub streams: Vec<StreamConfig>,
}

/// One frame record read back from a session file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub timestamp_us: u64,
    pub stream: StreamKind,
    pub payload: Vec<u8>,
}

/// Appends frames to a session file.
pub struct SessionWriter {
    path: PathBuf,
    out: BufWriter<File>,
    origin: Instant,
    frames: u64,
}

impl std::fmt::Debug for SessionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWriter")
            .field("path", &self.path)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl SessionWriter {
    /// Create the file and write its header.
    ///
    /// An existing file at `path` is truncated.
    pub fn create(path: &Path, streams: &[StreamConfig]) -> Result<Self, DeviceError> {
        for stream in streams {
            stream.validate()?;
        }

        let file = File::create(path).map_err(|e| DeviceError::SessionFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let header = SessionHeader {
            created: Local::now().to_rfc3339(),
            streams: streams.to_vec(),
        };
        let header_text = toml::to_string(&header)?;

        let mut out = BufWriter::new(file);
        out.write_all(MAGIC)?;
        out.write_all(header_text.as_bytes())?;
        if !header_text.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.write_all(HEADER_END.as_bytes())?;
        out.write_all(b"\n")?;

        Ok(Self {
            path: path.to_path_buf(),
            out,
            origin: Instant::now(),
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frame records written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Append one frame record stamped with the time since creation.
    pub fn write_frame(&mut self, stream: StreamKind, payload: &[u8]) -> io::Result<()> {
        let timestamp = u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX);
        let len = u32::try_from(payload.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame payload too large"))?;

        self.out.write_all(&timestamp.to_le_bytes())?;
        self.out.write_all(&[stream.id()])?;
        self.out.write_all(&len.to_le_bytes())?;
        self.out.write_all(payload)?;
        self.frames += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for SessionWriter {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            log::error!("Failed to flush session file {:?}: {}", self.path, e);
        }
    }
}

/// Read a whole session file back.
pub fn read_session(path: &Path) -> io::Result<(SessionHeader, Vec<FrameRecord>)> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = vec![0u8; MAGIC.len()];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(invalid_data("not a session file"));
    }

    let mut header_text = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(invalid_data("unterminated session header"));
        }
        if line.trim_end() == HEADER_END {
            break;
        }
        header_text.push_str(&line);
    }
    let header: SessionHeader =
        toml::from_str(&header_text).map_err(|e| invalid_data(&e.to_string()))?;

    let mut records = Vec::new();
    loop {
        let mut timestamp = [0u8; 8];
        match reader.read_exact(&mut timestamp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let mut id = [0u8; 1];
        reader.read_exact(&mut id)?;
        let mut len = [0u8; 4];
        reader.read_exact(&mut len)?;
        let mut payload = vec![0u8; u32::from_le_bytes(len) as usize];
        reader.read_exact(&mut payload)?;

        let stream = StreamKind::from_id(id[0])
            .ok_or_else(|| invalid_data(&format!("unknown stream id {}", id[0])))?;
        records.push(FrameRecord {
            timestamp_us: u64::from_le_bytes(timestamp),
            stream,
            payload,
        });
    }

    Ok((header, records))
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}
