use bytes::{Bytes, BytesMut};
use std::fmt;
use std::str::FromStr;

const DATA_PREFIX: &[u8] = b"data: ";
const RECORD_TERMINATOR: &[u8] = b"\n\n";

/// Bytes a record adds around its payload.
pub const RECORD_OVERHEAD: usize = DATA_PREFIX.len() + RECORD_TERMINATOR.len();

/// Default upper bound on the payload carried by a single record.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 1024;

/// How upstream bytes are cut into event-stream records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Framing {
    /// One record per upstream read, bytes forwarded verbatim.
    #[default]
    Chunk,
    /// One record per newline-terminated upstream line.
    Line,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FramingParseError;

impl FromStr for Framing {
    type Err = FramingParseError;
    fn from_str(framing: &str) -> Result<Framing, Self::Err> {
        match framing.to_lowercase().as_str() {
            "chunk" => Ok(Framing::Chunk),
            "line" => Ok(Framing::Line),
            _ => Err(FramingParseError),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Framing::Chunk => write!(f, "chunk"),
            Framing::Line => write!(f, "line"),
        }
    }
}

/// Wraps `payload` as a single `data: <payload>\n\n` record.
pub fn record(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + RECORD_OVERHEAD);
    buf.extend_from_slice(DATA_PREFIX);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(RECORD_TERMINATOR);
    buf.freeze()
}

/// Turns upstream reads into event-stream records according to a [`Framing`].
///
/// In `Chunk` mode the framer is stateless apart from the size limit. In `Line`
/// mode it holds the unterminated tail of the last read until the next newline
/// arrives or [`Framer::finish`] is called.
#[derive(Debug)]
pub struct Framer {
    framing: Framing,
    max_record_size: usize,
    pending: BytesMut,
}

impl Framer {
    pub fn new(framing: Framing, max_record_size: usize) -> Self {
        Self {
            framing,
            max_record_size: max_record_size.max(1),
            pending: BytesMut::new(),
        }
    }

    /// Feed one upstream read, returning the records that are ready to send.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        match self.framing {
            Framing::Chunk => self.split(chunk),
            Framing::Line => {
                self.pending.extend_from_slice(chunk);
                let mut records = Vec::new();
                while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                    let line = self.pending.split_to(pos + 1);
                    let line = trim_line_ending(&line);
                    if !line.is_empty() {
                        records.extend(self.split(line));
                    }
                }
                records
            }
        }
    }

    /// Flush whatever is still buffered once upstream has ended.
    pub fn finish(&mut self) -> Vec<Bytes> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let rest = self.pending.split();
        let rest = trim_line_ending(&rest);
        if rest.is_empty() {
            Vec::new()
        } else {
            self.split(rest)
        }
    }

    fn split(&self, payload: &[u8]) -> Vec<Bytes> {
        payload.chunks(self.max_record_size).map(record).collect()
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
