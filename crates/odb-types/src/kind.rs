use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// A snapshot pointing at a top-level tree plus history metadata.
    Commit,
    /// An annotated pointer at another object of a declared kind.
    Tag,
}

impl ObjectKind {
    /// The canonical lowercase name used in object headers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            "tag" => Ok(Self::Tag),
            _ => Err(TypeError::InvalidKind(s.to_string())),
        }
    }
}

/// An object header: the kind plus the payload length in bytes.
///
/// Serialized as `"<kind> <decimal-length>\0"` and prepended to the payload
/// when computing an object's id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectPrefix {
    pub kind: ObjectKind,
    pub size: usize,
}

impl ObjectPrefix {
    /// Validate a declared length and build a prefix.
    ///
    /// Negative lengths and lengths that do not fit in `usize` are rejected
    /// before anything is allocated.
    pub fn new(kind: ObjectKind, size: i64) -> Result<Self, TypeError> {
        let size = usize::try_from(size).map_err(|_| TypeError::SizeOutOfRange(size))?;
        Ok(Self { kind, size })
    }

    /// Build a prefix for a payload already in memory.
    pub fn for_payload(kind: ObjectKind, payload: &[u8]) -> Self {
        Self {
            kind,
            size: payload.len(),
        }
    }

    /// The canonical header bytes, e.g. `b"blob 14\0"`.
    pub fn to_header(&self) -> Vec<u8> {
        format!("{} {}\0", self.kind, self.size).into_bytes()
    }

    /// Parse a header from the start of `bytes`.
    ///
    /// Returns the prefix and the number of bytes consumed, including the
    /// trailing NUL.
    pub fn parse_header(bytes: &[u8]) -> Result<(Self, usize), TypeError> {
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| TypeError::MalformedHeader("missing NUL terminator".into()))?;
        let header = std::str::from_utf8(&bytes[..nul])
            .map_err(|_| TypeError::MalformedHeader("header is not ASCII".into()))?;
        let (kind, size) = header
            .split_once(' ')
            .ok_or_else(|| TypeError::MalformedHeader(format!("no space in {header:?}")))?;
        let kind: ObjectKind = kind.parse()?;
        if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::MalformedHeader(format!(
                "invalid length {size:?}"
            )));
        }
        let size: usize = size
            .parse()
            .map_err(|_| TypeError::SizeOutOfRange(i64::MAX))?;
        Ok((Self { kind, size }, nul + 1))
    }
}

impl fmt::Display for ObjectPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.size)
    }
}
