use std::cmp::Ordering;
use std::fmt;

use odb_crypto::ObjectHasher;
use odb_types::{ObjectId, ObjectKind, ObjectPrefix};

use crate::error::{StoreError, StoreResult};

/// A stored object: kind tag + raw payload.
///
/// `Object` is the unit of storage. Its id is always derived from its
/// content; nothing in this crate stores an object under any other key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes, without the header.
    pub data: Vec<u8>,
}

impl Object {
    /// Create a new object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Create a blob object.
    pub fn blob(data: impl Into<Vec<u8>>) -> Self {
        Self::new(ObjectKind::Blob, data.into())
    }

    /// The object's header.
    pub fn prefix(&self) -> ObjectPrefix {
        ObjectPrefix::for_payload(self.kind, &self.data)
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Compute the content-addressed ID for this object.
    pub fn id(&self) -> ObjectId {
        ObjectHasher::hash(self.kind, &self.data)
    }

    /// Returns `true` if this object hashes to `id`.
    pub fn verify(&self, id: &ObjectId) -> bool {
        ObjectHasher::verify(self.kind, &self.data, id)
    }

    fn expect_kind(&self, wanted: ObjectKind) -> StoreResult<()> {
        if self.kind != wanted {
            return Err(StoreError::UnexpectedKind {
                id: self.id(),
                found: self.kind,
                wanted,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
    /// Submodule commit (0o160000).
    Gitlink,
}

impl EntryMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Gitlink => 0o160000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            0o160000 => Some(Self::Gitlink),
            _ => None,
        }
    }

    /// Returns `true` for plain and executable files.
    pub fn is_regular(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    /// Returns `true` for subtrees.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl fmt::Display for EntryMode {
    // Trees store modes without leading zeros, e.g. "40000".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    fn sort_key(&self) -> impl Iterator<Item = u8> + '_ {
        let suffix = if self.mode.is_dir() { Some(b'/') } else { None };
        self.name.bytes().chain(suffix)
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    /// Git order: directories compare as if their name ended in `/`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(other.sort_key())
    }
}

/// Directory listing object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    /// Sorted entries in this directory.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries, sorted in git order.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the binary tree format: `"<octal mode> <name>\0<20-byte id>"` repeated.
    pub fn parse(id: ObjectId, mut data: &[u8]) -> StoreResult<Self> {
        let malformed = |reason: String| StoreError::MalformedObject { id, reason };
        let mut entries = Vec::new();
        while !data.is_empty() {
            let space = data
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| malformed("tree entry missing mode".into()))?;
            let mode = std::str::from_utf8(&data[..space])
                .ok()
                .and_then(|s| u32::from_str_radix(s, 8).ok())
                .and_then(EntryMode::from_mode_bits)
                .ok_or_else(|| {
                    malformed(format!(
                        "invalid tree entry mode {:?}",
                        String::from_utf8_lossy(&data[..space])
                    ))
                })?;
            data = &data[space + 1..];

            let nul = data
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| malformed("tree entry missing name terminator".into()))?;
            let name = std::str::from_utf8(&data[..nul])
                .map_err(|_| malformed("tree entry name is not UTF-8".into()))?
                .to_string();
            data = &data[nul + 1..];

            if data.len() < 20 {
                return Err(malformed(format!("tree entry {name:?} has truncated id")));
            }
            let object_id = ObjectId::from_slice(&data[..20])?;
            data = &data[20..];

            entries.push(TreeEntry {
                mode,
                name,
                object_id,
            });
        }
        Ok(Self { entries })
    }

    /// Serialize to the binary tree format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.to_string().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.object_id.as_bytes());
        }
        out
    }

    /// Convert into an `Object` for storage.
    pub fn to_object(&self) -> Object {
        Object::new(ObjectKind::Tree, self.to_bytes())
    }

    /// Decode from an `Object`.
    pub fn from_object(obj: &Object) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        Self::parse(obj.id(), &obj.data)
    }

    /// Look up an entry by exact name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit / Tag headers
// ---------------------------------------------------------------------------

/// Split a commit or tag payload into header fields and message.
///
/// Only the header block must be UTF-8. The message is returned as raw bytes
/// since git allows any encoding there when an `encoding` header names it.
/// Continuation lines (starting with a space) are folded into the previous
/// header's value, separated by `\n`.
fn parse_headers(id: ObjectId, data: &[u8]) -> StoreResult<(Vec<(String, String)>, Vec<u8>)> {
    let (head, message) = match data.windows(2).position(|w| w == b"\n\n") {
        Some(pos) => (&data[..pos], &data[pos + 2..]),
        None => (data.strip_suffix(b"\n").unwrap_or(data), &[][..]),
    };
    let head = std::str::from_utf8(head).map_err(|e| StoreError::MalformedObject {
        id,
        reason: format!("header block is not UTF-8 at byte {}", e.valid_up_to()),
    })?;

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.split('\n') {
        if let Some(cont) = line.strip_prefix(' ') {
            let (_, value) = headers.last_mut().ok_or_else(|| StoreError::MalformedObject {
                id,
                reason: "continuation line before first header".into(),
            })?;
            value.push('\n');
            value.push_str(cont);
            continue;
        }
        let (key, value) = line.split_once(' ').ok_or_else(|| StoreError::MalformedObject {
            id,
            reason: format!("malformed header line {line:?}"),
        })?;
        headers.push((key.to_string(), value.to_string()));
    }
    Ok((headers, message.to_vec()))
}

fn write_headers(out: &mut String, headers: &[(String, String)]) {
    for (key, value) in headers {
        out.push_str(key);
        out.push(' ');
        out.push_str(&value.replace('\n', "\n "));
        out.push('\n');
    }
}

fn parse_id_header(id: ObjectId, key: &str, value: &str) -> StoreResult<ObjectId> {
    ObjectId::from_hex(value).map_err(|e| StoreError::MalformedObject {
        id,
        reason: format!("bad {key} header: {e}"),
    })
}

/// A commit record. Only the fields the resolver relies on are typed; every
/// other header is kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// The commit's top-level tree.
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    /// Remaining headers (author, committer, ...) in order.
    pub headers: Vec<(String, String)>,
    /// Raw message bytes, in whatever encoding the `encoding` header names.
    pub message: Vec<u8>,
}

impl Commit {
    /// A parentless commit with no extra headers.
    pub fn new(tree: ObjectId, message: impl Into<Vec<u8>>) -> Self {
        Self {
            tree,
            parents: Vec::new(),
            headers: Vec::new(),
            message: message.into(),
        }
    }

    pub fn parse(id: ObjectId, data: &[u8]) -> StoreResult<Self> {
        let (headers, message) = parse_headers(id, data)?;
        let mut iter = headers.into_iter();
        let tree = match iter.next() {
            Some((key, value)) if key == "tree" => parse_id_header(id, "tree", &value)?,
            _ => {
                return Err(StoreError::MalformedObject {
                    id,
                    reason: "commit does not start with a tree header".into(),
                })
            }
        };
        let mut parents = Vec::new();
        let mut rest = Vec::new();
        for (key, value) in iter {
            if key == "parent" && rest.is_empty() {
                parents.push(parse_id_header(id, "parent", &value)?);
            } else {
                rest.push((key, value));
            }
        }
        Ok(Self {
            tree,
            parents,
            headers: rest,
            message,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        write_headers(&mut out, &self.headers);
        out.push('\n');
        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.message);
        bytes
    }

    /// Convert into an `Object` for storage.
    pub fn to_object(&self) -> Object {
        Object::new(ObjectKind::Commit, self.to_bytes())
    }

    /// Decode from an `Object`.
    pub fn from_object(obj: &Object) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        Self::parse(obj.id(), &obj.data)
    }
}

/// An annotated tag record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// The tagged object.
    pub object: ObjectId,
    /// The kind the tag declares its target to be.
    pub kind: ObjectKind,
    pub name: String,
    /// Remaining headers (tagger, ...) in order.
    pub headers: Vec<(String, String)>,
    pub message: Vec<u8>,
}

impl Tag {
    pub fn new(
        object: ObjectId,
        kind: ObjectKind,
        name: impl Into<String>,
        message: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            object,
            kind,
            name: name.into(),
            headers: Vec::new(),
            message: message.into(),
        }
    }

    pub fn parse(id: ObjectId, data: &[u8]) -> StoreResult<Self> {
        let (headers, message) = parse_headers(id, data)?;
        let mut object = None;
        let mut kind = None;
        let mut name = String::new();
        let mut rest = Vec::new();
        for (key, value) in headers {
            if key == "object" && object.is_none() {
                object = Some(parse_id_header(id, "object", &value)?);
            } else if key == "type" && kind.is_none() {
                let parsed = value.parse::<ObjectKind>().map_err(|e| StoreError::MalformedObject {
                    id,
                    reason: format!("bad type header: {e}"),
                })?;
                kind = Some(parsed);
            } else if key == "tag" && name.is_empty() {
                name = value;
            } else {
                rest.push((key, value));
            }
        }
        let (Some(object), Some(kind)) = (object, kind) else {
            return Err(StoreError::MalformedObject {
                id,
                reason: "tag is missing its object or type header".into(),
            });
        };
        Ok(Self {
            object,
            kind,
            name,
            headers: rest,
            message,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("object {}\ntype {}\n", self.object, self.kind);
        if !self.name.is_empty() {
            out.push_str(&format!("tag {}\n", self.name));
        }
        write_headers(&mut out, &self.headers);
        out.push('\n');
        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.message);
        bytes
    }

    /// Convert into an `Object` for storage.
    pub fn to_object(&self) -> Object {
        Object::new(ObjectKind::Tag, self.to_bytes())
    }

    /// Decode from an `Object`.
    pub fn from_object(obj: &Object) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tag)?;
        Self::parse(obj.id(), &obj.data)
    }
}
