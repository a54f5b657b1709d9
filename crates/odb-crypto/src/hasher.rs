use odb_types::{ObjectId, ObjectKind, ObjectPrefix};
use sha1::{Digest, Sha1};

/// Incremental SHA-1 hasher over an object's canonical serialization.
///
/// The header is fed on construction; callers then stream the payload
/// through [`update`](Self::update). [`finalize`](Self::finalize) only
/// succeeds when exactly `prefix.size` payload bytes were fed.
#[derive(Clone)]
pub struct ObjectHasher {
    inner: Sha1,
    prefix: ObjectPrefix,
    written: usize,
}

impl ObjectHasher {
    /// Start hashing an object with the given header.
    pub fn new(prefix: ObjectPrefix) -> Self {
        let mut inner = Sha1::new();
        inner.update(prefix.to_header());
        Self {
            inner,
            prefix,
            written: 0,
        }
    }

    /// Feed the next chunk of payload.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.written += data.len();
    }

    /// The header this hasher was started with.
    pub fn prefix(&self) -> ObjectPrefix {
        self.prefix
    }

    /// Payload bytes fed so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Finish and return the object id.
    ///
    /// Returns `None` if the payload length disagrees with the header.
    pub fn finalize(self) -> Option<ObjectId> {
        if self.written != self.prefix.size {
            return None;
        }
        let digest = self.inner.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        Some(ObjectId::from_hash(out))
    }

    /// Hash a payload already held in memory.
    pub fn hash(kind: ObjectKind, data: &[u8]) -> ObjectId {
        let mut hasher = Self::new(ObjectPrefix::for_payload(kind, data));
        hasher.update(data);
        let digest = hasher.inner.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        ObjectId::from_hash(out)
    }

    /// Verify that `data` of the given kind hashes to `expected`.
    pub fn verify(kind: ObjectKind, data: &[u8], expected: &ObjectId) -> bool {
        Self::hash(kind, data) == *expected
    }

    /// Raw SHA-1 without any object header (for low-level use).
    pub fn raw_hash(data: &[u8]) -> [u8; 20] {
        let digest = Sha1::digest(data);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        out
    }
}
