use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::{PoisonError, RwLock};

use odb_types::{ObjectId, ObjectKind, ObjectPrefix};
use tracing::{debug, warn};

use crate::cat::{copy_payload, resolve};
use crate::config::ResolverConfig;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::object::Object;
use crate::traits::{Dereferencer, ObjectReader, Repository};

/// In-memory, HashMap-based object repository.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock`: reads share the lock, [`add`](Self::add) takes it exclusively.
/// Every write path funnels through `add`, which computes the key from the
/// content, so an object can only ever be stored under its own id.
pub struct Map {
    objects: RwLock<HashMap<ObjectId, Object>>,
    config: ResolverConfig,
}

impl Map {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a new empty store whose fused dereference uses `config`.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Insert an object under its computed id and return the id.
    ///
    /// Idempotent: re-adding identical content is a no-op.
    pub fn add(&self, object: Object) -> ObjectId {
        let id = object.id();
        let mut map = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(id).or_insert_with(|| {
            debug!(id = %id.short_hex(), kind = %object.kind, size = object.size(), "stored object");
            object
        });
        id
    }

    /// Read exactly `prefix.size` bytes from `src` and store them.
    ///
    /// The store is untouched if the source is short or the context is
    /// cancelled.
    pub fn write_object(
        &self,
        ctx: &Context,
        prefix: ObjectPrefix,
        src: &mut dyn Read,
    ) -> StoreResult<ObjectId> {
        let mut data = Vec::new();
        copy_payload(ctx, src, &mut data, prefix.size, self.config.copy_chunk_size)?;
        Ok(self.add(Object::new(prefix.kind, data)))
    }

    /// Like [`write_object`](Self::write_object), but validates an untrusted
    /// kind name and declared length first.
    pub fn write_raw(
        &self,
        ctx: &Context,
        kind: &str,
        size: i64,
        src: &mut dyn Read,
    ) -> StoreResult<ObjectId> {
        let kind: ObjectKind = kind.parse()?;
        let prefix = ObjectPrefix::new(kind, size)?;
        self.write_object(ctx, prefix, src)
    }

    /// Fetch a verified copy of an object.
    pub fn get(&self, id: &ObjectId) -> StoreResult<Object> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let object = map.get(id).ok_or(StoreError::NotFound(*id))?;
        let computed = object.id();
        if computed != *id {
            warn!(id = %id.short_hex(), computed = %computed.short_hex(), "corrupted object");
            return Err(StoreError::Corrupted { id: *id, computed });
        }
        Ok(object.clone())
    }

    /// Returns `true` if an entry exists under `id`, without verifying it.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total payload bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|obj| obj.size() as u64)
            .sum()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Store `object` under an arbitrary key, bypassing `add`.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&self, id: ObjectId, object: Object) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, object);
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for Map {
    fn open_object(
        &self,
        ctx: &Context,
        id: &ObjectId,
    ) -> StoreResult<(ObjectPrefix, ObjectReader<'_>)> {
        ctx.check()?;
        let object = self.get(id)?;
        Ok((object.prefix(), Box::new(Cursor::new(object.data))))
    }

    fn stat(&self, ctx: &Context, id: &ObjectId) -> StoreResult<ObjectPrefix> {
        ctx.check()?;
        Ok(self.get(id)?.prefix())
    }

    fn as_dereferencer(&self) -> Option<&dyn Dereferencer> {
        Some(self)
    }
}

impl Dereferencer for Map {
    fn cat(
        &self,
        ctx: &Context,
        dst: &mut dyn Write,
        want: ObjectKind,
        id: &ObjectId,
    ) -> StoreResult<()> {
        resolve(self, ctx, dst, want, id, &self.config)
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("Map")
            .field("object_count", &count)
            .finish()
    }
}
