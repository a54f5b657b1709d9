use std::io::{Read, Write};
use std::sync::Arc;

use odb_types::{ObjectId, ObjectKind, ObjectPrefix};

use crate::cat::copy_payload;
use crate::config::ResolverConfig;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::object::Object;

/// A single-use payload stream returned by [`Repository::open_object`].
///
/// Dropping the reader releases whatever it holds, whether or not it was
/// read to the end.
pub type ObjectReader<'a> = Box<dyn Read + Send + 'a>;

/// A source of content-addressed objects.
///
/// All implementations must satisfy these invariants:
/// - `open_object` returns the header immediately and a stream yielding
///   exactly `prefix.size` bytes.
/// - If the caller reads the stream to its end, the bytes are certified to
///   hash to the requested id. Sources that cannot verify incrementally must
///   buffer and verify before returning.
/// - A missing id is [`StoreError::NotFound`]; content that does not hash to
///   its id is [`StoreError::Corrupted`].
/// - Calls observe the [`Context`] and abort with [`StoreError::Cancelled`].
pub trait Repository: Send + Sync {
    /// Open an object for reading.
    fn open_object(
        &self,
        ctx: &Context,
        id: &ObjectId,
    ) -> StoreResult<(ObjectPrefix, ObjectReader<'_>)>;

    /// Read an object's header.
    ///
    /// Default implementation opens the object and discards the stream.
    /// Backends that can answer without touching the payload should override.
    fn stat(&self, ctx: &Context, id: &ObjectId) -> StoreResult<ObjectPrefix> {
        let (prefix, _reader) = self.open_object(ctx, id)?;
        Ok(prefix)
    }

    /// The fused dereference capability, if this repository has one.
    ///
    /// Callers that need coercion should go through
    /// [`dereference`](crate::cat::dereference), which consults this first.
    fn as_dereferencer(&self) -> Option<&dyn Dereferencer> {
        None
    }

    /// Read a whole object into memory.
    fn read_object(&self, ctx: &Context, id: &ObjectId) -> StoreResult<Object> {
        let (prefix, mut reader) = self.open_object(ctx, id)?;
        let mut data = Vec::new();
        copy_payload(
            ctx,
            &mut reader,
            &mut data,
            prefix.size,
            ResolverConfig::default().copy_chunk_size,
        )?;
        Ok(Object::new(prefix.kind, data))
    }

    /// Check whether an object exists.
    ///
    /// Corruption and cancellation are reported as errors, not as absence.
    fn exists(&self, ctx: &Context, id: &ObjectId) -> StoreResult<bool> {
        match self.stat(ctx, id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A repository that can coerce objects to a requested kind on its own.
///
/// Output must be identical to the generic algorithm in
/// [`resolve`](crate::cat::resolve): copy the payload of the first object of
/// kind `want` reached from `id` by following commit-to-tree and tag-to-target
/// hops.
pub trait Dereferencer: Send + Sync {
    fn cat(
        &self,
        ctx: &Context,
        dst: &mut dyn Write,
        want: ObjectKind,
        id: &ObjectId,
    ) -> StoreResult<()>;
}

impl<R: Repository + ?Sized> Repository for &R {
    fn open_object(
        &self,
        ctx: &Context,
        id: &ObjectId,
    ) -> StoreResult<(ObjectPrefix, ObjectReader<'_>)> {
        (**self).open_object(ctx, id)
    }

    fn stat(&self, ctx: &Context, id: &ObjectId) -> StoreResult<ObjectPrefix> {
        (**self).stat(ctx, id)
    }

    fn as_dereferencer(&self) -> Option<&dyn Dereferencer> {
        (**self).as_dereferencer()
    }
}

impl<R: Repository + ?Sized> Repository for Arc<R> {
    fn open_object(
        &self,
        ctx: &Context,
        id: &ObjectId,
    ) -> StoreResult<(ObjectPrefix, ObjectReader<'_>)> {
        (**self).open_object(ctx, id)
    }

    fn stat(&self, ctx: &Context, id: &ObjectId) -> StoreResult<ObjectPrefix> {
        (**self).stat(ctx, id)
    }

    fn as_dereferencer(&self) -> Option<&dyn Dereferencer> {
        (**self).as_dereferencer()
    }
}

impl<D: Dereferencer + ?Sized> Dereferencer for &D {
    fn cat(
        &self,
        ctx: &Context,
        dst: &mut dyn Write,
        want: ObjectKind,
        id: &ObjectId,
    ) -> StoreResult<()> {
        (**self).cat(ctx, dst, want, id)
    }
}
