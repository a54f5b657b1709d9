//! Coercing objects to a requested kind.
//!
//! Tags and commits are pointers with metadata. When a caller asks for a
//! tree but holds a commit, or asks for anything but holds a tag, the
//! resolver follows exactly two kinds of hop and nothing else:
//!
//! - commit -> its tree, when a tree is wanted
//! - tag -> its declared target, when that target is the wanted kind or a
//!   commit standing in for a wanted tree
//!
//! Every other shape is an error.

use std::io::{ErrorKind, Read, Write};

use odb_types::{ObjectId, ObjectKind};
use tracing::trace;

use crate::config::ResolverConfig;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, Tag};
use crate::traits::{Dereferencer, Repository};

/// Copy exactly `size` bytes from `src` to `dst`, polling `ctx` between chunks.
///
/// Fails with [`StoreError::Truncated`] if `src` ends early.
pub fn copy_payload(
    ctx: &Context,
    src: &mut dyn Read,
    dst: &mut dyn Write,
    size: usize,
    chunk_size: usize,
) -> StoreResult<()> {
    let mut buf = vec![0u8; chunk_size.min(size).max(1)];
    let mut copied = 0;
    while copied < size {
        ctx.check()?;
        let want = buf.len().min(size - copied);
        let n = match src.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(StoreError::Truncated {
                    expected: size,
                    actual: copied,
                })
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        dst.write_all(&buf[..n])?;
        copied += n;
    }
    Ok(())
}

/// Copy the payload of the first object of kind `want` reachable from `id`
/// into `dst`, using only [`Repository::open_object`].
///
/// Intermediate commit and tag payloads are parsed out of one reusable
/// buffer; the final payload is streamed straight to `dst`. The walk stops
/// after `config.max_hops` hops.
pub fn resolve<R: Repository + ?Sized>(
    repo: &R,
    ctx: &Context,
    dst: &mut dyn Write,
    want: ObjectKind,
    id: &ObjectId,
    config: &ResolverConfig,
) -> StoreResult<()> {
    let mut current = *id;
    let mut next_kind: Option<ObjectKind> = None;
    let mut buf = Vec::new();

    for hop in 0..=config.max_hops {
        ctx.check()?;
        let (prefix, mut reader) = repo.open_object(ctx, &current)?;
        trace!(hop, id = %current.short_hex(), kind = %prefix.kind, want = %want, "dereference hop");

        if prefix.kind == want {
            return copy_payload(ctx, &mut reader, dst, prefix.size, config.copy_chunk_size);
        }
        if let Some(declared) = next_kind {
            if prefix.kind != declared {
                return Err(StoreError::TypeMismatch {
                    id: current,
                    declared,
                    found: prefix.kind,
                });
            }
        }

        match prefix.kind {
            ObjectKind::Commit if want == ObjectKind::Tree => {
                buf.clear();
                copy_payload(ctx, &mut reader, &mut buf, prefix.size, config.copy_chunk_size)?;
                let commit = Commit::parse(current, &buf)?;
                current = commit.tree;
                next_kind = Some(ObjectKind::Tree);
            }
            ObjectKind::Tag => {
                buf.clear();
                copy_payload(ctx, &mut reader, &mut buf, prefix.size, config.copy_chunk_size)?;
                let tag = Tag::parse(current, &buf)?;
                let reachable = tag.kind == want
                    || (tag.kind == ObjectKind::Commit && want == ObjectKind::Tree);
                if !reachable {
                    return Err(StoreError::UnsupportedReference {
                        id: current,
                        target: tag.kind,
                        wanted: want,
                    });
                }
                current = tag.object;
                next_kind = Some(tag.kind);
            }
            found => {
                return Err(StoreError::UnexpectedKind {
                    id: current,
                    found,
                    wanted: want,
                })
            }
        }
    }

    Err(StoreError::DereferenceDepthExceeded {
        id: *id,
        limit: config.max_hops,
    })
}

/// Coerce `id` to `want`, preferring the repository's own fused
/// [`Dereferencer`] and falling back to [`resolve`] with `config`.
///
/// A fused implementation applies its own limits; `config` only governs the
/// fallback walk.
pub fn dereference<R: Repository + ?Sized>(
    repo: &R,
    ctx: &Context,
    dst: &mut dyn Write,
    want: ObjectKind,
    id: &ObjectId,
    config: &ResolverConfig,
) -> StoreResult<()> {
    match repo.as_dereferencer() {
        Some(direct) => direct.cat(ctx, dst, want, id),
        None => resolve(repo, ctx, dst, want, id, config),
    }
}

/// Adapts any [`Repository`] into a [`Dereferencer`] backed by [`resolve`].
#[derive(Clone, Debug)]
pub struct Cat<R> {
    repo: R,
    config: ResolverConfig,
}

impl<R: Repository> Cat<R> {
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, ResolverConfig::default())
    }

    pub fn with_config(repo: R, config: ResolverConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_inner(self) -> R {
        self.repo
    }
}

impl<R: Repository> Dereferencer for Cat<R> {
    fn cat(
        &self,
        ctx: &Context,
        dst: &mut dyn Write,
        want: ObjectKind,
        id: &ObjectId,
    ) -> StoreResult<()> {
        resolve(&self.repo, ctx, dst, want, id, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use odb_types::ObjectPrefix;

    use super::*;
    use crate::memory::Map;
    use crate::object::{EntryMode, Object, Tree, TreeEntry};
    use crate::traits::ObjectReader;

    /// Forwards `open_object` only, hiding the inner store's fused path.
    struct StreamOnly<'a> {
        inner: &'a Map,
        opens: AtomicUsize,
    }

    impl<'a> StreamOnly<'a> {
        fn new(inner: &'a Map) -> Self {
            Self {
                inner,
                opens: AtomicUsize::new(0),
            }
        }
    }

    impl Repository for StreamOnly<'_> {
        fn open_object(
            &self,
            ctx: &Context,
            id: &ObjectId,
        ) -> StoreResult<(ObjectPrefix, ObjectReader<'_>)> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.inner.open_object(ctx, id)
        }
    }

    /// Answers every id with the same tag, which claims to point at a commit
    /// but points back at itself.
    struct SelfTagging {
        payload: Vec<u8>,
    }

    impl SelfTagging {
        fn new() -> Self {
            let tag = Tag::new(ObjectId::from_hash([0x11; 20]), ObjectKind::Commit, "loop", "");
            Self {
                payload: tag.to_bytes(),
            }
        }
    }

    impl Repository for SelfTagging {
        fn open_object(
            &self,
            _ctx: &Context,
            _id: &ObjectId,
        ) -> StoreResult<(ObjectPrefix, ObjectReader<'_>)> {
            let prefix = ObjectPrefix::for_payload(ObjectKind::Tag, &self.payload);
            Ok((prefix, Box::new(Cursor::new(self.payload.clone()))))
        }
    }

    /// Fixture: blob <- tree <- commit <- tag.
    struct Chain {
        blob: ObjectId,
        tree: ObjectId,
        tree_bytes: Vec<u8>,
        commit: ObjectId,
        tag: ObjectId,
    }

    fn build_chain(store: &Map) -> Chain {
        let blob = store.add(Object::blob("Hello, World!\n"));
        let tree = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "hello.txt", blob)]);
        let tree_bytes = tree.to_bytes();
        let tree = store.add(tree.to_object());
        let commit = store.add(Commit::new(tree, "initial\n").to_object());
        let tag = store.add(Tag::new(commit, ObjectKind::Commit, "v1", "first\n").to_object());
        Chain {
            blob,
            tree,
            tree_bytes,
            commit,
            tag,
        }
    }

    fn resolve_to_vec<R: Repository>(
        repo: &R,
        want: ObjectKind,
        id: &ObjectId,
    ) -> StoreResult<Vec<u8>> {
        let mut out = Vec::new();
        resolve(
            repo,
            &Context::background(),
            &mut out,
            want,
            id,
            &ResolverConfig::default(),
        )?;
        Ok(out)
    }

    #[test]
    fn same_kind_copies_payload() {
        let store = Map::new();
        let chain = build_chain(&store);
        assert_eq!(
            resolve_to_vec(&store, ObjectKind::Blob, &chain.blob).unwrap(),
            b"Hello, World!\n"
        );
    }

    #[test]
    fn commit_to_tree() {
        let store = Map::new();
        let chain = build_chain(&store);
        assert_eq!(
            resolve_to_vec(&store, ObjectKind::Tree, &chain.commit).unwrap(),
            chain.tree_bytes
        );
    }

    #[test]
    fn tag_to_declared_kind() {
        let store = Map::new();
        let chain = build_chain(&store);
        let expected = store.get(&chain.commit).unwrap().data;
        assert_eq!(
            resolve_to_vec(&store, ObjectKind::Commit, &chain.tag).unwrap(),
            expected
        );
    }

    #[test]
    fn tag_to_commit_to_tree() {
        let store = Map::new();
        let chain = build_chain(&store);
        let repo = StreamOnly::new(&store);
        assert_eq!(
            resolve_to_vec(&repo, ObjectKind::Tree, &chain.tag).unwrap(),
            chain.tree_bytes
        );
        assert_eq!(repo.opens.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tree_cannot_become_blob() {
        let store = Map::new();
        let chain = build_chain(&store);
        let err = resolve_to_vec(&store, ObjectKind::Blob, &chain.tree).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnexpectedKind {
                found: ObjectKind::Tree,
                wanted: ObjectKind::Blob,
                ..
            }
        ));
    }

    #[test]
    fn blob_cannot_become_tree() {
        let store = Map::new();
        let chain = build_chain(&store);
        let err = resolve_to_vec(&store, ObjectKind::Tree, &chain.blob).unwrap_err();
        match err {
            StoreError::UnexpectedKind { id, found, wanted } => {
                assert_eq!(id, chain.blob);
                assert_eq!(found, ObjectKind::Blob);
                assert_eq!(wanted, ObjectKind::Tree);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn commit_cannot_become_blob() {
        let store = Map::new();
        let chain = build_chain(&store);
        assert!(matches!(
            resolve_to_vec(&store, ObjectKind::Blob, &chain.commit),
            Err(StoreError::UnexpectedKind {
                found: ObjectKind::Commit,
                ..
            })
        ));
    }

    #[test]
    fn tag_of_commit_cannot_become_blob() {
        let store = Map::new();
        let chain = build_chain(&store);
        let err = resolve_to_vec(&store, ObjectKind::Blob, &chain.tag).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedReference {
                target: ObjectKind::Commit,
                wanted: ObjectKind::Blob,
                ..
            }
        ));
    }

    #[test]
    fn tag_of_tag_only_resolves_to_tag() {
        let store = Map::new();
        let chain = build_chain(&store);
        let outer = store.add(Tag::new(chain.tag, ObjectKind::Tag, "outer", "").to_object());
        assert!(matches!(
            resolve_to_vec(&store, ObjectKind::Tree, &outer),
            Err(StoreError::UnsupportedReference {
                target: ObjectKind::Tag,
                ..
            })
        ));
        // Asking for a tag returns the outer tag itself.
        let outer_bytes = store.get(&outer).unwrap().data;
        assert_eq!(
            resolve_to_vec(&store, ObjectKind::Tag, &outer).unwrap(),
            outer_bytes
        );
    }

    #[test]
    fn lying_tag_is_type_mismatch() {
        let store = Map::new();
        let chain = build_chain(&store);
        // Declares a commit but points at a blob.
        let liar = store.add(Tag::new(chain.blob, ObjectKind::Commit, "liar", "").to_object());
        let err = resolve_to_vec(&store, ObjectKind::Tree, &liar).unwrap_err();
        match err {
            StoreError::TypeMismatch {
                id,
                declared,
                found,
            } => {
                assert_eq!(id, chain.blob);
                assert_eq!(declared, ObjectKind::Commit);
                assert_eq!(found, ObjectKind::Blob);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_target_is_not_found() {
        let store = Map::new();
        let ghost = ObjectId::from_hash([0xee; 20]);
        let tag = store.add(Tag::new(ghost, ObjectKind::Blob, "ghost", "").to_object());
        assert!(matches!(
            resolve_to_vec(&store, ObjectKind::Blob, &tag),
            Err(StoreError::NotFound(id)) if id == ghost
        ));
    }

    #[test]
    fn malformed_commit_is_reported() {
        let store = Map::new();
        let bad = store.add(Object::new(ObjectKind::Commit, b"not a commit".to_vec()));
        assert!(matches!(
            resolve_to_vec(&store, ObjectKind::Tree, &bad),
            Err(StoreError::MalformedObject { id, .. }) if id == bad
        ));
    }

    #[test]
    fn self_referential_tag_cannot_loop() {
        let repo = SelfTagging::new();
        let start = ObjectId::from_hash([0x11; 20]);
        let mut out = Vec::new();
        let err = resolve(
            &repo,
            &Context::background(),
            &mut out,
            ObjectKind::Tree,
            &start,
            &ResolverConfig::default(),
        )
        .unwrap_err();
        // The second hop finds a tag where a commit was declared.
        assert!(matches!(
            err,
            StoreError::TypeMismatch {
                declared: ObjectKind::Commit,
                found: ObjectKind::Tag,
                ..
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn long_chain_exceeds_hop_limit() {
        let store = Map::new();
        let chain = build_chain(&store);
        let config = ResolverConfig {
            max_hops: 1,
            ..ResolverConfig::default()
        };
        let mut out = Vec::new();
        let err = resolve(
            &store,
            &Context::background(),
            &mut out,
            ObjectKind::Tree,
            &chain.tag,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DereferenceDepthExceeded { limit: 1, id } if id == chain.tag
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn cancelled_context_stops_walk() {
        let store = Map::new();
        let chain = build_chain(&store);
        let ctx = Context::background();
        ctx.cancel();
        let mut out = Vec::new();
        let err = resolve(
            &store,
            &ctx,
            &mut out,
            ObjectKind::Tree,
            &chain.tag,
            &ResolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }

    #[test]
    fn generic_and_fused_paths_agree() {
        let store = Map::new();
        let chain = build_chain(&store);
        let generic = Cat::new(StreamOnly::new(&store));
        let ctx = Context::background();

        let cases = [
            (ObjectKind::Blob, chain.blob),
            (ObjectKind::Tree, chain.tree),
            (ObjectKind::Tree, chain.commit),
            (ObjectKind::Tree, chain.tag),
            (ObjectKind::Commit, chain.tag),
            (ObjectKind::Blob, chain.tag),
            (ObjectKind::Blob, chain.tree),
        ];
        for (want, id) in cases {
            let mut fused = Vec::new();
            let mut fallback = Vec::new();
            let a = dereference(&store, &ctx, &mut fused, want, &id, &ResolverConfig::default());
            let b = generic.cat(&ctx, &mut fallback, want, &id);
            assert_eq!(a.is_ok(), b.is_ok(), "{want} from {id}");
            if let (Err(a), Err(b)) = (&a, &b) {
                assert_eq!(a.to_string(), b.to_string());
            }
            assert_eq!(fused, fallback);
        }
    }

    #[test]
    fn dereference_falls_back_without_capability() {
        let store = Map::new();
        let chain = build_chain(&store);
        let repo = StreamOnly::new(&store);
        assert!(repo.as_dereferencer().is_none());
        let mut out = Vec::new();
        dereference(
            &repo,
            &Context::background(),
            &mut out,
            ObjectKind::Tree,
            &chain.commit,
            &ResolverConfig::default(),
        )
        .unwrap();
        assert_eq!(out, chain.tree_bytes);
        assert_eq!(repo.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dereference_fallback_uses_given_config() {
        let store = Map::new();
        let chain = build_chain(&store);
        let repo = StreamOnly::new(&store);
        let config = ResolverConfig {
            max_hops: 1,
            ..ResolverConfig::default()
        };
        let mut out = Vec::new();
        let err = dereference(
            &repo,
            &Context::background(),
            &mut out,
            ObjectKind::Tree,
            &chain.tag,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DereferenceDepthExceeded { limit: 1, .. }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn commit_with_latin1_message_resolves_to_tree() {
        let store = Map::new();
        let tree = store.add(Tree::empty().to_object());
        let mut data = format!(
            "tree {tree}\nauthor A U Thor <a@example.com> 0 +0000\n\
             committer A U Thor <a@example.com> 0 +0000\nencoding ISO-8859-1\n\n"
        )
        .into_bytes();
        data.extend_from_slice(b"caf\xe9\n");
        let commit = store.add(Object::new(ObjectKind::Commit, data));

        assert!(resolve_to_vec(&store, ObjectKind::Tree, &commit)
            .unwrap()
            .is_empty());
        let mut fused = vec![0xaa];
        store
            .cat(&Context::background(), &mut fused, ObjectKind::Tree, &commit)
            .unwrap();
        assert_eq!(fused, [0xaa]);
    }

    #[test]
    fn copy_payload_detects_short_source() {
        let mut src = Cursor::new(b"abc".to_vec());
        let mut dst = Vec::new();
        let err = copy_payload(&Context::background(), &mut src, &mut dst, 5, 2).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Truncated {
                expected: 5,
                actual: 3
            }
        ));
    }

    #[test]
    fn copy_payload_stops_at_declared_size() {
        let mut src = Cursor::new(b"abcdef".to_vec());
        let mut dst = Vec::new();
        copy_payload(&Context::background(), &mut src, &mut dst, 4, 3).unwrap();
        assert_eq!(dst, b"abcd");
    }

    #[test]
    fn copy_payload_observes_cancellation_between_chunks() {
        struct CancelAfterFirstRead {
            ctx: Context,
            inner: Cursor<Vec<u8>>,
        }
        impl Read for CancelAfterFirstRead {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                self.ctx.cancel();
                self.inner.read(buf)
            }
        }

        let ctx = Context::background();
        let mut src = CancelAfterFirstRead {
            ctx: ctx.clone(),
            inner: Cursor::new(vec![7u8; 1024]),
        };
        let mut dst = Vec::new();
        let err = copy_payload(&ctx, &mut src, &mut dst, 1024, 16).unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
        assert_eq!(dst.len(), 16);
    }
}
