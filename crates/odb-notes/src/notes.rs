//! Fanout-tree walk from a notes root to the note for one commit.

use std::io::Write;

use odb_store::{Context, Dereferencer, Tree};
use odb_types::{ObjectId, ObjectKind};
use tracing::debug;

use crate::error::{NotesError, Result};

/// Where a note was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteLocation {
    /// Path of the note within the notes tree, e.g. `ab/cdef...`.
    pub path: String,
    /// The note's blob.
    pub blob: ObjectId,
}

/// Locate the note for `commit` in the notes tree rooted at `notes_root`.
///
/// At each level the tree is searched for an entry named after the whole
/// remaining hex id; failing that, the next two hex characters name the
/// fanout directory to descend into. A missing fanout directory means there
/// is no note, which is `Ok(None)`, not an error.
///
/// `notes_root` may be a tree or anything that dereferences to one (a notes
/// commit, or a tag of one).
pub fn find_note<D: Dereferencer + ?Sized>(
    deref: &D,
    ctx: &Context,
    notes_root: &ObjectId,
    commit: &ObjectId,
) -> Result<Option<NoteLocation>> {
    let hex = commit.to_hex();
    let mut remaining = hex.as_str();
    let mut current = *notes_root;
    let mut path = String::new();
    let mut buf = Vec::new();

    loop {
        ctx.check()?;
        buf.clear();
        deref.cat(ctx, &mut buf, ObjectKind::Tree, &current)?;
        let tree = Tree::parse(current, &buf)?;

        if let Some(entry) = tree.get(remaining) {
            path.push_str(remaining);
            if !entry.mode.is_regular() {
                return Err(NotesError::NotARegularFile { path });
            }
            debug!(commit = %commit.short_hex(), path = %path, "found note");
            return Ok(Some(NoteLocation {
                path,
                blob: entry.object_id,
            }));
        }

        if remaining.len() < 2 {
            break;
        }
        let (segment, rest) = remaining.split_at(2);
        let Some(entry) = tree.get(segment) else {
            break;
        };
        path.push_str(segment);
        if !entry.mode.is_dir() {
            return Err(NotesError::NotADirectory { path });
        }
        path.push('/');
        current = entry.object_id;
        remaining = rest;
    }

    debug!(commit = %commit.short_hex(), searched = %path, "no note");
    Ok(None)
}

/// Copy the note for `commit` into `dst`.
///
/// Writes nothing and succeeds if the commit has no note.
pub fn notes_for_commit<D: Dereferencer + ?Sized>(
    deref: &D,
    ctx: &Context,
    dst: &mut dyn Write,
    notes_root: &ObjectId,
    commit: &ObjectId,
) -> Result<()> {
    if let Some(note) = find_note(deref, ctx, notes_root, commit)? {
        deref.cat(ctx, dst, ObjectKind::Blob, &note.blob)?;
    }
    Ok(())
}
