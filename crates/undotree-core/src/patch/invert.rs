use undotree_http::{Patch, Segment};

/// Derive the patch that undoes `patch`, without needing its target text.
///
/// Segment order is reversed, insertions and deletions trade places, and each
/// segment's source/target offsets are swapped.
pub fn invert(patch: &Patch) -> Patch {
    Patch::new(patch.segments().iter().rev().map(invert_segment).collect())
}

fn invert_segment(segment: &Segment) -> Segment {
    match segment.clone() {
        Segment::Equal {
            old_start,
            new_start,
            len,
        } => Segment::Equal {
            old_start: new_start,
            new_start: old_start,
            len,
        },
        Segment::Insert {
            old_start,
            new_start,
            text,
        } => Segment::Delete {
            old_start: new_start,
            new_start: old_start,
            text,
        },
        Segment::Delete {
            old_start,
            new_start,
            text,
        } => Segment::Insert {
            old_start: new_start,
            new_start: old_start,
            text,
        },
    }
}
