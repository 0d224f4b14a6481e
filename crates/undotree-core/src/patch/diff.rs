use dissimilar::Chunk;
use undotree_http::{Patch, Segment};

/// Compute the patch turning `old` into `new`.
///
/// Returns an empty patch when the texts are equal.
pub fn diff(old: &str, new: &str) -> Patch {
    if old == new {
        return Patch::default();
    }

    let mut segments = Vec::new();
    let mut old_pos = 0;
    let mut new_pos = 0;

    for chunk in dissimilar::diff(old, new) {
        match chunk {
            Chunk::Equal(text) => {
                let len = text.chars().count();
                if len == 0 {
                    continue;
                }
                segments.push(Segment::Equal {
                    old_start: old_pos,
                    new_start: new_pos,
                    len,
                });
                old_pos += len;
                new_pos += len;
            }
            Chunk::Delete(text) => {
                if text.is_empty() {
                    continue;
                }
                segments.push(Segment::Delete {
                    old_start: old_pos,
                    new_start: new_pos,
                    text: text.to_string(),
                });
                old_pos += text.chars().count();
            }
            Chunk::Insert(text) => {
                if text.is_empty() {
                    continue;
                }
                segments.push(Segment::Insert {
                    old_start: old_pos,
                    new_start: new_pos,
                    text: text.to_string(),
                });
                new_pos += text.chars().count();
            }
        }
    }

    Patch::new(segments)
}
