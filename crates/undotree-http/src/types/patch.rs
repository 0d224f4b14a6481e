//! Structured edit script between two text snapshots.
//!
//! Offsets and lengths count Unicode scalar values, never bytes.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};

/// One step of a patch, positioned in both the source and target texts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Segment {
    /// `len` characters carried over unchanged.
    Equal {
        old_start: usize,
        new_start: usize,
        len: usize,
    },
    /// `text` added at `new_start`; consumes nothing from the source.
    Insert {
        old_start: usize,
        new_start: usize,
        text: String,
    },
    /// `text` removed from `old_start`; produces nothing in the target.
    Delete {
        old_start: usize,
        new_start: usize,
        text: String,
    },
}

impl Segment {
    #[inline]
    #[must_use]
    pub fn old_start(&self) -> usize {
        match self {
            Segment::Equal { old_start, .. }
            | Segment::Insert { old_start, .. }
            | Segment::Delete { old_start, .. } => *old_start,
        }
    }

    #[inline]
    #[must_use]
    pub fn new_start(&self) -> usize {
        match self {
            Segment::Equal { new_start, .. }
            | Segment::Insert { new_start, .. }
            | Segment::Delete { new_start, .. } => *new_start,
        }
    }

    /// Span length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Segment::Equal { len, .. } => *len,
            Segment::Insert { text, .. } | Segment::Delete { text, .. } => text.chars().count(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Characters this segment consumes from the source text.
    #[must_use]
    pub fn old_len(&self) -> usize {
        match self {
            Segment::Insert { .. } => 0,
            _ => self.len(),
        }
    }

    /// Characters this segment produces in the target text.
    #[must_use]
    pub fn new_len(&self) -> usize {
        match self {
            Segment::Delete { .. } => 0,
            _ => self.len(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_edit(&self) -> bool {
        !matches!(self, Segment::Equal { .. })
    }
}

/// An ordered sequence of [`Segment`]s turning one snapshot into another.
///
/// A patch with no segments is the identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    segments: Vec<Segment>,
}

impl Patch {
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Patch { segments }
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    #[must_use]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// True when applying the patch cannot change anything.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.segments.iter().any(Segment::is_edit)
    }

    /// Length of the source text this patch expects. Saturates on
    /// malformed input.
    #[must_use]
    pub fn old_len(&self) -> usize {
        self.segments
            .iter()
            .fold(0, |total: usize, s| total.saturating_add(s.old_len()))
    }

    /// Length of the text this patch produces. Saturates on malformed input.
    #[must_use]
    pub fn new_len(&self) -> usize {
        self.segments
            .iter()
            .fold(0, |total: usize, s| total.saturating_add(s.new_len()))
    }

    /// Segments in application order.
    ///
    /// `(old_start, new_start)` strictly increases along any well-formed
    /// patch, so sorting on it recovers the order of a patch that was
    /// listed back to front.
    #[must_use]
    pub fn ordered(&self) -> Vec<&Segment> {
        let mut ordered: Vec<&Segment> = self.segments.iter().collect();
        ordered.sort_by_key(|s| (s.old_start(), s.new_start()));
        ordered
    }

    /// Canonical byte encoding.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Checks that segments are non-empty and tile both coordinate spaces
    /// without gaps or overlaps.
    pub fn validate(&self) -> Result<()> {
        let mut old_cursor: usize = 0;
        let mut new_cursor: usize = 0;
        for segment in self.ordered() {
            if segment.is_empty() {
                return Err(GraphError::Decode(format!(
                    "empty segment at old offset {}",
                    segment.old_start()
                )));
            }
            if segment.old_start() != old_cursor || segment.new_start() != new_cursor {
                return Err(GraphError::Decode(format!(
                    "segment at ({}, {}) does not continue from ({}, {})",
                    segment.old_start(),
                    segment.new_start(),
                    old_cursor,
                    new_cursor
                )));
            }
            match (
                old_cursor.checked_add(segment.old_len()),
                new_cursor.checked_add(segment.new_len()),
            ) {
                (Some(old), Some(new)) => {
                    old_cursor = old;
                    new_cursor = new;
                }
                _ => {
                    return Err(GraphError::Decode(format!(
                        "segment at ({}, {}) overflows the text length",
                        segment.old_start(),
                        segment.new_start()
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_world() -> Patch {
        Patch::new(vec![
            Segment::Equal {
                old_start: 0,
                new_start: 0,
                len: 5,
            },
            Segment::Insert {
                old_start: 5,
                new_start: 5,
                text: " world".into(),
            },
        ])
    }

    #[test]
    fn test_lengths() {
        let patch = hello_world();
        assert_eq!(patch.old_len(), 5);
        assert_eq!(patch.new_len(), 11);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_equal_only_patch_is_empty() {
        let patch = Patch::new(vec![Segment::Equal {
            old_start: 0,
            new_start: 0,
            len: 3,
        }]);
        assert!(patch.is_empty());
        assert!(Patch::default().is_empty());
    }

    #[test]
    fn test_encode_decode() {
        let patch = hello_world();
        let bytes = patch.encode().unwrap();
        assert_eq!(Patch::decode(&bytes).unwrap(), patch);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(hello_world()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[1]["op"], "insert");
        assert_eq!(json[1]["text"], " world");
    }

    #[test]
    fn test_segment_len_counts_chars() {
        let seg = Segment::Delete {
            old_start: 0,
            new_start: 0,
            text: "héllo".into(),
        };
        assert_eq!(seg.len(), 5);
        assert_eq!(seg.old_len(), 5);
        assert_eq!(seg.new_len(), 0);
    }

    #[test]
    fn test_validate_accepts_reversed_order() {
        let mut segments = hello_world().into_segments();
        segments.reverse();
        assert!(Patch::new(segments).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gap() {
        let patch = Patch::new(vec![
            Segment::Equal {
                old_start: 0,
                new_start: 0,
                len: 2,
            },
            Segment::Insert {
                old_start: 3,
                new_start: 2,
                text: "x".into(),
            },
        ]);
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_segment() {
        let patch = Patch::new(vec![Segment::Insert {
            old_start: 0,
            new_start: 0,
            text: String::new(),
        }]);
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflowing_lengths() {
        let patch = Patch::new(vec![
            Segment::Equal {
                old_start: 0,
                new_start: 0,
                len: usize::MAX,
            },
            Segment::Delete {
                old_start: usize::MAX,
                new_start: usize::MAX,
                text: "x".into(),
            },
        ]);
        assert!(matches!(patch.validate(), Err(GraphError::Decode(_))));
        assert_eq!(patch.old_len(), usize::MAX);
    }
}
