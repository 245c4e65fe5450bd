use std::{
    collections::HashMap,
    fmt,
    ops::{Index, IndexMut},
};

use super::view::clamp_range;
use crate::{Result, SeqView, TagData, TagSeqError, TagValue};

/// Tag holding the record identifier.
pub const ID_TAG: &str = "_id";
/// Tag holding the record description (the header comment).
pub const DESC_TAG: &str = "_desc";
/// Tag holding the quality string, one code per residue.
pub const QUALITY_TAG: &str = "_qs";

/// Residue used by [`Sequence::with_len`].
pub const DEFAULT_FILL: u8 = b'A';

type TagMap = HashMap<String, TagValue>;

/// A residue sequence with an open-ended set of tagged values.
///
/// Residues are single bytes without any alphabet validation. Tags map a
/// name to a [`TagValue`] of arbitrary type; the map is only allocated on
/// the first tag write, so untagged sequences carry no map storage.
///
/// Equality compares residues only, never tags.
///
/// # Examples
///
/// ```rust
/// use tagseq::Sequence;
///
/// let mut seq = Sequence::from("ACGT");
/// seq.tag_mut("test").set(33);
///
/// let copy = seq.clone();
/// assert_eq!(copy, "ACGT");
/// assert_eq!(copy.tag::<i32>("test").unwrap(), &33);
///
/// // Moving out leaves an empty sequence behind
/// let moved = std::mem::take(&mut seq);
/// assert!(seq.is_empty());
/// assert!(moved.has("test"));
/// ```
#[derive(Clone, Default)]
pub struct Sequence {
    /// Residue buffer
    residues: Vec<u8>,

    /// Lazily allocated tag map
    tags: Option<Box<TagMap>>,
}

impl Sequence {
    /// Creates an empty, untagged sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `count` copies of `fill`.
    pub fn filled(count: usize, fill: u8) -> Self {
        Self::from(vec![fill; count])
    }

    /// Creates `count` copies of [`DEFAULT_FILL`].
    pub fn with_len(count: usize) -> Self {
        Self::filled(count, DEFAULT_FILL)
    }

    /// Number of residues.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// True when there are no residues and no tags.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty() && self.tags.as_ref().map_or(true, |tags| tags.is_empty())
    }

    /// Residues as a byte slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::Sequence;
    ///
    /// let seq = Sequence::filled(3, b'N');
    /// assert_eq!(seq.as_bytes(), b"NNN");
    /// ```
    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }

    /// Residues as a mutable byte slice; the length cannot change.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.residues
    }

    /// Consumes the sequence, dropping its tags, and returns the residues.
    pub fn into_bytes(self) -> Vec<u8> {
        self.residues
    }

    /// Checked access to the residue at `pos`.
    pub fn get(&self, pos: usize) -> Option<&u8> {
        self.residues.get(pos)
    }

    /// Checked mutable access to the residue at `pos`.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut u8> {
        self.residues.get_mut(pos)
    }

    /// Iterates over the residues in order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::Sequence;
    ///
    /// let seq = Sequence::from("GATC");
    /// let gc = seq.iter().filter(|&&b| b == b'G' || b == b'C').count();
    /// assert_eq!(gc, 2);
    /// ```
    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.residues.iter()
    }

    /// Iterates mutably over the residues.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, u8> {
        self.residues.iter_mut()
    }

    /// Appends one residue; tags are left untouched.
    pub fn push(&mut self, residue: u8) {
        self.residues.push(residue);
    }

    /// Borrows the residues as a [`SeqView`].
    pub fn view(&self) -> SeqView<'_> {
        SeqView::new(&self.residues)
    }

    /// Copies the residues in `[pos, pos + count)` into a new, untagged sequence.
    ///
    /// `None` (or a count past the end) extends to the last residue.
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::Range`] when `pos > len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::Sequence;
    ///
    /// let seq = Sequence::from("CCATACGTGAC");
    /// assert_eq!(seq.subseq(4, Some(4)).unwrap(), "ACGT");
    /// assert_eq!(seq.subseq(4, None).unwrap(), "ACGTGAC");
    /// assert!(seq.subseq(20, None).is_err());
    /// ```
    pub fn subseq(&self, pos: usize, count: Option<usize>) -> Result<Sequence> {
        let (start, end) = clamp_range(pos, count, self.len())?;
        Ok(Self::from(&self.residues[start..end]))
    }

    // -- tagged data ----------------------------------------------------------

    /// Whether `tag` is present, whatever its value (void included).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::Sequence;
    ///
    /// let mut seq = Sequence::from("ACGT");
    /// assert!(!seq.has("_id"));
    /// seq.tag_mut("_id");
    /// assert!(seq.has("_id"));
    /// assert!(seq.get_tag("_id").unwrap().is_void());
    /// ```
    pub fn has(&self, tag: &str) -> bool {
        self.tags.as_ref().is_some_and(|tags| tags.contains_key(tag))
    }

    /// Returns the value of `tag`, inserting a void value if it is missing.
    pub fn tag_mut(&mut self, tag: &str) -> &mut TagValue {
        self.tags
            .get_or_insert_with(Default::default)
            .entry(tag.to_string())
            .or_default()
    }

    /// Read-only access to the value of `tag`.
    pub fn get_tag(&self, tag: &str) -> Result<&TagValue> {
        self.tags
            .as_ref()
            .and_then(|tags| tags.get(tag))
            .ok_or_else(|| TagSeqError::TagNotFound(tag.to_string()))
    }

    /// Typed read-only access to the value of `tag`.
    pub fn tag<T: TagData>(&self, tag: &str) -> Result<&T> {
        self.get_tag(tag)?
            .downcast_ref::<T>()
            .ok_or_else(|| TagSeqError::TagType {
                tag: tag.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Sets `tag`, replacing any previous value.
    pub fn set_tag(&mut self, tag: &str, value: impl Into<TagValue>) {
        *self.tag_mut(tag) = value.into();
    }

    /// Removes `tag` and returns its value, if it was present.
    ///
    /// The tag map itself is kept; see [`Sequence::clear_tags`].
    pub fn remove_tag(&mut self, tag: &str) -> Option<TagValue> {
        self.tags.as_mut().and_then(|tags| tags.remove(tag))
    }

    /// Drops every tag and releases the tag map.
    pub fn clear_tags(&mut self) {
        self.tags = None;
    }

    /// Iterates over `(name, value)` pairs in unspecified order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.tags
            .iter()
            .flat_map(|tags| tags.iter())
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of tags present.
    pub fn tag_count(&self) -> usize {
        self.tags.as_ref().map_or(0, |tags| tags.len())
    }

    /// Rough estimate of the heap and inline bytes used by this sequence.
    ///
    /// Tagged values are counted by their shallow size only.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>() + self.residues.capacity();
        if let Some(tags) = &self.tags {
            bytes += std::mem::size_of::<TagMap>();
            for (name, value) in tags.iter() {
                bytes += name.capacity() + std::mem::size_of::<TagValue>() + value.payload_size();
            }
        }
        bytes
    }
}

impl Index<usize> for Sequence {
    type Output = u8;

    /// Panics when `pos >= len()`, like slice indexing. Use
    /// [`Sequence::get`] for checked access.
    fn index(&self, pos: usize) -> &u8 {
        &self.residues[pos]
    }
}

impl IndexMut<usize> for Sequence {
    fn index_mut(&mut self, pos: usize) -> &mut u8 {
        &mut self.residues[pos]
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("residues", &String::from_utf8_lossy(&self.residues))
            .field("tags", &self.tags.as_deref())
            .finish()
    }
}

// -- construction -------------------------------------------------------------

impl From<Vec<u8>> for Sequence {
    fn from(residues: Vec<u8>) -> Self {
        Self {
            residues,
            tags: None,
        }
    }
}

impl From<&[u8]> for Sequence {
    fn from(residues: &[u8]) -> Self {
        Self::from(residues.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Sequence {
    fn from(residues: &[u8; N]) -> Self {
        Self::from(residues.to_vec())
    }
}

impl From<&str> for Sequence {
    fn from(residues: &str) -> Self {
        Self::from(residues.as_bytes())
    }
}

impl From<String> for Sequence {
    fn from(residues: String) -> Self {
        Self::from(residues.into_bytes())
    }
}

impl FromIterator<u8> for Sequence {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<u8>>())
    }
}

impl<'a> FromIterator<&'a u8> for Sequence {
    fn from_iter<I: IntoIterator<Item = &'a u8>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

impl Extend<u8> for Sequence {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        self.residues.extend(iter);
    }
}

impl IntoIterator for Sequence {
    type Item = u8;
    type IntoIter = std::vec::IntoIter<u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.residues.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.residues.iter()
    }
}

impl<'a> IntoIterator for &'a mut Sequence {
    type Item = &'a mut u8;
    type IntoIter = std::slice::IterMut<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.residues.iter_mut()
    }
}

// -- comparison ---------------------------------------------------------------

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.residues == other.residues
    }
}

impl Eq for Sequence {}

impl PartialEq<str> for Sequence {
    fn eq(&self, other: &str) -> bool {
        self.residues == other.as_bytes()
    }
}

impl PartialEq<&str> for Sequence {
    fn eq(&self, other: &&str) -> bool {
        self.residues == other.as_bytes()
    }
}

impl PartialEq<[u8]> for Sequence {
    fn eq(&self, other: &[u8]) -> bool {
        self.residues == other
    }
}

impl PartialEq<&[u8]> for Sequence {
    fn eq(&self, other: &&[u8]) -> bool {
        self.residues == *other
    }
}

impl PartialEq<SeqView<'_>> for Sequence {
    fn eq(&self, other: &SeqView<'_>) -> bool {
        self.residues == other.as_bytes()
    }
}
