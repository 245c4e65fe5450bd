use std::{fmt, ops::Index};

use crate::{Result, Sequence, TagSeqError};

/// A non-owning window over the residues of a [`Sequence`].
///
/// The view borrows the residues, so the owning sequence cannot be mutated
/// or dropped while the view is alive. Use [`SeqView::to_sequence`] for an
/// independently owned copy.
///
/// # Examples
///
/// ```rust
/// use tagseq::Sequence;
///
/// let seq = Sequence::from("CCATACGTGAC");
/// let mut view = seq.view();
/// view.remove_prefix(4).unwrap();
/// assert_eq!(view, "ACGTGAC");
/// assert_eq!(view.subview(0, Some(4)).unwrap(), "ACGT");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SeqView<'a> {
    data: &'a [u8],
}

impl<'a> SeqView<'a> {
    /// Views arbitrary residue bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Number of residues in the window.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the window is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Checked access to the residue at `pos`.
    pub fn at(&self, pos: usize) -> Result<u8> {
        self.data.get(pos).copied().ok_or(TagSeqError::Range {
            pos,
            len: self.len(),
        })
    }

    /// First residue of the window, `None` when empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::SeqView;
    ///
    /// let view = SeqView::new(b"ACGT");
    /// assert_eq!(view.first(), Some(b'A'));
    /// assert_eq!(view.last(), Some(b'T'));
    /// assert_eq!(SeqView::default().first(), None);
    /// ```
    pub fn first(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Last residue of the window, `None` when empty.
    pub fn last(&self) -> Option<u8> {
        self.data.last().copied()
    }

    /// Viewed residues, borrowed for the lifetime of the owner.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Iterates over the viewed residues.
    pub fn iter(&self) -> std::slice::Iter<'a, u8> {
        self.data.iter()
    }

    /// Shrinks the view by moving its start forward by `n` residues.
    pub fn remove_prefix(&mut self, n: usize) -> Result<()> {
        if n > self.len() {
            return Err(TagSeqError::Range {
                pos: n,
                len: self.len(),
            });
        }
        self.data = &self.data[n..];
        Ok(())
    }

    /// Shrinks the view by moving its end backward by `n` residues.
    pub fn remove_suffix(&mut self, n: usize) -> Result<()> {
        if n > self.len() {
            return Err(TagSeqError::Range {
                pos: n,
                len: self.len(),
            });
        }
        self.data = &self.data[..self.len() - n];
        Ok(())
    }

    /// Returns the window `[pos, pos + count)`, clamped to the end of the view.
    ///
    /// `None` extends to the end. Fails when `pos > len()`.
    pub fn subview(&self, pos: usize, count: Option<usize>) -> Result<SeqView<'a>> {
        let (start, end) = clamp_range(pos, count, self.len())?;
        Ok(Self::new(&self.data[start..end]))
    }

    /// Copies the viewed residues into a new sequence without tags.
    pub fn to_sequence(&self) -> Sequence {
        Sequence::from(self.data)
    }
}

/// Resolves `(pos, count)` against `len` into slice bounds.
pub(crate) fn clamp_range(pos: usize, count: Option<usize>, len: usize) -> Result<(usize, usize)> {
    if pos > len {
        return Err(TagSeqError::Range { pos, len });
    }
    let end = match count {
        Some(count) if count < len - pos => pos + count,
        _ => len,
    };
    Ok((pos, end))
}

impl Index<usize> for SeqView<'_> {
    type Output = u8;

    /// Panics when `pos >= len()`, like slice indexing.
    fn index(&self, pos: usize) -> &u8 {
        &self.data[pos]
    }
}

impl<'a> IntoIterator for SeqView<'a> {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<'a> From<&'a Sequence> for SeqView<'a> {
    fn from(seq: &'a Sequence) -> Self {
        Self::new(seq.as_bytes())
    }
}

impl fmt::Debug for SeqView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqView({:?})", String::from_utf8_lossy(self.data))
    }
}

impl PartialEq<str> for SeqView<'_> {
    fn eq(&self, other: &str) -> bool {
        self.data == other.as_bytes()
    }
}

impl PartialEq<&str> for SeqView<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.data == other.as_bytes()
    }
}

impl PartialEq<[u8]> for SeqView<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.data == other
    }
}

impl PartialEq<Sequence> for SeqView<'_> {
    fn eq(&self, other: &Sequence) -> bool {
        self.data == other.as_bytes()
    }
}
