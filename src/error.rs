//! Error handling for the tagseq library.
//!
//! This module defines all error types that can occur while manipulating
//! sequences, encoding or decoding the text serialization, and reading or
//! writing FASTA/FASTQ records.

use thiserror::Error;

/// A specialized `Result` type for tagseq operations.
///
/// It's equivalent to `std::result::Result<T, TagSeqError>`.
///
/// # Examples
///
/// ```rust
/// use tagseq::{Result, Sequence};
///
/// fn first_codon(seq: &Sequence) -> Result<Sequence> {
///     seq.subseq(0, Some(3))
/// }
///
/// assert_eq!(first_codon(&Sequence::from("ATGCCC")).unwrap(), "ATG");
/// ```
pub type Result<T> = std::result::Result<T, TagSeqError>;

/// Error types for tagseq operations.
///
/// Lookups by record index or identifier that simply do not find a match are
/// *not* errors: they produce an empty [`Sequence`](crate::Sequence). Every
/// variant here is a hard failure that is propagated to the caller.
///
/// # Examples
///
/// ```rust
/// use tagseq::{Sequence, TagSeqError};
///
/// let seq = Sequence::from("ACGT");
/// match seq.subseq(10, None) {
///     Err(TagSeqError::Range { pos, len }) => {
///         assert_eq!((pos, len), (10, 4));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum TagSeqError {
    /// I/O error from the underlying reader or writer.
    ///
    /// Raised for low-level read or write failures after a source or
    /// destination has been opened successfully.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Compression/decompression error from niffler.
    #[cfg(feature = "niffler")]
    #[error("Niffler error")]
    Niffler(#[from] niffler::Error),

    /// The named source or destination could not be opened.
    #[error("Could not open file -> {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A FASTQ record whose quality string does not match its residues.
    #[error("Truncated quality string in record {id} at line {line}: {reason}")]
    TruncatedQuality {
        id: String,
        line: u64,
        reason: String,
    },

    /// Structurally invalid FASTA/FASTQ input.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// The text codec met a type name without a registered reader.
    #[error("Unregistered type -> {0}")]
    UnregisteredType(String),

    /// Position outside of a sequence or view.
    #[error("Invalid position ({pos}) - Must not exceed {len}")]
    Range { pos: usize, len: usize },

    /// Immutable access to a tag that does not exist.
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Typed access to a tag holding another concrete type.
    #[error("Tag {tag} does not hold a value of type {expected}")]
    TagType { tag: String, expected: &'static str },

    /// A registered reader (or the residue count) rejected its payload.
    #[error("Could not parse {type_name}: {reason}")]
    Parse { type_name: String, reason: String },

    /// Compressed output was requested without the `niffler` feature.
    #[error("{0} compression requires the `niffler` feature")]
    CompressionUnavailable(&'static str),
}

impl TagSeqError {
    pub(crate) fn parse(type_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            type_name: type_name.into(),
            reason: reason.to_string(),
        }
    }
}
