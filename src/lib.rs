//! # tagseq - Residue Sequences with Typed Tagged Data
//!
//! `tagseq` stores a biological residue sequence (DNA, RNA or protein
//! symbols) together with an open-ended set of named, arbitrarily-typed
//! attributes, and moves that combined value to and from external
//! representations: a compact self-describing text serialization, and the
//! FASTA/FASTQ record formats (optionally compressed).
//!
//! ## Data Model
//!
//! - [`Sequence`]: owned residue bytes plus a lazily allocated tag map.
//!   Equality compares residues only, never tags.
//! - [`TagValue`]: a type-erased value (any `Clone + Debug + Send + Sync`
//!   type, or void).
//! - [`SeqView`]: a borrowed window over residues.
//! - [`Registry`]: maps value types to text writers and type names to text
//!   readers, so new tag types can be serialized without changing the
//!   container.
//!
//! Three tag names are reserved for the FASTA/FASTQ codec: `_id`, `_desc` and
//! `_qs` (all `String`).
//!
//! ## Basic Usage
//!
//! ### Tags and Text Serialization
//!
//! ```rust
//! use tagseq::Sequence;
//!
//! # fn main() -> tagseq::Result<()> {
//! let mut seq = Sequence::from("ACGTACGT");
//! seq.set_tag("_id", "read-1");
//! seq.set_tag("coverage", 12.5f64);
//! seq.set_tag("peaks", vec![3, 17, 42]);
//!
//! let text = seq.to_text()?;
//! let back = Sequence::from_text(&text)?;
//!
//! assert_eq!(back, seq);
//! assert_eq!(back.tag::<f64>("coverage")?, &12.5);
//! assert_eq!(back.tag::<Vec<i32>>("peaks")?, &vec![3, 17, 42]);
//!
//! // sub-ranges carry residues only
//! let head = seq.subseq(0, Some(4))?;
//! assert_eq!(head, "ACGT");
//! assert!(!head.has("_id"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Registering a Custom Tag Type
//!
//! ```rust
//! use std::io::Write;
//! use tagseq::{registry, Sequence};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Strand(bool);
//!
//! # fn main() -> tagseq::Result<()> {
//! registry::register::<Strand, _, _>(
//!     "strand",
//!     |strand, out| out.write_all(if strand.0 { b"+" } else { b"-" }),
//!     |scanner| Ok(Strand(scanner.next_byte()? == Some(b'+'))),
//! );
//!
//! let mut seq = Sequence::from("ACGT");
//! seq.set_tag("strand", tagseq::TagValue::new(Strand(false)));
//!
//! let back = Sequence::from_text(&seq.to_text()?)?;
//! assert_eq!(back.tag::<Strand>("strand")?, &Strand(false));
//! # Ok(())
//! # }
//! ```
//!
//! ### FASTA/FASTQ Files
//!
//! ```rust,no_run
//! use tagseq::{load, save, Compression, Sequence, WriteOptions};
//!
//! # fn main() -> tagseq::Result<()> {
//! // by zero-based index or by identifier; a miss yields an empty sequence
//! let plasmid = load("plasmids.fa.gz", "NC_017288.1")?;
//! if plasmid.is_empty() {
//!     eprintln!("not found");
//! }
//!
//! let options = WriteOptions::fasta()
//!     .with_line_width(60)
//!     .with_compression(Compression::Zstd);
//! save("plasmid.fa.zst", &plasmid, options)?;
//!
//! // `-` reads from stdin / writes to stdout
//! let first = Sequence::load("-", 0usize)?;
//! first.save("-", WriteOptions::fasta())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result`] with a [`TagSeqError`]. Looking
//! up a record that does not exist is not an error: it yields an empty
//! [`Sequence`].
//!
//! ```rust
//! use tagseq::{Sequence, TagSeqError};
//!
//! # fn main() {
//! match Sequence::from_text(b"4ACGT#m#|matrix|[[1]]") {
//!     Err(TagSeqError::UnregisteredType(name)) => assert_eq!(name, "matrix"),
//!     _ => unreachable!(),
//! }
//! # }
//! ```
//!
//! ## Features
//!
//! - `niffler` (default): transparent decompression of gzip/bzip2/xz/zstd
//!   input, and gzip/bzip2/zstd output through [`Encoder`].
//! - `serde` (default): `Serialize`/`Deserialize` for [`WriteOptions`],
//!   [`Format`] and [`Compression`].

pub mod codec;
mod constructs;
mod error;
mod io;
pub mod registry;

pub use constructs::{
    SeqView, Sequence, TagData, TagValue, DEFAULT_FILL, DESC_TAG, ID_TAG, QUALITY_TAG,
};
pub use error::{Result, TagSeqError};
pub use io::{
    load, load_all, open_reader, open_writer, save, BoxedReader, BoxedWriter, Compression,
    Encoder, Format, Reader, Selector, WriteOptions, Writer, DEFAULT_DESCRIPTION,
    DEFAULT_FASTA_WIDTH, DEFAULT_ID, QUALITY_FILL, STDIO_SENTINEL,
};
pub use registry::Registry;
