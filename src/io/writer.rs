//! Writing sequences as FASTA/FASTQ records.

use std::{io::Write, path::Path};

use super::{open_writer, BoxedWriter, Encoder, Format, WriteOptions};
use crate::{Result, Sequence, TagSeqError, DESC_TAG, ID_TAG, QUALITY_TAG};

/// Identifier written for sequences without an `_id` tag.
pub const DEFAULT_ID: &str = "seq";

/// Description written for sequences without a `_desc` tag.
pub const DEFAULT_DESCRIPTION: &str = "generated by tagseq";

/// Quality code synthesized per residue for FASTQ output without a `_qs` tag.
pub const QUALITY_FILL: u8 = b'I';

/// Writer emitting sequences as FASTA or FASTQ records.
///
/// The header line carries the `_id` and `_desc` tags (or [`DEFAULT_ID`]
/// and [`DEFAULT_DESCRIPTION`]). FASTQ records take their quality from the
/// `_qs` tag, or repeat [`QUALITY_FILL`] once per residue. Residues and
/// qualities are wrapped at [`WriteOptions::line_width`].
///
/// # Examples
///
/// ```rust
/// use tagseq::{Sequence, WriteOptions, Writer};
///
/// # fn main() -> tagseq::Result<()> {
/// let mut seq = Sequence::from("ACGTACGT");
/// seq.set_tag("_id", "r1");
///
/// let mut writer = Writer::new(Vec::new(), WriteOptions::fastq().with_line_width(5));
/// writer.write_sequence(&seq)?;
/// writer.finish()?;
///
/// let text = writer.into_inner()?;
/// assert_eq!(text, b"@r1 generated by tagseq\nACGTA\nCGT\n+\nIIIII\nIII\n");
/// # Ok(())
/// # }
/// ```
pub struct Writer<W: Write> {
    /// Inner writer providing the data sink, finished when dropped
    inner: Encoder<W>,

    options: WriteOptions,

    /// Number of records written so far
    records_written: u64,
}

impl<W: Write> Writer<W> {
    /// Creates a writer over an uncompressed sink.
    ///
    /// [`WriteOptions::compression`] is ignored here; it applies to writers
    /// opened by path or built with [`Writer::with_encoder`].
    pub fn new(inner: W, options: WriteOptions) -> Self {
        Self::with_encoder(Encoder::plain(inner), options)
    }

    /// Creates a writer over an already configured output stream.
    pub fn with_encoder(inner: Encoder<W>, options: WriteOptions) -> Self {
        Self {
            inner,
            options,
            records_written: 0,
        }
    }

    /// Settings applied to every record.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::TagType`] when `_id`, `_desc` or `_qs` holds a
    /// value that is not a `String`, and [`TagSeqError::Io`] on write failure.
    pub fn write_sequence(&mut self, seq: &Sequence) -> Result<()> {
        let id = string_tag(seq, ID_TAG)?.unwrap_or(DEFAULT_ID);
        let desc = string_tag(seq, DESC_TAG)?.unwrap_or(DEFAULT_DESCRIPTION);
        let marker = match self.options.format {
            Format::Fasta => b'>',
            Format::Fastq => b'@',
        };

        self.inner.write_all(&[marker])?;
        self.inner.write_all(id.as_bytes())?;
        self.inner.write_all(b" ")?;
        self.inner.write_all(desc.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.write_wrapped(seq.as_bytes())?;

        if self.options.format == Format::Fastq {
            self.inner.write_all(b"+\n")?;
            match string_tag(seq, QUALITY_TAG)? {
                Some(qual) => self.write_wrapped(qual.as_bytes())?,
                None => self.write_wrapped(&vec![QUALITY_FILL; seq.len()])?,
            }
        }

        self.records_written += 1;
        Ok(())
    }

    /// Writes every sequence of an iterator.
    pub fn write_all<'a, I>(&mut self, seqs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Sequence>,
    {
        for seq in seqs {
            self.write_sequence(seq)?;
        }
        Ok(())
    }

    /// Writes `data` in lines of at most `line_width` bytes.
    ///
    /// A zero width writes a single line, even for empty data; a positive
    /// width writes no line at all for empty data.
    fn write_wrapped(&mut self, data: &[u8]) -> Result<()> {
        match self.options.line_width {
            0 => {
                self.inner.write_all(data)?;
                self.inner.write_all(b"\n")?;
            }
            width => {
                for line in data.chunks(width) {
                    self.inner.write_all(line)?;
                    self.inner.write_all(b"\n")?;
                }
            }
        }
        Ok(())
    }

    /// Completes the output: compressed streams get their trailer and the
    /// sink is flushed, so the destination is readable afterwards.
    ///
    /// Also runs when the writer is dropped, where errors are ignored, so
    /// call it explicitly to observe them. Nothing may be written after
    /// finishing a compressed writer.
    pub fn finish(&mut self) -> Result<()> {
        self.inner.finish()
    }

    /// Finishes the output and returns the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.inner.into_inner()
    }
}

impl Writer<BoxedWriter> {
    /// Creates a writer to a file path, or to stdout for `-`.
    ///
    /// Output is compressed according to [`WriteOptions::compression`].
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::Open`] when the file cannot be created.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use tagseq::{Compression, Sequence, WriteOptions, Writer};
    ///
    /// # fn main() -> tagseq::Result<()> {
    /// let options = WriteOptions::fasta().with_compression(Compression::from_path("out.fa.gz"));
    /// let mut writer = Writer::from_path("out.fa.gz", options)?;
    /// writer.write_sequence(&Sequence::from("ACGT"))?;
    /// writer.finish()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self> {
        let inner = open_writer(path, options.compression)?;
        Ok(Self::with_encoder(inner, options))
    }

    /// Creates a writer to stdout, compressed according to `options`.
    pub fn from_stdout(options: WriteOptions) -> Result<Self> {
        Self::from_path(super::STDIO_SENTINEL, options)
    }

    /// Writes to the given path, or to stdout if `None`.
    pub fn from_optional_path<P: AsRef<Path>>(
        path: Option<P>,
        options: WriteOptions,
    ) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path, options),
            None => Self::from_stdout(options),
        }
    }
}

fn string_tag<'a>(seq: &'a Sequence, tag: &str) -> Result<Option<&'a str>> {
    if !seq.has(tag) {
        return Ok(None);
    }
    match seq.tag::<String>(tag) {
        Ok(value) => Ok(Some(value.as_str())),
        Err(_) => Err(TagSeqError::TagType {
            tag: tag.to_string(),
            expected: "string",
        }),
    }
}

/// Writes a single sequence to a file path (or stdout for `-`).
///
/// The destination is flushed, and compressed output finished, before this
/// returns.
pub fn save<P: AsRef<Path>>(path: P, seq: &Sequence, options: WriteOptions) -> Result<()> {
    let mut writer = Writer::from_path(path, options)?;
    writer.write_sequence(seq)?;
    writer.finish()
}

impl Sequence {
    /// Writes this sequence as a single record; see [`save`].
    pub fn save<P: AsRef<Path>>(&self, path: P, options: WriteOptions) -> Result<()> {
        save(path, self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load, Compression, Reader, TagValue};
    use std::io::Cursor;

    fn write_one(seq: &Sequence, options: WriteOptions) -> String {
        let mut writer = Writer::new(Vec::new(), options);
        writer.write_sequence(seq).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn tagged(residues: &str, id: &str, desc: &str) -> Sequence {
        let mut seq = Sequence::from(residues);
        seq.set_tag(ID_TAG, id);
        seq.set_tag(DESC_TAG, desc);
        seq
    }

    #[test]
    fn test_fasta_framing() {
        let seq = tagged("ACGTACGTAC", "r1", "some description");
        assert_eq!(
            write_one(&seq, WriteOptions::fasta().with_line_width(4)),
            ">r1 some description\nACGT\nACGT\nAC\n"
        );
        assert_eq!(
            write_one(&seq, WriteOptions::fasta().with_line_width(0)),
            ">r1 some description\nACGTACGTAC\n"
        );
        assert_eq!(
            write_one(&seq, WriteOptions::fasta().with_line_width(5)),
            ">r1 some description\nACGTA\nCGTAC\n"
        );
    }

    #[test]
    fn test_default_header() {
        assert_eq!(
            write_one(&Sequence::from("AC"), WriteOptions::fasta()),
            ">seq generated by tagseq\nAC\n"
        );
    }

    #[test]
    fn test_empty_residues() {
        let seq = Sequence::new();
        assert_eq!(
            write_one(&seq, WriteOptions::fasta()),
            ">seq generated by tagseq\n"
        );
        assert_eq!(
            write_one(&seq, WriteOptions::fasta().with_line_width(0)),
            ">seq generated by tagseq\n\n"
        );
    }

    #[test]
    fn test_fastq_framing() {
        let mut seq = tagged("ACGTA", "q1", "d");
        assert_eq!(
            write_one(&seq, WriteOptions::fastq()),
            "@q1 d\nACGTA\n+\nIIIII\n"
        );

        seq.set_tag(QUALITY_TAG, "!#%&(");
        assert_eq!(
            write_one(&seq, WriteOptions::fastq().with_line_width(2)),
            "@q1 d\nAC\nGT\nA\n+\n!#\n%&\n(\n"
        );
    }

    #[test]
    fn test_non_string_reserved_tag() {
        let mut seq = Sequence::from("AC");
        seq.set_tag(ID_TAG, 7);
        let mut writer = Writer::new(Vec::new(), WriteOptions::fasta());
        assert!(matches!(
            writer.write_sequence(&seq),
            Err(TagSeqError::TagType { tag, .. }) if tag == ID_TAG
        ));
        assert_eq!(writer.records_written(), 0);

        let mut seq = Sequence::from("AC");
        seq.set_tag(QUALITY_TAG, TagValue::void());
        let mut writer = Writer::new(Vec::new(), WriteOptions::fastq());
        assert!(writer.write_sequence(&seq).is_err());
    }

    #[test]
    fn test_fasta_round_trip_any_width() {
        let residues: String = "ACGT".repeat(53);
        let seq = tagged(&residues, "r1", "wrapped");
        for width in [0, 1, 7, 60, 80, 212, 1000] {
            let text = write_one(&seq, WriteOptions::fasta().with_line_width(width));
            let back = Reader::new(Cursor::new(text)).find(0usize).unwrap();
            assert_eq!(back, seq, "width {}", width);
            assert_eq!(back.tag::<String>(ID_TAG).unwrap(), "r1");
            assert_eq!(back.tag::<String>(DESC_TAG).unwrap(), "wrapped");
        }
    }

    #[test]
    fn test_fastq_synthesized_quality_round_trip() {
        let seq = Sequence::from("ACGTTGCA");
        for width in [0, 8, 80] {
            let text = write_one(&seq, WriteOptions::fastq().with_line_width(width));
            let back = Reader::new(Cursor::new(text)).find(0usize).unwrap();
            assert_eq!(back, seq);
            assert_eq!(back.tag::<String>(QUALITY_TAG).unwrap(), "IIIIIIII");
        }
    }

    #[test]
    fn test_multiple_records() {
        let seqs = vec![tagged("AAA", "a", "x"), tagged("CC", "b", "y"), Sequence::new()];
        let mut writer = Writer::new(Vec::new(), WriteOptions::fastq());
        writer.write_all(&seqs).unwrap();
        assert_eq!(writer.records_written(), 3);
        writer.finish().unwrap();

        let text = writer.into_inner().unwrap();
        let back = Reader::new(Cursor::new(text))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(back, seqs);
        assert_eq!(back[2].tag::<String>(ID_TAG).unwrap(), DEFAULT_ID);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.fq");
        let seq = tagged("GATTACA", "g1", "saved");
        seq.save(&path, WriteOptions::fastq()).unwrap();

        let back = load(&path, "g1").unwrap();
        assert_eq!(back, seq);
        assert_eq!(back.tag::<String>(QUALITY_TAG).unwrap(), "IIIIIII");
    }

    #[test]
    fn test_save_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing/one.fa");
        assert!(matches!(
            save(&path, &Sequence::from("A"), WriteOptions::fasta()),
            Err(TagSeqError::Open { .. })
        ));
    }

    #[test]
    fn test_wrapped_fastq_is_rejected_on_read() {
        let seq = tagged("ACGTTGCA", "w1", "wrapped");
        let text = write_one(&seq, WriteOptions::fastq().with_line_width(3));
        assert!(matches!(
            Reader::new(Cursor::new(text)).find(0usize),
            Err(TagSeqError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_optional_path_none_is_stdout() {
        let writer = Writer::from_optional_path(None::<&str>, WriteOptions::fastq()).unwrap();
        assert_eq!(writer.options(), &WriteOptions::fastq());
        assert_eq!(writer.records_written(), 0);
        assert!(!Path::new(crate::STDIO_SENTINEL).exists());
    }

    #[cfg(feature = "niffler")]
    #[test]
    fn test_finish_completes_compressed_output() {
        let dir = tempfile::tempdir().unwrap();
        let seqs = vec![tagged("ACGTAC", "a", "x"), tagged("TTGA", "b", "y")];
        for name in ["live.fa.gz", "live.fa.bz2", "live.fa.zst"] {
            let path = dir.path().join(name);
            let options = WriteOptions::fasta().with_compression(Compression::from_path(&path));
            let mut writer = Writer::from_path(&path, options).unwrap();
            writer.write_all(&seqs).unwrap();
            writer.finish().unwrap();

            // decoded while the writer is still alive
            let back = crate::load_all(&path).unwrap();
            assert_eq!(back, seqs, "{}", name);
            assert_eq!(writer.records_written(), 2);
        }
    }

    #[cfg(feature = "niffler")]
    #[test]
    fn test_compressed_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.fa.gz");
        let seq = tagged(&"TTGACA".repeat(40), "c1", "compressed");
        let options = WriteOptions::fasta().with_compression(Compression::from_path(&path));
        save(&path, &seq, options).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let back = load(&path, 0usize).unwrap();
        assert_eq!(back, seq);
        assert_eq!(back.tag::<String>(DESC_TAG).unwrap(), "compressed");
    }

    #[cfg(not(feature = "niffler"))]
    #[test]
    fn test_compression_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.fa.gz");
        let options = WriteOptions::fasta().with_compression(Compression::Gzip);
        assert!(matches!(
            save(&path, &Sequence::from("A"), options),
            Err(TagSeqError::CompressionUnavailable("gzip"))
        ));
    }
}
