//! Reading sequences from FASTA/FASTQ sources.

use std::{io::Read, mem, path::Path};

use log::debug;
use needletail::{
    errors::{ParseError, ParseErrorKind},
    parse_fastx_reader,
    parser::{Format as RecordFormat, SequenceRecord},
    FastxReader,
};

use super::{open_reader, BoxedReader};
use crate::{Result, Sequence, TagSeqError, DESC_TAG, ID_TAG, QUALITY_TAG};

/// Selects a single record within a source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Zero-based record position
    Index(usize),
    /// Record identifier (header text up to the first space or tab)
    Id(String),
}

impl Selector {
    fn matches(&self, index: usize, header: &[u8]) -> bool {
        match self {
            Self::Index(target) => *target == index,
            Self::Id(target) => split_header(header).0 == target.as_bytes(),
        }
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// Splits a header at the first space or tab into identifier and description.
fn split_header(header: &[u8]) -> (&[u8], &[u8]) {
    match header.iter().position(|&b| b == b' ' || b == b'\t') {
        Some(pos) => (&header[..pos], &header[pos + 1..]),
        None => (header, b"".as_slice()),
    }
}

/// Builds a tagged sequence from a parsed record.
///
/// `_id` is always set; `_desc` and `_qs` only when the record carries a
/// non-empty description or quality string.
fn record_to_sequence(record: &SequenceRecord) -> Result<Sequence> {
    let line = record.start_line_number();
    let (id, desc) = split_header(record.id());
    let (id, desc) = (header_text(id, line)?, header_text(desc, line)?);

    let mut seq = Sequence::from(record.seq().into_owned());
    seq.set_tag(ID_TAG, id);
    if !desc.is_empty() {
        seq.set_tag(DESC_TAG, desc);
    }
    if let Some(qual) = record.qual().filter(|qual| !qual.is_empty()) {
        let qual = std::str::from_utf8(qual).map_err(|_| TagSeqError::MalformedRecord {
            line,
            reason: format!("quality string of record {} is not valid UTF-8", id),
        })?;
        seq.set_tag(QUALITY_TAG, qual);
    }
    Ok(seq)
}

fn header_text(bytes: &[u8], line: u64) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| TagSeqError::MalformedRecord {
        line,
        reason: "header is not valid UTF-8".to_string(),
    })
}

fn record_error(err: ParseError) -> TagSeqError {
    match err.kind {
        ParseErrorKind::Io => TagSeqError::Io(std::io::Error::other(err.msg)),
        ParseErrorKind::UnequalLengths | ParseErrorKind::UnexpectedEnd
            if err.format == Some(RecordFormat::Fastq) =>
        {
            TagSeqError::TruncatedQuality {
                id: err.position.id.clone().unwrap_or_default(),
                line: err.position.line,
                reason: err.to_string(),
            }
        }
        _ => TagSeqError::MalformedRecord {
            line: err.position.line,
            reason: err.to_string(),
        },
    }
}

enum Source<R> {
    /// Not read yet; the format is detected from the first byte
    Pending(R),
    Parsing(Box<dyn FastxReader>),
    Exhausted,
}

/// Streaming reader over the records of a FASTA/FASTQ source.
///
/// The format is detected from the first byte of the source. FASTA residues
/// may span any number of lines; FASTQ records are four lines each. Every
/// yielded [`Sequence`] carries an `_id` tag, plus `_desc` and `_qs` when the
/// record has a description or quality string. An empty source has no
/// records.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagseq::Reader;
///
/// # fn main() -> tagseq::Result<()> {
/// let data = ">r1 first\nACGT\nAC\n>r2\nGG\n";
/// let records = Reader::new(Cursor::new(data))
///     .collect::<tagseq::Result<Vec<_>>>()?;
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0], "ACGTAC");
/// assert_eq!(records[0].tag::<String>("_desc")?, "first");
/// assert!(!records[1].has("_desc"));
///
/// let fastq = Reader::new(Cursor::new("@q1\nGG\n+\nII\n")).next().unwrap()?;
/// assert_eq!(fastq.tag::<String>("_qs")?, "II");
/// # Ok(())
/// # }
/// ```
pub struct Reader<R: Read + Send + 'static> {
    source: Source<R>,
    records_read: usize,
}

impl<R: Read + Send + 'static> Reader<R> {
    /// Creates a reader over any byte source.
    ///
    /// Nothing is read until the first record is requested.
    pub fn new(inner: R) -> Self {
        Self {
            source: Source::Pending(inner),
            records_read: 0,
        }
    }

    /// Number of records consumed so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn parser(&mut self) -> Result<Option<&mut Box<dyn FastxReader>>> {
        if let Source::Pending(_) = self.source {
            if let Source::Pending(inner) = mem::replace(&mut self.source, Source::Exhausted) {
                match parse_fastx_reader(inner) {
                    Ok(parser) => self.source = Source::Parsing(parser),
                    Err(e) if e.kind == ParseErrorKind::EmptyFile => {
                        debug!("Empty record source");
                    }
                    Err(e) => return Err(record_error(e)),
                }
            }
        }
        match &mut self.source {
            Source::Parsing(parser) => Ok(Some(parser)),
            _ => Ok(None),
        }
    }

    /// Advances to the next record accepted by `accept(index, header)` and
    /// converts only that one. Indices count from `start`.
    fn next_where<F>(&mut self, start: usize, mut accept: F) -> Result<Option<Sequence>>
    where
        F: FnMut(usize, &[u8]) -> bool,
    {
        let mut records_read = self.records_read;
        let outcome = match self.parser()? {
            None => None,
            Some(parser) => loop {
                match parser.next() {
                    None => break None,
                    Some(Err(e)) => break Some(Err(record_error(e))),
                    Some(Ok(record)) => {
                        records_read += 1;
                        if accept(records_read - start - 1, record.id()) {
                            break Some(record_to_sequence(&record));
                        }
                    }
                }
            },
        };
        self.records_read = records_read;
        match outcome {
            Some(Ok(seq)) => Ok(Some(seq)),
            Some(Err(e)) => {
                self.source = Source::Exhausted;
                Err(e)
            }
            None => {
                self.source = Source::Exhausted;
                Ok(None)
            }
        }
    }

    /// Scans forward to the first record matching `selector`.
    ///
    /// Record indices count from the current position of the reader. A
    /// selector that matches nothing before the end of the stream yields an
    /// empty [`Sequence`], not an error.
    ///
    /// # Errors
    ///
    /// Malformed records and read failures met while scanning are propagated.
    pub fn find<S: Into<Selector>>(&mut self, selector: S) -> Result<Sequence> {
        let selector = selector.into();
        let start = self.records_read;
        match self.next_where(start, |index, header| selector.matches(index, header))? {
            Some(seq) => {
                debug!(
                    "Found record {:?} after {} records",
                    selector,
                    self.records_read - start
                );
                Ok(seq)
            }
            None => {
                debug!(
                    "No record matching {:?} in {} records",
                    selector,
                    self.records_read - start
                );
                Ok(Sequence::new())
            }
        }
    }
}

impl<R: Read + Send + 'static> Iterator for Reader<R> {
    type Item = Result<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_where(self.records_read, |_, _| true).transpose()
    }
}

impl Reader<BoxedReader> {
    /// Creates a reader from a file path, or from stdin for `-`.
    ///
    /// Compressed files are detected automatically when the `niffler` feature
    /// is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::Open`](crate::TagSeqError::Open) if the file
    /// cannot be opened.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use tagseq::Reader;
    ///
    /// # fn main() -> tagseq::Result<()> {
    /// for result in Reader::from_path("genome.fa.gz")? {
    ///     let seq = result?;
    ///     println!("{}: {} residues", seq.tag::<String>("_id")?, seq.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        open_reader(path.as_ref()).map(Self::new)
    }

    /// Reads records from stdin, decompressing if needed.
    pub fn from_stdin() -> Result<Self> {
        Self::from_path(super::STDIO_SENTINEL)
    }

    /// Reads from the given path, or from stdin if `None`.
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::from_stdin(),
        }
    }
}

/// Loads a single record by index or identifier.
///
/// Returns an empty [`Sequence`] (without an `_id` tag) when no record
/// matches.
///
/// # Errors
///
/// Returns [`TagSeqError::Open`](crate::TagSeqError::Open) when the source
/// cannot be opened and propagates malformed-record and read errors.
///
/// # Examples
///
/// ```rust,no_run
/// use tagseq::load;
///
/// # fn main() -> tagseq::Result<()> {
/// let second = load("plasmids.fa", 1usize)?;
/// let by_id = load("plasmids.fa", "NC_017288.1")?;
/// assert_eq!(second, by_id);
///
/// let missing = load("plasmids.fa", "not-there")?;
/// assert!(missing.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn load<P: AsRef<Path>, S: Into<Selector>>(path: P, selector: S) -> Result<Sequence> {
    Reader::from_path(path)?.find(selector)
}

/// Loads every record of a source.
pub fn load_all<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    Reader::from_path(path)?.collect()
}

impl Sequence {
    /// Loads a single record; see [`load`].
    pub fn load<P: AsRef<Path>, S: Into<Selector>>(path: P, selector: S) -> Result<Self> {
        load(path, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagSeqError;
    use std::io::Cursor;

    const FASTA: &str = ">r0 zeroth record\nAAAA\nCC\n>r1\nGGGG\n>r2 last one\nTT\n";
    const FASTQ: &str = "@q0 desc\nACGT\n+\nIIII\n@q1\nACGT\n+\n!!##\n";

    #[test]
    fn test_find_by_index() {
        let seq = Reader::new(Cursor::new(FASTA)).find(2usize).unwrap();
        assert_eq!(seq, "TT");
        assert_eq!(seq.tag::<String>(ID_TAG).unwrap(), "r2");
        assert_eq!(seq.tag::<String>(DESC_TAG).unwrap(), "last one");
        assert!(!seq.has(QUALITY_TAG));
    }

    #[test]
    fn test_find_by_id() {
        let seq = Reader::new(Cursor::new(FASTA)).find("r1").unwrap();
        assert_eq!(seq, "GGGG");
        assert!(seq.has(ID_TAG));
        assert!(!seq.has(DESC_TAG));
    }

    #[test]
    fn test_find_miss_is_empty() {
        let seq = Reader::new(Cursor::new(FASTA)).find(3usize).unwrap();
        assert!(seq.is_empty());
        assert!(!seq.has(ID_TAG));

        let seq = Reader::new(Cursor::new(FASTA)).find("r9").unwrap();
        assert!(seq.is_empty());
        assert!(!seq.has(ID_TAG));
    }

    #[test]
    fn test_find_counts_from_current_position() {
        let mut reader = Reader::new(Cursor::new(FASTA));
        assert_eq!(reader.find(0usize).unwrap(), "AAAACC");
        assert_eq!(reader.find(1usize).unwrap(), "TT");
        assert_eq!(reader.records_read(), 3);
    }

    #[test]
    fn test_fastq_records() {
        let records = Reader::new(Cursor::new(FASTQ))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag::<String>(QUALITY_TAG).unwrap(), "IIII");
        assert_eq!(records[0].tag::<String>(DESC_TAG).unwrap(), "desc");
        assert_eq!(records[1], "ACGT");
        assert_eq!(records[1].tag::<String>(QUALITY_TAG).unwrap(), "!!##");
    }

    #[test]
    fn test_malformed_record_is_not_a_miss() {
        let mut reader = Reader::new(Cursor::new("@q0\nACGT\n+\nII\n"));
        match reader.find("other") {
            Err(TagSeqError::TruncatedQuality { id, line, .. }) => {
                assert_eq!(id, "q0");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected result: {:?}", other.map(|seq| seq.len())),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_missing_quality_at_end() {
        let mut reader = Reader::new(Cursor::new("@q0\nACGT\n+\nIIII\n@q1\nACGT\n+\n"));
        assert_eq!(reader.find("q0").unwrap(), "ACGT");
        assert!(matches!(
            reader.next(),
            Some(Err(TagSeqError::TruncatedQuality { .. }))
        ));
    }

    #[test]
    fn test_non_utf8_quality_is_malformed() {
        let mut reader = Reader::new(Cursor::new(&b"@q0\nAC\n+\nI\xff\n"[..]));
        assert!(matches!(
            reader.next(),
            Some(Err(TagSeqError::MalformedRecord { line: 1, .. }))
        ));
    }

    #[test]
    fn test_non_utf8_header_is_malformed() {
        let mut reader = Reader::new(Cursor::new(&b">\xff\xfe\nAC\n"[..]));
        assert!(matches!(
            reader.next(),
            Some(Err(TagSeqError::MalformedRecord { .. }))
        ));
    }

    #[test]
    fn test_unknown_format_is_malformed() {
        let mut reader = Reader::new(Cursor::new("ACGT\n>r1\nAC\n"));
        assert!(matches!(
            reader.find(0usize),
            Err(TagSeqError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_empty_source_has_no_records() {
        for data in ["", ">"] {
            let mut reader = Reader::new(Cursor::new(data));
            assert!(reader.next().is_none());
            assert_eq!(reader.records_read(), 0);
            assert!(Reader::new(Cursor::new(data)).find(0usize).unwrap().is_empty());
        }
    }

    #[test]
    fn test_header_split_and_line_endings() {
        let data = ">r0\tfirst  record\r\nAC\r\nGT\r\n>r1 \nTT\n";
        let records = Reader::new(Cursor::new(data))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records[0], "ACGT");
        assert_eq!(records[0].tag::<String>(ID_TAG).unwrap(), "r0");
        assert_eq!(records[0].tag::<String>(DESC_TAG).unwrap(), "first  record");
        assert_eq!(records[1].tag::<String>(ID_TAG).unwrap(), "r1");
        assert!(!records[1].has(DESC_TAG));
    }

    #[test]
    fn test_selector_conversions() {
        assert_eq!(Selector::from(3usize), Selector::Index(3));
        assert_eq!(Selector::from("r1"), Selector::Id("r1".to_string()));
        assert_eq!(
            Selector::from(String::from("r1")),
            Selector::Id("r1".to_string())
        );
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fa");
        std::fs::write(&path, FASTA).unwrap();

        assert_eq!(load(&path, 1usize).unwrap(), "GGGG");
        assert_eq!(Sequence::load(&path, "r0").unwrap(), "AAAACC");
        assert_eq!(load_all(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_load_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.fa");
        assert!(matches!(load(&path, 0usize), Err(TagSeqError::Open { .. })));
        assert!(matches!(load_all(&path), Err(TagSeqError::Open { .. })));
    }
}
