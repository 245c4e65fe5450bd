//! FASTA/FASTQ record I/O.
//!
//! Sources and destinations are named by path, where [`STDIO_SENTINEL`]
//! (`-`) stands for standard input or standard output. With the `niffler`
//! feature enabled, compressed input is detected transparently and output can
//! be compressed with gzip, bzip2 or zstd.

mod reader;
mod writer;

pub use reader::{load, load_all, Reader, Selector};
pub use writer::{save, Writer, DEFAULT_DESCRIPTION, DEFAULT_ID, QUALITY_FILL};

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, TagSeqError};

/// Path denoting standard input (reading) or standard output (writing).
pub const STDIO_SENTINEL: &str = "-";

/// Default residue line width for FASTA output.
pub const DEFAULT_FASTA_WIDTH: usize = 80;

/// Level used for gzip and bzip2 output.
#[cfg(feature = "niffler")]
const COMPRESSION_LEVEL: u32 = 6;

pub type BoxedReader = Box<dyn Read + Send>;
pub type BoxedWriter = Box<dyn Write + Send>;

/// Record framing used when writing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    #[default]
    Fasta,
    Fastq,
}

/// Stream compression applied to written output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bzip2,
    Zstd,
}

impl Compression {
    /// Picks the compression matching a file extension (`.gz`, `.bz2`,
    /// `.zst`), or [`Compression::None`] for anything else.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::Compression;
    ///
    /// assert_eq!(Compression::from_path("reads.fq.gz"), Compression::Gzip);
    /// assert_eq!(Compression::from_path("genome.fa.zst"), Compression::Zstd);
    /// assert_eq!(Compression::from_path("genome.fa"), Compression::None);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("gz" | "gzip") => Self::Gzip,
            Some("bz2" | "bzip2") => Self::Bzip2,
            Some("zst" | "zstd") => Self::Zstd,
            _ => Self::None,
        }
    }

    /// Lowercase name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Zstd => "zstd",
        }
    }
}

/// Output settings shared by every record a [`Writer`] emits.
///
/// # Examples
///
/// ```rust
/// use tagseq::{Compression, Format, WriteOptions};
///
/// let options = WriteOptions::fastq()
///     .with_line_width(60)
///     .with_compression(Compression::Gzip);
/// assert_eq!(options.format, Format::Fastq);
/// assert_eq!(options.line_width, 60);
///
/// assert_eq!(WriteOptions::default(), WriteOptions::fasta());
/// assert_eq!(WriteOptions::fasta().line_width, 80);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WriteOptions {
    pub format: Format,

    /// Residues (and qualities) per line; 0 writes each on a single line
    pub line_width: usize,

    pub compression: Compression,
}

impl WriteOptions {
    /// FASTA records wrapped at [`DEFAULT_FASTA_WIDTH`], uncompressed.
    pub fn fasta() -> Self {
        Self {
            format: Format::Fasta,
            line_width: DEFAULT_FASTA_WIDTH,
            compression: Compression::None,
        }
    }

    /// FASTQ records on single lines, uncompressed.
    pub fn fastq() -> Self {
        Self {
            format: Format::Fastq,
            line_width: 0,
            compression: Compression::None,
        }
    }

    /// Sets the residue line width; 0 disables wrapping.
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    /// Sets the output compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::fasta()
    }
}

/// Output stream compressing everything written to it.
///
/// Compressed data is only complete once [`Encoder::finish`] has run. Dropping
/// the encoder finishes it too, but any error is then lost.
///
/// # Examples
///
/// ```rust,no_run
/// use std::io::Write;
/// use tagseq::{open_writer, Compression};
///
/// # fn main() -> tagseq::Result<()> {
/// let mut out = open_writer("notes.txt.gz", Compression::Gzip)?;
/// out.write_all(b"4ACGT")?;
/// out.finish()?;
/// # Ok(())
/// # }
/// ```
pub struct Encoder<W: Write> {
    stream: Option<Stream<W>>,
}

enum Stream<W: Write> {
    Plain(W),
    #[cfg(feature = "niffler")]
    Gzip(flate2::write::GzEncoder<W>),
    #[cfg(feature = "niffler")]
    Bzip2(bzip2::write::BzEncoder<W>),
    #[cfg(feature = "niffler")]
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    /// Wraps a sink without compression.
    pub fn plain(inner: W) -> Self {
        Self {
            stream: Some(Stream::Plain(inner)),
        }
    }

    /// Wraps a sink, compressing with `compression`.
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::CompressionUnavailable`] for compressed output
    /// without the `niffler` feature.
    #[cfg(feature = "niffler")]
    pub fn new(inner: W, compression: Compression) -> Result<Self> {
        let stream = match compression {
            Compression::None => Stream::Plain(inner),
            Compression::Gzip => Stream::Gzip(flate2::write::GzEncoder::new(
                inner,
                flate2::Compression::new(COMPRESSION_LEVEL),
            )),
            Compression::Bzip2 => Stream::Bzip2(bzip2::write::BzEncoder::new(
                inner,
                bzip2::Compression::new(COMPRESSION_LEVEL),
            )),
            Compression::Zstd => Stream::Zstd(zstd::stream::write::Encoder::new(
                inner,
                zstd::DEFAULT_COMPRESSION_LEVEL,
            )?),
        };
        if compression != Compression::None {
            debug!("Compressing output with {}", compression.name());
        }
        Ok(Self {
            stream: Some(stream),
        })
    }

    #[cfg(not(feature = "niffler"))]
    pub fn new(inner: W, compression: Compression) -> Result<Self> {
        match compression {
            Compression::None => Ok(Self::plain(inner)),
            other => Err(TagSeqError::CompressionUnavailable(other.name())),
        }
    }

    /// Writes any pending compressed data, including the format trailer,
    /// and flushes the sink.
    ///
    /// Calling it more than once is harmless, but nothing may be written
    /// after it for compressed streams.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.finish()?;
        }
        Ok(())
    }

    /// Finishes the stream and returns the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        match self.stream.take() {
            Some(stream) => Ok(stream.into_inner()?),
            None => Err(io::Error::other("output stream already released").into()),
        }
    }

    fn stream(&mut self) -> io::Result<&mut Stream<W>> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::other("output stream already released"))
    }
}

impl<W: Write> Stream<W> {
    fn finish(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            #[cfg(feature = "niffler")]
            Self::Gzip(enc) => {
                enc.try_finish()?;
                enc.get_mut().flush()
            }
            #[cfg(feature = "niffler")]
            Self::Bzip2(enc) => {
                enc.try_finish()?;
                enc.get_mut().flush()
            }
            #[cfg(feature = "niffler")]
            Self::Zstd(enc) => {
                enc.do_finish()?;
                enc.get_mut().flush()
            }
        }
    }

    fn into_inner(self) -> io::Result<W> {
        let mut inner = match self {
            Self::Plain(w) => w,
            #[cfg(feature = "niffler")]
            Self::Gzip(enc) => enc.finish()?,
            #[cfg(feature = "niffler")]
            Self::Bzip2(enc) => enc.finish()?,
            #[cfg(feature = "niffler")]
            Self::Zstd(enc) => enc.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream()? {
            Stream::Plain(w) => w.write(buf),
            #[cfg(feature = "niffler")]
            Stream::Gzip(enc) => enc.write(buf),
            #[cfg(feature = "niffler")]
            Stream::Bzip2(enc) => enc.write(buf),
            #[cfg(feature = "niffler")]
            Stream::Zstd(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream()? {
            Stream::Plain(w) => w.flush(),
            #[cfg(feature = "niffler")]
            Stream::Gzip(enc) => enc.flush(),
            #[cfg(feature = "niffler")]
            Stream::Bzip2(enc) => enc.flush(),
            #[cfg(feature = "niffler")]
            Stream::Zstd(enc) => enc.flush(),
        }
    }
}

impl<W: Write> Drop for Encoder<W> {
    fn drop(&mut self) {
        self.finish().ok();
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_SENTINEL
}

/// Opens a source for reading, or stdin for `-`.
///
/// With the `niffler` feature, gzip, bzip2, xz and zstd input is detected
/// and decompressed transparently.
///
/// # Errors
///
/// Returns [`TagSeqError::Open`] when the file cannot be opened.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<BoxedReader> {
    let path = path.as_ref();
    if is_stdio(path) {
        debug!("Reading records from stdin");
        return decompress(Box::new(io::stdin()));
    }
    let file = File::open(path).map_err(|source| TagSeqError::Open {
        path: path.display().to_string(),
        source,
    })?;
    debug!("Reading records from {}", path.display());
    decompress(Box::new(file))
}

#[cfg(feature = "niffler")]
fn decompress(mut rdr: BoxedReader) -> Result<BoxedReader> {
    // format sniffing needs a few leading bytes; shorter input is plain text
    let mut prefix = Vec::with_capacity(5);
    (&mut rdr).take(5).read_to_end(&mut prefix)?;
    if prefix.len() < 5 {
        return Ok(Box::new(io::Cursor::new(prefix).chain(rdr)));
    }
    let (pt, format) = niffler::send::get_reader(Box::new(io::Cursor::new(prefix).chain(rdr)))?;
    debug!("Detected input compression: {:?}", format);
    Ok(pt)
}

#[cfg(not(feature = "niffler"))]
fn decompress(rdr: BoxedReader) -> Result<BoxedReader> {
    Ok(rdr)
}

/// Opens a destination for writing, or stdout for `-`.
///
/// No file named `-` is ever created.
///
/// # Errors
///
/// Returns [`TagSeqError::Open`] when the file cannot be created and
/// [`TagSeqError::CompressionUnavailable`] for compressed output without the
/// `niffler` feature.
pub fn open_writer<P: AsRef<Path>>(
    path: P,
    compression: Compression,
) -> Result<Encoder<BoxedWriter>> {
    let path = path.as_ref();
    let wtr: BoxedWriter = if is_stdio(path) {
        debug!("Writing records to stdout");
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(path).map_err(|source| TagSeqError::Open {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Writing records to {}", path.display());
        Box::new(BufWriter::new(file))
    };
    Encoder::new(wtr, compression)
}
