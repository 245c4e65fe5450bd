use std::{
    io::{self, BufRead, Read, Write},
    str::FromStr,
};

use crate::{Result, TagSeqError};

/// Escape character inside quoted text.
pub const ESCAPE: u8 = b'\\';

/// Upper bound on the buffer reserved before a fixed-length read.
const INITIAL_READ_CAPACITY: usize = 8 * 1024;

/// Byte-level reader over a serialized stream.
///
/// Type readers registered in the [`Registry`](crate::Registry) receive a
/// scanner positioned right after the type name and must consume exactly
/// the payload their writer produced.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagseq::codec::Scanner;
///
/// let mut input = Cursor::new(&b"-42,\"a \\\"quoted\\\" word\""[..]);
/// let mut scanner = Scanner::new(&mut input);
/// assert_eq!(scanner.parse::<i32>("int").unwrap(), -42);
/// scanner.expect(b',').unwrap();
/// assert_eq!(scanner.read_quoted(b'"').unwrap(), "a \"quoted\" word");
/// assert_eq!(scanner.peek().unwrap(), None);
/// ```
pub struct Scanner<'a> {
    inner: &'a mut dyn BufRead,

    /// Bytes consumed so far
    pos: u64,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner at the current position of `inner`.
    pub fn new(inner: &'a mut dyn BufRead) -> Self {
        Self { inner, pos: 0 }
    }

    /// Number of bytes consumed from the underlying reader.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Returns the next byte without consuming it, `None` at end of input.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Consumes and returns the next byte, `None` at end of input.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.inner.consume(1);
            self.pos += 1;
        }
        Ok(byte)
    }

    /// Consumes the next byte, failing unless it equals `byte`.
    pub fn expect(&mut self, byte: u8) -> Result<()> {
        match self.next_byte()? {
            Some(b) if b == byte => Ok(()),
            Some(b) => Err(self.error(
                "payload",
                format!("expected {:?}, found {:?}", byte as char, b as char),
            )),
            None => Err(self.error(
                "payload",
                format!("expected {:?}, found end of input", byte as char),
            )),
        }
    }

    /// Reads exactly `n` raw bytes.
    ///
    /// The buffer grows with the data actually present, so a large `n` over
    /// a short input fails with [`TagSeqError::Parse`] instead of allocating
    /// `n` bytes up front.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(INITIAL_READ_CAPACITY));
        (&mut *self.inner).take(n as u64).read_to_end(&mut buf)?;
        self.pos += buf.len() as u64;
        if buf.len() < n {
            return Err(self.error(
                "residues",
                format!("expected {} bytes, found {} before end of input", n, buf.len()),
            ));
        }
        Ok(buf)
    }

    /// Consumes bytes while `accept` holds and returns them as text.
    pub fn read_while<F>(&mut self, accept: F) -> Result<String>
    where
        F: Fn(u8) -> bool,
    {
        let mut token = Vec::new();
        while let Some(b) = self.peek()? {
            if !accept(b) {
                break;
            }
            token.push(b);
            self.inner.consume(1);
            self.pos += 1;
        }
        // accepted bytes are ASCII for every predicate used by the codec
        String::from_utf8(token).map_err(|e| self.error("token", e))
    }

    /// Reads a numeric-looking token (digits, letters, sign, decimal point)
    /// and parses it as `T`.
    ///
    /// `type_name` is only used in error messages.
    pub fn parse<T>(&mut self, type_name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let token = self.read_while(|b| b.is_ascii_alphanumeric() || b"+-.".contains(&b))?;
        if token.is_empty() {
            return Err(self.error(type_name, "expected a value"));
        }
        token
            .parse()
            .map_err(|e: T::Err| TagSeqError::parse(type_name, format!("{} ({:?})", e, token)))
    }

    /// Reads text enclosed in `delim`, resolving [`ESCAPE`] sequences.
    pub fn read_quoted(&mut self, delim: u8) -> Result<String> {
        self.expect(delim)?;
        let mut text = Vec::new();
        loop {
            match self.next_byte()? {
                Some(ESCAPE) => match self.next_byte()? {
                    Some(b) => text.push(b),
                    None => return Err(self.error("quoted text", "dangling escape")),
                },
                Some(b) if b == delim => break,
                Some(b) => text.push(b),
                None => return Err(self.error("quoted text", "missing closing delimiter")),
            }
        }
        String::from_utf8(text).map_err(|e| self.error("quoted text", e))
    }

    fn error(&self, what: &str, reason: impl ToString) -> TagSeqError {
        TagSeqError::parse(what, format!("{} at byte {}", reason.to_string(), self.pos))
    }
}

/// Writes `text` enclosed in `delim`, escaping embedded delimiters and escapes.
pub fn write_quoted(out: &mut dyn Write, text: &str, delim: u8) -> io::Result<()> {
    out.write_all(&[delim])?;
    for &b in text.as_bytes() {
        if b == delim || b == ESCAPE {
            out.write_all(&[ESCAPE])?;
        }
        out.write_all(&[b])?;
    }
    out.write_all(&[delim])
}
