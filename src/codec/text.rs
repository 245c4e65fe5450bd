use std::io::{BufRead, Cursor, Write};

use crate::{
    codec::{write_quoted, Scanner},
    registry::{self, TYPE_DELIM},
    Registry, Result, Sequence, TagSeqError,
};

/// Delimiter quoting a tag name.
pub const TAG_DELIM: u8 = b'#';

/// Optional separator between the residue count and the residues.
///
/// Only written when the residues start with a digit or with the separator
/// itself, so the count can always be told apart from the residues.
pub const COUNT_SEPARATOR: u8 = b':';

/// Encodes and decodes sequences in the self-describing text form.
///
/// The layout is the residue count, the raw residues, then one
/// `#tag#|type|payload` entry per tag:
///
/// ```text
/// 4ACGT#_id#|string|"r1"#score#|double|0.5
/// ```
///
/// # Examples
///
/// ```rust
/// use tagseq::{codec::TextCodec, Registry, Sequence};
///
/// let registry = Registry::with_builtins();
/// let codec = TextCodec::new(&registry);
///
/// let mut seq = Sequence::from("ACGT");
/// seq.set_tag("_id", "r1");
///
/// let text = codec.encode_to_vec(&seq).unwrap();
/// assert_eq!(text, b"4ACGT#_id#|string|\"r1\"");
///
/// let back = codec.decode_from_slice(&text).unwrap();
/// assert_eq!(back, seq);
/// assert_eq!(back.tag::<String>("_id").unwrap(), "r1");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TextCodec<'r> {
    registry: &'r Registry,
}

impl<'r> TextCodec<'r> {
    /// Creates a codec resolving types through `registry`.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Writes the residue count, the residues and every tag of `seq`.
    ///
    /// Tags are written in the map's iteration order.
    pub fn encode<W: Write>(&self, seq: &Sequence, mut out: W) -> Result<()> {
        let residues = seq.as_bytes();
        write!(out, "{}", residues.len())?;
        if matches!(residues.first(), Some(b) if b.is_ascii_digit() || *b == COUNT_SEPARATOR) {
            out.write_all(&[COUNT_SEPARATOR])?;
        }
        out.write_all(residues)?;
        for (tag, value) in seq.tags() {
            write_quoted(&mut out, tag, TAG_DELIM)?;
            self.registry.write_value(value, &mut out)?;
        }
        Ok(())
    }

    /// Encodes `seq` into a new buffer.
    pub fn encode_to_vec(&self, seq: &Sequence) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(seq.len() + 16);
        self.encode(seq, &mut out)?;
        Ok(out)
    }

    /// Decodes one sequence, leaving any input after its last tag unread.
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::UnregisteredType`] for a type name without a
    /// reader and [`TagSeqError::Parse`] for malformed input.
    pub fn decode<R: BufRead>(&self, mut input: R) -> Result<Sequence> {
        let mut scanner = Scanner::new(&mut input);

        let count = scanner.read_while(|b| b.is_ascii_digit())?;
        let count = count
            .parse::<usize>()
            .map_err(|e| TagSeqError::parse("residue count", format!("{} ({:?})", e, count)))?;
        if scanner.peek()? == Some(COUNT_SEPARATOR) {
            scanner.next_byte()?;
        }
        let mut seq = Sequence::from(scanner.read_exact(count)?);

        while scanner.peek()? == Some(TAG_DELIM) {
            let tag = scanner.read_quoted(TAG_DELIM)?;
            let type_name = scanner.read_quoted(TYPE_DELIM)?;
            let value = self.registry.read_value(&type_name, &mut scanner)?;
            seq.set_tag(&tag, value);
        }
        Ok(seq)
    }

    /// Decodes one sequence from the start of `bytes`.
    pub fn decode_from_slice(&self, bytes: &[u8]) -> Result<Sequence> {
        self.decode(Cursor::new(bytes))
    }
}

/// Text serialization through the process-wide registry.
impl Sequence {
    /// Writes the text form through the process-wide registry.
    pub fn write_text<W: Write>(&self, out: W) -> Result<()> {
        registry::with_global(|registry| TextCodec::new(registry).encode(self, out))
    }

    /// Returns the text form built through the process-wide registry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagseq::Sequence;
    ///
    /// let mut seq = Sequence::from("ACGT");
    /// seq.set_tag("n", 5);
    /// assert_eq!(seq.to_text().unwrap(), b"4ACGT#n#|int|5");
    /// ```
    pub fn to_text(&self) -> Result<Vec<u8>> {
        registry::with_global(|registry| TextCodec::new(registry).encode_to_vec(self))
    }

    /// Reads one sequence through the process-wide registry, leaving any
    /// trailing input unread.
    pub fn read_text<R: BufRead>(input: R) -> Result<Self> {
        registry::with_global(|registry| TextCodec::new(registry).decode(input))
    }

    /// Parses a sequence from its text form.
    pub fn from_text(bytes: &[u8]) -> Result<Self> {
        Self::read_text(Cursor::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagValue;
    use rand::Rng;

    fn codec_round_trip(seq: &Sequence) -> Sequence {
        let registry = Registry::with_builtins();
        let codec = TextCodec::new(&registry);
        let text = codec.encode_to_vec(seq).unwrap();
        codec.decode_from_slice(&text).unwrap()
    }

    #[test]
    fn test_untagged_layout() {
        assert_eq!(Sequence::from("ACGT").to_text().unwrap(), b"4ACGT");
        assert_eq!(Sequence::new().to_text().unwrap(), b"0");
    }

    #[test]
    fn test_separator_only_when_needed() {
        assert_eq!(Sequence::from("12AB").to_text().unwrap(), b"4:12AB");
        assert_eq!(Sequence::from(":x").to_text().unwrap(), b"2::x");

        for residues in ["12AB", ":x", "::", "0", "A:"] {
            let seq = Sequence::from(residues);
            assert_eq!(Sequence::from_text(&seq.to_text().unwrap()).unwrap(), seq);
        }
    }

    #[test]
    fn test_all_builtin_tags_round_trip() {
        let mut seq = Sequence::from("ACGT");
        seq.set_tag("void", TagValue::void());
        seq.set_tag("bool", true);
        seq.set_tag("int", -33);
        seq.set_tag("unsigned", 33u32);
        seq.set_tag("float", 3.14f32);
        seq.set_tag("double", 2.718281828459045);
        seq.set_tag("string", "a \"quoted\" #tag|");
        seq.set_tag("list", vec![1, -2, 3]);
        seq.set_tag("weird #name|", 1);

        let back = codec_round_trip(&seq);
        assert_eq!(back, seq);
        assert_eq!(back.tag_count(), seq.tag_count());
        assert!(back.get_tag("void").unwrap().is_void());
        assert_eq!(back.tag::<bool>("bool").unwrap(), &true);
        assert_eq!(back.tag::<i32>("int").unwrap(), &-33);
        assert_eq!(back.tag::<u32>("unsigned").unwrap(), &33);
        assert_eq!(back.tag::<f32>("float").unwrap(), &3.14f32);
        assert_eq!(back.tag::<f64>("double").unwrap(), &2.718281828459045);
        assert_eq!(back.tag::<String>("string").unwrap(), "a \"quoted\" #tag|");
        assert_eq!(back.tag::<Vec<i32>>("list").unwrap(), &vec![1, -2, 3]);
        assert_eq!(back.tag::<i32>("weird #name|").unwrap(), &1);
    }

    #[test]
    fn test_random_residues_round_trip() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let len = rng.random_range(0..300);
            let residues: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            let mut seq = Sequence::from(residues);
            if rng.random_bool(0.5) {
                seq.set_tag("n", rng.random::<i32>());
            }
            let back = codec_round_trip(&seq);
            assert_eq!(back, seq);
            assert_eq!(back.tag_count(), seq.tag_count());
        }
    }

    #[test]
    fn test_decode_stops_after_last_tag() {
        let registry = Registry::with_builtins();
        let codec = TextCodec::new(&registry);
        let mut input = Cursor::new(&b"2AC#n#|int|5\n2GT"[..]);

        let first = codec.decode(&mut input).unwrap();
        assert_eq!(first, "AC");
        assert_eq!(first.tag::<i32>("n").unwrap(), &5);

        let mut rest = Vec::new();
        std::io::Read::read_to_end(&mut input, &mut rest).unwrap();
        assert_eq!(rest, b"\n2GT");
    }

    #[test]
    fn test_unregistered_type_name_fails() {
        let result = Sequence::from_text(b"4ACGT#m#|matrix|[[1]]");
        assert!(matches!(
            result,
            Err(TagSeqError::UnregisteredType(name)) if name == "matrix"
        ));
    }

    #[test]
    fn test_unregistered_value_does_not_read_back() {
        #[derive(Clone, Debug)]
        struct Opaque;

        let mut seq = Sequence::from("AC");
        seq.set_tag("o", TagValue::new(Opaque));
        let text = seq.to_text().unwrap();
        assert_eq!(text, b"2AC#o#|unregistered|");

        assert!(matches!(
            Sequence::from_text(&text),
            Err(TagSeqError::UnregisteredType(name)) if name == "unregistered"
        ));
    }

    #[test]
    fn test_huge_residue_count_fails_cleanly() {
        assert!(matches!(
            Sequence::from_text(b"18446744073709551615A"),
            Err(TagSeqError::Parse { .. })
        ));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            Sequence::from_text(b"ACGT"),
            Err(TagSeqError::Parse { .. })
        ));
        assert!(matches!(
            Sequence::from_text(b"10ACGT"),
            Err(TagSeqError::Parse { .. })
        ));
        assert!(matches!(
            Sequence::from_text(b"4ACGT#unterminated"),
            Err(TagSeqError::Parse { .. })
        ));
        assert!(matches!(
            Sequence::from_text(b"4ACGT#n#|int|x"),
            Err(TagSeqError::Parse { .. })
        ));
    }

    #[test]
    fn test_explicit_registry_is_independent_of_global() {
        let registry = Registry::empty();
        let codec = TextCodec::new(&registry);

        let mut seq = Sequence::from("AC");
        seq.set_tag("n", 1);
        let text = codec.encode_to_vec(&seq).unwrap();
        assert_eq!(text, b"2AC#n#|unregistered|");
        assert!(matches!(
            codec.decode_from_slice(&text),
            Err(TagSeqError::UnregisteredType(_))
        ));
    }
}
