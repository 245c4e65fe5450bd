//! The type registry behind the text serialization.
//!
//! A [`Registry`] holds two tables: run-time type identity to a writer that
//! renders a value as text, and type name to a reader that parses that text
//! back. The built-in types are:
//!
//! | Rust type  | Name        | Payload          |
//! |------------|-------------|------------------|
//! | `()`       | `void`      | empty            |
//! | `bool`     | `bool`      | `true` / `false` |
//! | `i32`      | `int`       | decimal          |
//! | `u32`      | `unsigned`  | decimal          |
//! | `f32`      | `float`     | decimal          |
//! | `f64`      | `double`    | decimal          |
//! | `String`   | `string`    | `"quoted"`       |
//! | `Vec<i32>` | `list<int>` | `{1,2,3,}`       |
//!
//! Registration is last-writer-wins and entries are never removed. The
//! process-wide instance returned by [`global`] is shared behind an
//! `RwLock`; register custom types during start-up, before sequences are
//! serialized concurrently.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    io::{self, Write},
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use log::{trace, warn};

use crate::{
    codec::{write_quoted, Scanner},
    Result, TagData, TagSeqError, TagValue,
};

/// Delimiter quoting a type name.
pub const TYPE_DELIM: u8 = b'|';

/// Type name written for values whose type has no registered writer.
///
/// Reading it back yields a void value.
pub const UNREGISTERED: &str = "unregistered";

type WriteFn = Arc<dyn Fn(&dyn Any, &mut dyn Write) -> io::Result<()> + Send + Sync>;
type ReadFn = Arc<dyn Fn(&mut Scanner<'_>) -> Result<TagValue> + Send + Sync>;

/// Writer and reader tables for tagged value types.
///
/// # Examples
///
/// ```rust
/// use std::io::Write;
/// use tagseq::{codec::TextCodec, Registry, Sequence};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Strand(bool);
///
/// let mut registry = Registry::with_builtins();
/// registry.register(
///     "strand",
///     |s: &Strand, out: &mut dyn Write| out.write_all(if s.0 { b"+" } else { b"-" }),
///     |scanner| Ok(Strand(scanner.next_byte()? == Some(b'+'))),
/// );
///
/// let mut seq = Sequence::from("ACGT");
/// seq.set_tag("strand", tagseq::TagValue::new(Strand(false)));
///
/// let codec = TextCodec::new(&registry);
/// let text = codec.encode_to_vec(&seq).unwrap();
/// let back = codec.decode_from_slice(&text).unwrap();
/// assert_eq!(back.tag::<Strand>("strand").unwrap(), &Strand(false));
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    writers: HashMap<TypeId, (String, WriteFn)>,
    readers: HashMap<String, ReadFn>,
}

impl Registry {
    /// Creates a registry without any entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("void", |_: &(), _| Ok(()), |_| Ok(()));
        registry.register(
            "bool",
            |x: &bool, out| write!(out, "{}", x),
            |scanner| match scanner.read_while(|b| b.is_ascii_alphanumeric())?.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(TagSeqError::parse("bool", format!("{:?}", other))),
            },
        );
        registry.register(
            "int",
            |x: &i32, out| write!(out, "{}", x),
            |scanner| scanner.parse::<i32>("int"),
        );
        registry.register(
            "unsigned",
            |x: &u32, out| write!(out, "{}", x),
            |scanner| scanner.parse::<u32>("unsigned"),
        );
        registry.register(
            "float",
            |x: &f32, out| write!(out, "{}", x),
            |scanner| scanner.parse::<f32>("float"),
        );
        registry.register(
            "double",
            |x: &f64, out| write!(out, "{}", x),
            |scanner| scanner.parse::<f64>("double"),
        );
        registry.register(
            "string",
            |s: &String, out| write_quoted(out, s, b'"'),
            |scanner| scanner.read_quoted(b'"'),
        );
        registry.register("list<int>", write_int_list, read_int_list);
        registry
    }

    /// Registers both directions for `T` under `name`.
    ///
    /// A previous entry for the same type or the same name is replaced.
    pub fn register<T, W, R>(&mut self, name: &str, writer: W, reader: R)
    where
        T: TagData,
        W: Fn(&T, &mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
        R: Fn(&mut Scanner<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.register_writer(name, writer);
        self.register_reader(name, reader);
    }

    /// Registers how values of type `T` are written, recorded under `name`.
    pub fn register_writer<T, W>(&mut self, name: &str, writer: W)
    where
        T: TagData,
        W: Fn(&T, &mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
    {
        let erased: WriteFn = Arc::new(move |any: &dyn Any, out: &mut dyn Write| {
            match any.downcast_ref::<T>() {
                Some(value) => writer(value, out),
                None => Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "value does not match its registered type",
                )),
            }
        });
        let type_name = std::any::type_name::<T>();
        if let Some((previous, _)) = self
            .writers
            .insert(TypeId::of::<T>(), (name.to_string(), erased))
        {
            warn!("Replacing writer for {type_name} (was registered as {previous:?}, now {name:?})");
        }
        trace!("Registered writer for {type_name} as {name:?}");
    }

    /// Registers how a payload recorded under `name` is read back.
    pub fn register_reader<T, R>(&mut self, name: &str, reader: R)
    where
        T: TagData,
        R: Fn(&mut Scanner<'_>) -> Result<T> + Send + Sync + 'static,
    {
        let erased: ReadFn =
            Arc::new(move |scanner: &mut Scanner<'_>| reader(scanner).map(TagValue::new));
        if self.readers.insert(name.to_string(), erased).is_some() {
            warn!("Replacing reader for type name {name:?}");
        }
        trace!("Registered reader for {name:?}");
    }

    /// Name recorded for the type of `value`, if registered.
    pub fn name_of(&self, value: &TagValue) -> Option<&str> {
        self.writers
            .get(&value.type_id())
            .map(|(name, _)| name.as_str())
    }

    /// Whether a reader is registered under `name`.
    pub fn has_reader(&self, name: &str) -> bool {
        self.readers.contains_key(name)
    }

    /// Writes the quoted type name followed by the payload of `value`.
    ///
    /// Values of an unregistered type are written as [`UNREGISTERED`] with
    /// an empty payload instead of failing. No reader exists for that name,
    /// so decoding such output fails with [`TagSeqError::UnregisteredType`].
    pub fn write_value(&self, value: &TagValue, out: &mut dyn Write) -> Result<()> {
        match self.writers.get(&value.type_id()) {
            Some((name, writer)) => {
                write_quoted(out, name, TYPE_DELIM)?;
                writer(value.as_any(), out)?;
            }
            None => {
                warn!("No writer registered for {:?}, writing it as {:?}", value, UNREGISTERED);
                write_quoted(out, UNREGISTERED, TYPE_DELIM)?;
            }
        }
        Ok(())
    }

    /// Reads a payload written for the type registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TagSeqError::UnregisteredType`] when no reader exists for
    /// `name`.
    pub fn read_value(&self, name: &str, scanner: &mut Scanner<'_>) -> Result<TagValue> {
        match self.readers.get(name) {
            Some(reader) => reader(scanner),
            None => Err(TagSeqError::UnregisteredType(name.to_string())),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.readers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("types", &names).finish()
    }
}

#[allow(clippy::ptr_arg)]
fn write_int_list(v: &Vec<i32>, out: &mut dyn Write) -> io::Result<()> {
    out.write_all(b"{")?;
    for x in v {
        write!(out, "{},", x)?;
    }
    out.write_all(b"}")
}

fn read_int_list(scanner: &mut Scanner<'_>) -> Result<Vec<i32>> {
    scanner.expect(b'{')?;
    let mut v = Vec::new();
    loop {
        if scanner.peek()? == Some(b'}') {
            scanner.next_byte()?;
            return Ok(v);
        }
        v.push(scanner.parse::<i32>("list<int>")?);
        if scanner.peek()? == Some(b',') {
            scanner.next_byte()?;
        }
    }
}

static GLOBAL: OnceLock<RwLock<Registry>> = OnceLock::new();

/// The process-wide registry, initialized with the built-ins on first use.
pub fn global() -> &'static RwLock<Registry> {
    GLOBAL.get_or_init(|| RwLock::new(Registry::with_builtins()))
}

/// Registers `T` in the process-wide registry.
///
/// See [`Registry::register`].
pub fn register<T, W, R>(name: &str, writer: W, reader: R)
where
    T: TagData,
    W: Fn(&T, &mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
    R: Fn(&mut Scanner<'_>) -> Result<T> + Send + Sync + 'static,
{
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, writer, reader);
}

/// Runs `f` with shared access to the process-wide registry.
pub(crate) fn with_global<F, O>(f: F) -> O
where
    F: FnOnce(&Registry) -> O,
{
    let guard = global().read().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
}
