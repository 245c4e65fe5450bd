//! Self-describing text serialization of sequences and their tags.

mod scanner;
mod text;

pub use scanner::{write_quoted, Scanner, ESCAPE};
pub use text::{TextCodec, COUNT_SEPARATOR, TAG_DELIM};
