mod sequence;
mod value;
mod view;

pub use sequence::{Sequence, DEFAULT_FILL, DESC_TAG, ID_TAG, QUALITY_TAG};
pub use value::{TagData, TagValue};
pub use view::SeqView;
