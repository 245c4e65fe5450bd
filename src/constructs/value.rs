//! Type-erased tagged data.

use std::any::{Any, TypeId};
use std::fmt;

/// Values that can be stored as tagged data.
///
/// Implemented for every `Clone + Debug + Send + Sync + 'static` type, so
/// applications never implement it by hand. Storing a value is always
/// possible; serializing it requires an entry in the
/// [`Registry`](crate::Registry).
pub trait TagData: Any + Send + Sync + fmt::Debug {
    fn clone_boxed(&self) -> Box<dyn TagData>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> TagData for T
where
    T: Any + Clone + Send + Sync + fmt::Debug,
{
    fn clone_boxed(&self) -> Box<dyn TagData> {
        Box::new(self.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A single dynamically typed value attached to a [`Sequence`](crate::Sequence).
///
/// The absent ("void") value is represented by the unit type `()` and is what
/// [`Sequence::tag_mut`](crate::Sequence::tag_mut) creates for a fresh tag.
///
/// # Examples
///
/// ```rust
/// use tagseq::TagValue;
///
/// let mut value = TagValue::from(33);
/// assert_eq!(value.downcast_ref::<i32>(), Some(&33));
/// assert!(value.downcast_ref::<u32>().is_none());
///
/// value.set(vec![1, 2, 3]);
/// assert!(value.is::<Vec<i32>>());
/// ```
pub struct TagValue(Box<dyn TagData>);

impl TagValue {
    /// Wraps any cloneable, debuggable, thread-safe value.
    pub fn new<T: TagData>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// The absent value.
    pub fn void() -> Self {
        Self::new(())
    }

    /// True for the void value a missing tag is created with.
    pub fn is_void(&self) -> bool {
        self.is::<()>()
    }

    /// Replaces the held value, whatever its previous type.
    pub fn set<T: TagData>(&mut self, value: T) {
        self.0 = Box::new(value);
    }

    /// Whether the held value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Borrows the held value as a `T`, `None` for any other type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Mutably borrows the held value as a `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut()
    }

    /// Run-time identity of the held value, used for registry lookups.
    pub fn type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    pub(crate) fn as_any(&self) -> &dyn Any {
        self.0.as_any()
    }

    /// Shallow size of the held value.
    pub(crate) fn payload_size(&self) -> usize {
        std::mem::size_of_val(&*self.0)
    }
}

impl Default for TagValue {
    fn default() -> Self {
        Self::void()
    }
}

impl Clone for TagValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl fmt::Debug for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

macro_rules! impl_from_builtin {
    ($($t:ty),*) => {
        $(
            impl From<$t> for TagValue {
                fn from(value: $t) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

impl_from_builtin!((), bool, i32, u32, f32, f64, String, Vec<i32>);

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}
