//! Stream tags: offset-addressed, keyed metadata annotations.
//!
//! A tag pins a key/value pair to an absolute position in a sample stream.
//! Blocks downstream of the tag's producer query tags by offset range and
//! react to them — retuning an oscillator, triggering further tags — without
//! any change to the sample payload itself.
//!
//! Tags are immutable once stored. Multiple tags may share an offset; their
//! relative order is the order in which they were inserted.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use num_complex::Complex32;

/// Interned symbol used for tag keys and producer identities.
///
/// Wraps an `Arc<str>`, so cloning a key is a reference-count bump and
/// comparing two clones of the same key is a pointer check. Keys compare
/// equal by string content, so independently created keys with the same
/// text still match.
///
/// # Example
///
/// ```rust
/// use senal_core::TagKey;
///
/// let a = TagKey::new("freq");
/// let b = a.clone();
/// let c = TagKey::new("freq");
/// assert_eq!(a, b);
/// assert_eq!(a, c);
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey(Arc<str>);

impl TagKey {
    /// Intern a key from a string.
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for TagKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Clones of one interned key share the allocation
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl From<&str> for TagKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag payload: a small tagged union of the value kinds blocks exchange.
///
/// Consumers that expect a particular kind coerce with the `as_*` accessors
/// and silently skip tags that do not match — stream tags are best-effort
/// metadata, and a stray tag of the wrong kind must never fault a
/// processing call.
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    /// Real number.
    Real(f64),
    /// Signed integer.
    Integer(i64),
    /// Complex number (I/Q pair).
    Complex(Complex32),
    /// Interned symbol.
    Symbol(TagKey),
    /// Pair of values, e.g. a key/value command.
    Pair(Box<TagValue>, Box<TagValue>),
}

impl TagValue {
    /// Coerce to a real number.
    ///
    /// `Real` and `Integer` values coerce; everything else returns `None`.
    #[inline]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Coerce to a symbol.
    #[inline]
    pub fn as_symbol(&self) -> Option<&TagKey> {
        match self {
            Self::Symbol(key) => Some(key),
            _ => None,
        }
    }

    /// Construct a pair value.
    pub fn pair(car: TagValue, cdr: TagValue) -> Self {
        Self::Pair(Box::new(car), Box::new(cdr))
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// A keyed annotation pinned to an absolute stream offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    /// Absolute stream position, in items since stream start.
    pub offset: u64,
    /// Annotation key.
    pub key: TagKey,
    /// Annotation payload.
    pub value: TagValue,
    /// Identity of the block that produced this tag, if recorded.
    pub producer: Option<TagKey>,
}

impl Tag {
    /// Create a tag with no recorded producer.
    pub fn new(offset: u64, key: impl Into<TagKey>, value: TagValue) -> Self {
        Self {
            offset,
            key: key.into(),
            value,
            producer: None,
        }
    }

    /// Create a tag carrying the producing block's identity.
    pub fn with_producer(
        offset: u64,
        key: impl Into<TagKey>,
        value: TagValue,
        producer: TagKey,
    ) -> Self {
        Self {
            offset,
            key: key.into(),
            value,
            producer: Some(producer),
        }
    }
}
