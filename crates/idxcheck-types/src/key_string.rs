//! Borrowed canonical key encoding.

/// A canonical index key: the key bytes plus the parallel type-information
/// buffer. Byte equality of `bytes` implies semantic key equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyString<'a> {
    bytes: &'a [u8],
    type_bits: &'a [u8],
}

impl<'a> KeyString<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8], type_bits: &'a [u8]) -> Self {
        Self { bytes, type_bits }
    }

    /// Key with an empty type-information buffer.
    #[must_use]
    pub const fn untyped(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            type_bits: &[],
        }
    }

    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub const fn type_bits(&self) -> &'a [u8] {
        self.type_bits
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
