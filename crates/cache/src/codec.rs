//! Conversion between cached values and the bytes stored on disk.
//!
//! The cache never inspects what it stores: the caller picks a [`Codec`] and
//! the cache only moves the resulting bytes around. A value that fails to
//! decode is treated as a cache miss.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, Result};

/// Encodes values for storage, and decodes them back.
pub trait Codec {
    /// The type of value being cached.
    type Value;

    /// Convert a value into the bytes written to disk.
    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;

    /// Convert bytes read from disk back into a value.
    ///
    /// Returning an error marks the entry as corrupt.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value>;
}

/// Stores opaque bytes as-is, leaving serialization entirely to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Raw;
impl Codec for Raw {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// Stores any serde-compatible value as JSON.
pub struct Json<T>(PhantomData<fn() -> T>);
impl<T> Json<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}
impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}
impl<T> Debug for Json<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}
impl<T: Serialize + DeserializeOwned> Codec for Json<T> {
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).or_raise(|| ErrorKind::Codec)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::Codec)
    }
}
