//! Key Codec Module
//!
//! Turns a call (prefix plus positional/keyword arguments) into a canonical,
//! deterministic cache key of the form `prefix:<32 hex digits>`.
//!
//! Arguments are lowered to [`ArgValue`], written in a tagged canonical
//! byte form (sorted mapping keys, explicit NaN/infinity spellings) and
//! hashed with the 128-bit XXH3 digest. The digest is for collision
//! avoidance only and carries no security guarantee.

mod serializer;
mod value;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

use crate::error::Result;

pub use value::{ArgValue, CallArgs, NumericArray};

// == Cache Key ==
/// Opaque key produced by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The prefix part, everything before the last `:`.
    pub fn prefix(&self) -> &str {
        self.0.rsplit_once(':').map_or("", |(prefix, _)| prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Encode ==
/// Encodes already-lowered arguments. Infallible: every `ArgValue` has a
/// canonical form.
pub fn encode(
    prefix: &str,
    positional: &[ArgValue],
    keyword: &BTreeMap<String, ArgValue>,
) -> CacheKey {
    let mut canonical = Vec::with_capacity(64);
    canonical.push(b'm');
    value::write_str("args", &mut canonical);
    value::write_seq(positional, &mut canonical);
    value::write_str("kwargs", &mut canonical);
    value::write_map(keyword, &mut canonical);
    canonical.push(b'e');

    CacheKey(format!("{}:{:032x}", prefix, xxh3_128(&canonical)))
}

/// Encodes a call built with [`CallArgs`], surfacing the first argument that
/// failed to lower.
pub fn generate_key(prefix: &str, mut args: CallArgs) -> Result<CacheKey> {
    if let Some(err) = args.take_error() {
        return Err(err);
    }
    Ok(encode(prefix, args.positional(), args.keyword()))
}

/// Encodes a single `Serialize` value as the full argument list, see
/// [`CallArgs::from_serialize`].
pub fn key_for<A: Serialize + ?Sized>(prefix: &str, args: &A) -> Result<CacheKey> {
    generate_key(prefix, CallArgs::from_serialize(args)?)
}
