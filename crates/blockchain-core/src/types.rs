// blockchain-core/src/types.rs

use serde::{Deserialize, Deserializer};

/// Block number/height
pub type BlockNumber = u64;

/// `0x`-prefixed 32-byte hash as returned by the node
pub type HashHex = String;

/// `0x`-prefixed 20-byte address as returned by the node
pub type AddressHex = String;

/// Hex quantity kept as text to preserve arbitrary precision
pub type Quantity = String;

/// Treat an explicit JSON `null` the same as a missing field.
///
/// Pair with `#[serde(default)]` so both absent and null values fall back to
/// `T::default()`. A value of the wrong JSON type is still an error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
