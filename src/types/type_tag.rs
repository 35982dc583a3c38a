use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::types::signature::parse_type_expr;

/// A fully qualified struct type without type parameters,
/// e.g. `0x2::sui::SUI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub address: String,
    pub module: String,
    pub name: String,
}

impl TypeTag {
    pub fn new(
        address: impl Into<String>,
        module: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            module: module.into(),
            name: name.into(),
        }
    }

    /// Trailing type name, what lists show next to an amount
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// Same type regardless of how the address is padded
    pub fn same_type(&self, other: &TypeTag) -> bool {
        addresses_equal(&self.address, &other.address)
            && self.module == other.module
            && self.name == other.name
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)
    }
}

impl FromStr for TypeTag {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type_expr(s)?.into_type_tag()
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TypeTag::from_str(&raw).map_err(de::Error::custom)
    }
}

/// Strip the `0x` prefix and leading zeros so `0x2` and `0x0000..02` compare equal
pub fn normalize_address(address: &str) -> String {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed.to_ascii_lowercase())
    }
}

pub fn addresses_equal(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}
