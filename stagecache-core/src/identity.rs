//! Identity types for cached stages

use crate::FormatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer value reserved for the invalid id.
const INVALID_VALUE: i64 = -1;

/// Lightweight identifier for a stage held in a cache.
///
/// A `StageId` can be converted to and from `i64` and `String`, so it can be
/// carried through systems that cannot transmit arbitrary Rust values. It is
/// only meaningful against the cache that produced it (or a clone of that
/// cache). The default value is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(i64);

impl StageId {
    /// The invalid id.
    pub const INVALID: StageId = StageId(INVALID_VALUE);

    /// Create an id from an integer obtained from [`StageId::to_long_int`].
    pub const fn from_long_int(value: i64) -> Self {
        Self(value)
    }

    /// Integer representation of this id.
    pub const fn to_long_int(self) -> i64 {
        self.0
    }

    /// Parse an id from a string obtained from `to_string()`.
    pub fn from_string(s: &str) -> Result<Self, FormatError> {
        s.parse()
    }

    /// Return true unless this is the invalid id.
    pub const fn is_valid(self) -> bool {
        self.0 != INVALID_VALUE
    }
}

impl Default for StageId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StageId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|e| FormatError::InvalidStageId {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<StageId> for i64 {
    fn from(id: StageId) -> Self {
        id.0
    }
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(id: StageId) -> u64 {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        hasher.finish()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Integer and string conversions are lossless.
        #[test]
        fn prop_round_trip(value in any::<i64>()) {
            let id = StageId::from_long_int(value);
            prop_assert_eq!(StageId::from_long_int(id.to_long_int()), id);
            prop_assert_eq!(StageId::from_string(&id.to_string()).unwrap(), id);
            prop_assert_eq!(id.is_valid(), value != -1);
        }

        /// Equal ids hash equal and order like their integers.
        #[test]
        fn prop_order_and_hash_consistent(a in any::<i64>(), b in any::<i64>()) {
            let (x, y) = (StageId::from_long_int(a), StageId::from_long_int(b));
            prop_assert_eq!(x.cmp(&y), a.cmp(&b));
            if x == y {
                prop_assert_eq!(hash_of(x), hash_of(y));
            }
        }
    }
}
