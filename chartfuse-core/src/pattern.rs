//! Pattern classes and per-class parameter tables
//!
//! Detectors report a class name per detection. Known chart patterns map to
//! a closed enum; anything else is kept verbatim in [`PatternClass::Other`]
//! so it still groups correctly, and falls back to default parameters.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chart pattern class reported by a detector
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternClass {
    /// Head and shoulders reversal
    HeadAndShoulders,
    /// Double top reversal
    DoubleTop,
    /// Double bottom reversal
    DoubleBottom,
    /// Symmetric, ascending or descending triangle
    Triangle,
    /// Flag continuation
    Flag,
    /// Pennant continuation
    Pennant,
    /// Cup and handle continuation
    CupAndHandle,
    /// Rising or falling wedge
    Wedge,
    /// Price channel
    Channel,
    /// Triple top reversal
    TripleTop,
    /// Triple bottom reversal
    TripleBottom,
    /// Rounding (saucer) bottom
    RoundingBottom,
    /// Any class not listed above, by its reported name
    Other(String),
}

impl PatternClass {
    /// All known classes, in declaration order
    pub const KNOWN: [PatternClass; 12] = [
        PatternClass::HeadAndShoulders,
        PatternClass::DoubleTop,
        PatternClass::DoubleBottom,
        PatternClass::Triangle,
        PatternClass::Flag,
        PatternClass::Pennant,
        PatternClass::CupAndHandle,
        PatternClass::Wedge,
        PatternClass::Channel,
        PatternClass::TripleTop,
        PatternClass::TripleBottom,
        PatternClass::RoundingBottom,
    ];

    /// Parse a detector-reported name.
    ///
    /// Matching ignores case, spaces, underscores and hyphens, so
    /// `"Double Top"`, `"DoubleTop"` and `"double_top"` are the same class.
    pub fn from_name(name: &str) -> Self {
        let mut key = String::with_capacity(name.len());
        for c in name.chars().filter(|c| c.is_ascii_alphanumeric()) {
            key.push(c.to_ascii_lowercase());
        }

        match key.as_str() {
            "headandshoulders" => Self::HeadAndShoulders,
            "doubletop" => Self::DoubleTop,
            "doublebottom" => Self::DoubleBottom,
            "triangle" => Self::Triangle,
            "flag" => Self::Flag,
            "pennant" => Self::Pennant,
            "cupandhandle" => Self::CupAndHandle,
            "wedge" => Self::Wedge,
            "channel" => Self::Channel,
            "tripletop" => Self::TripleTop,
            "triplebottom" => Self::TripleBottom,
            "roundingbottom" => Self::RoundingBottom,
            _ => Self::Other(name.trim().to_string()),
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        match self {
            Self::HeadAndShoulders => "Head and Shoulders",
            Self::DoubleTop => "Double Top",
            Self::DoubleBottom => "Double Bottom",
            Self::Triangle => "Triangle",
            Self::Flag => "Flag",
            Self::Pennant => "Pennant",
            Self::CupAndHandle => "Cup and Handle",
            Self::Wedge => "Wedge",
            Self::Channel => "Channel",
            Self::TripleTop => "Triple Top",
            Self::TripleBottom => "Triple Bottom",
            Self::RoundingBottom => "Rounding Bottom",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Whether this is one of the known classes
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for PatternClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for PatternClass {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for PatternClass {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

// Serialized as the display name so tables can be JSON object keys.
#[cfg(feature = "serde")]
impl Serialize for PatternClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for PatternClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Per-class parameter table with an explicit default
///
/// Lookups for classes without an override return the default, so an
/// unknown class never fails a lookup.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassTable<T> {
    /// Value for classes without an override
    pub default: T,

    /// Class-specific values
    #[cfg_attr(feature = "serde", serde(default))]
    pub overrides: BTreeMap<PatternClass, T>,
}

impl<T> ClassTable<T> {
    /// Create a table holding only the default
    pub fn new(default: T) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Builder-style override
    pub fn with(mut self, class: PatternClass, value: T) -> Self {
        self.overrides.insert(class, value);
        self
    }

    /// Set or replace an override
    pub fn insert(&mut self, class: PatternClass, value: T) -> Option<T> {
        self.overrides.insert(class, value)
    }

    /// Value for `class`, falling back to the default
    pub fn get(&self, class: &PatternClass) -> &T {
        self.overrides.get(class).unwrap_or(&self.default)
    }

    /// Whether `class` has its own entry
    pub fn has_override(&self, class: &PatternClass) -> bool {
        self.overrides.contains_key(class)
    }

    /// Iterate the default followed by every override
    pub fn values(&self) -> impl Iterator<Item = &T> {
        core::iter::once(&self.default).chain(self.overrides.values())
    }
}

impl<T: Default> Default for ClassTable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_name_parsing() {
        assert_eq!(PatternClass::from_name("Double Top"), PatternClass::DoubleTop);
        assert_eq!(PatternClass::from_name("DoubleTop"), PatternClass::DoubleTop);
        assert_eq!(PatternClass::from_name("double_top"), PatternClass::DoubleTop);
        assert_eq!(PatternClass::from_name("Head-and-Shoulders"), PatternClass::HeadAndShoulders);
    }

    #[test]
    fn unknown_names_are_kept() {
        let class = PatternClass::from_name("  Bump and Run ");
        assert_eq!(class, PatternClass::Other("Bump and Run".to_string()));
        assert_eq!(class.name(), "Bump and Run");
        assert!(!class.is_known());
    }

    #[test]
    fn known_names_round_trip() {
        for class in PatternClass::KNOWN.iter() {
            assert_eq!(&PatternClass::from_name(class.name()), class);
        }
    }

    #[test]
    fn table_falls_back_to_default() {
        let table = ClassTable::new(0.5f32).with(PatternClass::Flag, 0.6);

        assert_eq!(*table.get(&PatternClass::Flag), 0.6);
        assert_eq!(*table.get(&PatternClass::Wedge), 0.5);
        assert_eq!(*table.get(&PatternClass::from_name("Mystery")), 0.5);
        assert!(table.has_override(&PatternClass::Flag));
        assert_eq!(table.values().count(), 2);
    }
}
