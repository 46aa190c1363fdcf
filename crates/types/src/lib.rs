//! # Front Desk Types
//!
//! Validated value types shared by the front-desk crates.
//!
//! Each type checks its invariant once, at construction, so that downstream code can rely on it
//! without re-validating. Serde deserialisation goes through the same constructors.

/// Errors that can occur when creating validated values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// A numeric value fell outside its permitted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, trimming the input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None` instead of an error.
    ///
    /// Used for optional form fields such as a phone number, where the front desk submits an
    /// empty string when nothing was entered.
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A patient age in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Age(u16);

impl Age {
    pub const MAX: u16 = 150;

    /// Creates an `Age`, rejecting negative values and anything above [`Age::MAX`].
    pub fn new(years: i64) -> Result<Self, TextError> {
        if !(0..=i64::from(Self::MAX)).contains(&years) {
            return Err(TextError::OutOfRange {
                field: "age",
                min: 0,
                max: i64::from(Self::MAX),
                value: years,
            });
        }
        // Bounds checked above.
        Ok(Self(years as u16))
    }

    pub fn years(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Age {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Age {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let years = i64::deserialize(deserializer)?;
        Age::new(years).map_err(serde::de::Error::custom)
    }
}

/// A non-negative stock count for an inventory item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StockLevel(u32);

impl StockLevel {
    pub fn new(units: i64) -> Result<Self, TextError> {
        if !(0..=i64::from(u32::MAX)).contains(&units) {
            return Err(TextError::OutOfRange {
                field: "stock",
                min: 0,
                max: i64::from(u32::MAX),
                value: units,
            });
        }
        Ok(Self(units as u32))
    }

    pub fn units(self) -> u32 {
        self.0
    }
}

impl From<u32> for StockLevel {
    fn from(units: u32) -> Self {
        Self(units)
    }
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for StockLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for StockLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let units = i64::deserialize(deserializer)?;
        StockLevel::new(units).map_err(serde::de::Error::custom)
    }
}
