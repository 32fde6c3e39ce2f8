//! Validated primitives shared by the MTF scan crates.
//!
//! These wrappers carry their invariant in the type so that downstream code (risk derivation,
//! wire envelopes) never has to re-check it.

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when creating a [`Score`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("score {0} is outside the range 0-100")]
    OutOfRange(u64),
}

/// An integer percentage in the closed range 0..=100.
///
/// Used for model-asserted risk scores and confidence values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// Creates a new `Score`, rejecting values above 100.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > Self::MAX {
            return Err(ScoreError::OutOfRange(u64::from(value)));
        }
        Ok(Self(value))
    }

    /// Creates a `Score`, capping values above 100.
    pub const fn clamped(value: u8) -> Self {
        if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for Score {
    type Error = ScoreError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(ScoreError::OutOfRange(value))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Score {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u64::deserialize(deserializer)?;
        Score::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when creating a [`PatientId`].
#[derive(Debug, thiserror::Error)]
pub enum PatientIdError {
    #[error("patient identifier cannot be empty")]
    Empty,
}

/// Opaque caller-supplied patient identifier.
///
/// Dashboards send either string or numeric identifiers; both are accepted on the wire and
/// normalised to a string. No format is imposed beyond being non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(input: impl AsRef<str>) -> Result<Self, PatientIdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PatientIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PatientIdVisitor;

        impl serde::de::Visitor<'_> for PatientIdVisitor {
            type Value = PatientId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-empty string or an integer patient identifier")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                PatientId::new(v).map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(PatientId(v.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(PatientId(v.to_string()))
            }
        }

        deserializer.deserialize_any(PatientIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  report  ").unwrap().as_str(), "report");
        assert!(matches!(NonEmptyText::new(" \n\t"), Err(TextError::Empty)));
    }

    #[test]
    fn score_rejects_values_above_one_hundred() {
        assert_eq!(Score::new(100).unwrap().value(), 100);
        assert_eq!(Score::new(101), Err(ScoreError::OutOfRange(101)));
        assert_eq!(Score::try_from(1_000u64), Err(ScoreError::OutOfRange(1_000)));
        assert_eq!(Score::clamped(250).value(), 100);
    }

    #[test]
    fn score_deserialises_from_integer_only_in_range() {
        let ok: Score = serde_json::from_str("87").unwrap();
        assert_eq!(ok.value(), 87);
        assert!(serde_json::from_str::<Score>("140").is_err());
        assert!(serde_json::from_str::<Score>("-1").is_err());
    }

    #[test]
    fn patient_id_accepts_strings_and_numbers() {
        let from_str: PatientId = serde_json::from_str("\"P-001\"").unwrap();
        let from_num: PatientId = serde_json::from_str("42").unwrap();
        assert_eq!(from_str.as_str(), "P-001");
        assert_eq!(from_num.as_str(), "42");
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"42\"");
    }

    #[test]
    fn patient_id_rejects_blank_and_other_types() {
        assert!(serde_json::from_str::<PatientId>("\"   \"").is_err());
        assert!(serde_json::from_str::<PatientId>("true").is_err());
        assert!(serde_json::from_str::<PatientId>("null").is_err());
    }
}
