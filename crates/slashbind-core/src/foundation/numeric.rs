//! Numeric narrowing policy.

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ConvertResult};

/// How converters handle values that do not fit a narrower target type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Narrowing {
    /// Out-of-range values fail the conversion.
    #[default]
    Reject,
    /// Out-of-range values are clamped to the nearest bound.
    Saturate,
}

impl Narrowing {
    /// Narrows an `i64` to `i32`.
    pub fn narrow_i32(self, value: i64) -> ConvertResult<i32> {
        match i32::try_from(value) {
            Ok(v) => Ok(v),
            Err(_) => match self {
                Self::Reject => Err(ConvertError::OutOfRange {
                    value: value.to_string(),
                    target: "i32",
                }),
                Self::Saturate => Ok(if value < 0 { i32::MIN } else { i32::MAX }),
            },
        }
    }

    /// Narrows an `f64` to `f32`. Non-finite input is always rejected.
    pub fn narrow_f32(self, value: f64) -> ConvertResult<f32> {
        let out_of_range = || ConvertError::OutOfRange {
            value: value.to_string(),
            target: "f32",
        };
        if !value.is_finite() {
            return Err(out_of_range());
        }
        let max = f64::from(f32::MAX);
        if value.abs() <= max {
            return Ok(value as f32);
        }
        match self {
            Self::Reject => Err(out_of_range()),
            Self::Saturate => Ok(if value < 0.0 { f32::MIN } else { f32::MAX }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_in_range() {
        assert_eq!(Narrowing::Reject.narrow_i32(42), Ok(42));
        assert_eq!(Narrowing::Reject.narrow_i32(-7), Ok(-7));
    }

    #[test]
    fn test_i32_out_of_range() {
        let big = i64::from(i32::MAX) + 1;
        assert!(matches!(
            Narrowing::Reject.narrow_i32(big),
            Err(ConvertError::OutOfRange { target: "i32", .. })
        ));
        assert_eq!(Narrowing::Saturate.narrow_i32(big), Ok(i32::MAX));
        assert_eq!(Narrowing::Saturate.narrow_i32(i64::MIN), Ok(i32::MIN));
    }

    #[test]
    fn test_f32() {
        assert_eq!(Narrowing::Reject.narrow_f32(1.5), Ok(1.5));
        assert!(Narrowing::Reject.narrow_f32(1e300).is_err());
        assert_eq!(Narrowing::Saturate.narrow_f32(-1e300), Ok(f32::MIN));
        assert!(Narrowing::Saturate.narrow_f32(f64::NAN).is_err());
    }

    #[test]
    fn test_serde_names() {
        let policy: Narrowing = serde_json::from_str("\"saturate\"").unwrap();
        assert_eq!(policy, Narrowing::Saturate);
        assert_eq!(Narrowing::default(), Narrowing::Reject);
    }
}
