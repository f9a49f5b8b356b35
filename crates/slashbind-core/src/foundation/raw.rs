//! Raw option values and the extractor boundary.
//!
//! The engine never parses platform payloads itself. A [`RawValueExtractor`]
//! looks up a named option for a requested [`OptionKind`] and returns an
//! untyped [`RawValue`]; converters then coerce it into the target type.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{ConvertError, ConvertResult};
use crate::foundation::invocation::Invocation;

// ============================================================================
// Option Kinds
// ============================================================================

/// The raw kind of a command option, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionKind {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

/// An option type code outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown option kind {0}")]
pub struct UnknownOptionKind(pub u8);

impl OptionKind {
    /// Returns the wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::SubCommand => 1,
            Self::SubCommandGroup => 2,
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
            Self::User => 6,
            Self::Channel => 7,
            Self::Role => 8,
            Self::Mentionable => 9,
            Self::Number => 10,
            Self::Attachment => 11,
        }
    }

    /// Returns the upper-case kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubCommand => "SUB_COMMAND",
            Self::SubCommandGroup => "SUB_COMMAND_GROUP",
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::User => "USER",
            Self::Channel => "CHANNEL",
            Self::Role => "ROLE",
            Self::Mentionable => "MENTIONABLE",
            Self::Number => "NUMBER",
            Self::Attachment => "ATTACHMENT",
        }
    }

    /// Returns `true` for kinds that group other options.
    pub fn is_group(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }
}

impl TryFrom<u8> for OptionKind {
    type Error = UnknownOptionKind;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Self::SubCommand,
            2 => Self::SubCommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            7 => Self::Channel,
            8 => Self::Role,
            9 => Self::Mentionable,
            10 => Self::Number,
            11 => Self::Attachment,
            other => return Err(UnknownOptionKind(other)),
        })
    }
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> Self {
        kind.code()
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Raw Values
// ============================================================================

/// An untyped option value taken from the platform payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue {
    name: String,
    kind: OptionKind,
    value: Value,
    resolved: Option<Value>,
}

impl RawValue {
    /// Creates a raw value.
    pub fn new(name: impl Into<String>, kind: OptionKind, value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            resolved: None,
        }
    }

    /// Attaches the resolved entities referenced by this option.
    ///
    /// `resolved` is an object keyed by entity name (`user`, `member`, `role`,
    /// `channel`, `attachment`).
    pub fn with_resolved(mut self, resolved: Value) -> Self {
        self.resolved = Some(resolved);
        self
    }

    /// Returns the option name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind the payload declared for this option.
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Returns the raw JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Reads the value as text.
    pub fn as_string(&self) -> ConvertResult<String> {
        match &self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Err(ConvertError::Null),
            other => Err(ConvertError::unexpected("a string", other)),
        }
    }

    /// Reads the value as a signed 64-bit integer.
    pub fn as_long(&self) -> ConvertResult<i64> {
        match &self.value {
            Value::Number(n) => n.as_i64().ok_or_else(|| ConvertError::OutOfRange {
                value: n.to_string(),
                target: "i64",
            }),
            Value::String(s) => s.trim().parse().map_err(|_| ConvertError::Parse {
                value: s.clone(),
                target: "i64",
            }),
            Value::Null => Err(ConvertError::Null),
            other => Err(ConvertError::unexpected("an integer", other)),
        }
    }

    /// Reads the value as a double.
    pub fn as_double(&self) -> ConvertResult<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64().ok_or_else(|| ConvertError::OutOfRange {
                value: n.to_string(),
                target: "f64",
            }),
            Value::String(s) => s.trim().parse().map_err(|_| ConvertError::Parse {
                value: s.clone(),
                target: "f64",
            }),
            Value::Null => Err(ConvertError::Null),
            other => Err(ConvertError::unexpected("a number", other)),
        }
    }

    /// Reads the value as a boolean.
    pub fn as_bool(&self) -> ConvertResult<bool> {
        match &self.value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => s.trim().parse().map_err(|_| ConvertError::Parse {
                value: s.clone(),
                target: "bool",
            }),
            Value::Null => Err(ConvertError::Null),
            other => Err(ConvertError::unexpected("a boolean", other)),
        }
    }

    /// Reads the value as an entity id. Ids arrive as strings or numbers.
    pub fn as_snowflake(&self) -> ConvertResult<u64> {
        match &self.value {
            Value::String(s) => s.parse().map_err(|_| ConvertError::Parse {
                value: s.clone(),
                target: "snowflake",
            }),
            Value::Number(n) => n.as_u64().ok_or_else(|| ConvertError::OutOfRange {
                value: n.to_string(),
                target: "snowflake",
            }),
            Value::Null => Err(ConvertError::Null),
            other => Err(ConvertError::unexpected("a snowflake", other)),
        }
    }

    /// Deserializes a resolved entity attached to this option.
    pub fn resolved_entity<T: DeserializeOwned>(&self, entity: &'static str) -> ConvertResult<T> {
        let value = self
            .resolved
            .as_ref()
            .and_then(|resolved| resolved.get(entity))
            .ok_or(ConvertError::Unresolved(entity))?;
        serde_json::from_value(value.clone()).map_err(|e| ConvertError::Entity {
            entity,
            reason: e.to_string(),
        })
    }

    /// Returns `true` if the given resolved entity is attached.
    pub fn has_resolved(&self, entity: &str) -> bool {
        self.resolved
            .as_ref()
            .is_some_and(|resolved| resolved.get(entity).is_some())
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Outcome of looking up a named option.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The option is present under the requested kind.
    Present(RawValue),
    /// The option is not in the payload.
    Absent,
    /// The option is present, but under another kind.
    KindMismatch {
        /// The kind the payload actually carries.
        actual: OptionKind,
    },
}

/// Looks up named options in the platform payload of an invocation.
pub trait RawValueExtractor: Send + Sync {
    /// Returns the option `name` if the payload holds it as `kind`.
    fn extract(&self, name: &str, kind: OptionKind, invocation: &Invocation) -> Extraction;
}

/// A platform-neutral option table, stored in the invocation context.
///
/// Read by [`StoredOptions`]; useful for platforms without a structured
/// payload and for tests.
#[derive(Debug, Clone, Default)]
pub struct OptionMap {
    options: HashMap<String, RawValue>,
}

impl OptionMap {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option.
    pub fn with(mut self, name: impl Into<String>, kind: OptionKind, value: Value) -> Self {
        self.insert(RawValue::new(name, kind, value));
        self
    }

    /// Adds a prebuilt raw value.
    pub fn insert(&mut self, raw: RawValue) {
        self.options.insert(raw.name.clone(), raw);
    }

    /// Returns the option with the given name.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.options.get(name)
    }

    /// Returns the number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if there are no options.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Extractor reading the [`OptionMap`] stored in the invocation context.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredOptions;

impl RawValueExtractor for StoredOptions {
    fn extract(&self, name: &str, kind: OptionKind, invocation: &Invocation) -> Extraction {
        let Some(options) = invocation.context().get_ref::<OptionMap>() else {
            return Extraction::Absent;
        };
        match options.get(name) {
            Some(raw) if raw.kind() == kind => Extraction::Present(raw.clone()),
            Some(raw) => Extraction::KindMismatch { actual: raw.kind() },
            None => Extraction::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::foundation::invocation::Identity;

    #[test]
    fn test_kind_codes() {
        for code in 1..=11u8 {
            let kind = OptionKind::try_from(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(OptionKind::try_from(12), Err(UnknownOptionKind(12)));
        assert_eq!(OptionKind::Number.to_string(), "NUMBER");

        let kind: OptionKind = serde_json::from_value(json!(4)).unwrap();
        assert_eq!(kind, OptionKind::Integer);
    }

    #[test]
    fn test_accessors() {
        let raw = RawValue::new("count", OptionKind::Integer, json!(42));
        assert_eq!(raw.as_long(), Ok(42));
        assert_eq!(raw.as_double(), Ok(42.0));
        assert!(matches!(
            raw.as_string(),
            Err(ConvertError::Unexpected { .. })
        ));

        let raw = RawValue::new("ratio", OptionKind::String, json!("1.5x"));
        assert!(matches!(raw.as_double(), Err(ConvertError::Parse { .. })));

        let raw = RawValue::new("flag", OptionKind::Boolean, Value::Null);
        assert_eq!(raw.as_bool(), Err(ConvertError::Null));

        let raw = RawValue::new("user", OptionKind::User, json!("80351110224678912"));
        assert_eq!(raw.as_snowflake(), Ok(80351110224678912));
    }

    #[test]
    fn test_resolved_entity() {
        #[derive(Deserialize)]
        struct Named {
            name: String,
        }

        let raw = RawValue::new("role", OptionKind::Role, json!("1"))
            .with_resolved(json!({ "role": { "name": "mods" } }));
        let named: Named = raw.resolved_entity("role").unwrap();
        assert_eq!(named.name, "mods");
        assert!(matches!(
            raw.resolved_entity::<Named>("user"),
            Err(ConvertError::Unresolved("user"))
        ));
    }

    #[test]
    fn test_stored_options_extractor() {
        let options = OptionMap::new().with("count", OptionKind::Integer, json!(3));
        let invocation = Invocation::builder("roll", Identity::new(1, "alice"))
            .context(options)
            .build();

        assert!(matches!(
            StoredOptions.extract("count", OptionKind::Integer, &invocation),
            Extraction::Present(_)
        ));
        assert_eq!(
            StoredOptions.extract("count", OptionKind::String, &invocation),
            Extraction::KindMismatch {
                actual: OptionKind::Integer
            }
        );
        assert_eq!(
            StoredOptions.extract("sides", OptionKind::Integer, &invocation),
            Extraction::Absent
        );
    }
}
