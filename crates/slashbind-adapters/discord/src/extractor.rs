//! The raw value extractor over interaction payloads.
//!
//! [`InteractionOptions`] reads the [`InteractionEvent`] stored in the
//! invocation context and looks options up among the innermost
//! sub-command's options. Options that reference entities (users, members,
//! roles, channels, attachments) carry the matching `data.resolved` objects
//! so converters can build full entities.

use serde_json::Value;
use tracing::trace;

use slashbind_core::{Extraction, Invocation, OptionKind, RawValue, RawValueExtractor};

use crate::model::interaction::InteractionEvent;

/// Extracts option values from the invocation's [`InteractionEvent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionOptions;

impl RawValueExtractor for InteractionOptions {
    fn extract(&self, name: &str, kind: OptionKind, invocation: &Invocation) -> Extraction {
        let Some(event) = invocation.context().get_ref::<InteractionEvent>() else {
            trace!(option = name, "No interaction event in context");
            return Extraction::Absent;
        };
        let Some(option) = event.option(name) else {
            return Extraction::Absent;
        };
        if option.kind != kind {
            return Extraction::KindMismatch {
                actual: option.kind,
            };
        }

        let value = option.value.clone().unwrap_or(Value::Null);
        let resolved = match &value {
            Value::String(id) => event.data.resolved.entities(kind, id),
            _ => None,
        };
        let raw = RawValue::new(name, kind, value);
        Extraction::Present(match resolved {
            Some(resolved) => raw.with_resolved(resolved),
            None => raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use slashbind_core::Identity;

    fn invocation() -> Invocation {
        let event: InteractionEvent = serde_json::from_value(json!({
            "id": "1",
            "application_id": "2",
            "type": 2,
            "token": "tok",
            "user": {"id": "3", "username": "ada"},
            "data": {
                "id": "4",
                "name": "info",
                "options": [
                    {"name": "who", "type": 6, "value": "5"},
                    {"name": "count", "type": 4, "value": 3}
                ],
                "resolved": {"users": {"5": {"id": "5", "username": "bob"}}}
            }
        }))
        .unwrap();
        event.into_invocation()
    }

    #[test]
    fn test_present_with_resolved_entities() {
        let Extraction::Present(raw) = InteractionOptions.extract("who", OptionKind::User, &invocation())
        else {
            panic!("expected the option");
        };
        assert_eq!(raw.as_snowflake(), Ok(5));
        assert!(raw.has_resolved("user"));
        assert!(!raw.has_resolved("member"));
    }

    #[test]
    fn test_kind_mismatch_and_absence() {
        let invocation = invocation();
        assert_eq!(
            InteractionOptions.extract("count", OptionKind::String, &invocation),
            Extraction::KindMismatch {
                actual: OptionKind::Integer
            }
        );
        assert_eq!(
            InteractionOptions.extract("missing", OptionKind::String, &invocation),
            Extraction::Absent
        );

        let bare = Invocation::builder("info", Identity::new(3, "ada")).build();
        assert_eq!(
            InteractionOptions.extract("count", OptionKind::Integer, &bare),
            Extraction::Absent
        );
    }
}
