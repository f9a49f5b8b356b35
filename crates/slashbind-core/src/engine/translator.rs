//! Argument translation: raw options to typed parameter values.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::engine::registry::TypeRegistry;
use crate::error::{TranslationError, TranslationResult};
use crate::foundation::descriptor::{Resolved, TypeDescriptor};
use crate::foundation::invocation::Invocation;
use crate::foundation::parameter::DeclaredParameter;
use crate::foundation::raw::{Extraction, OptionKind, RawValueExtractor};

/// Translates declared option parameters using the registry and an extractor.
#[derive(Clone)]
pub struct ArgumentTranslator {
    registry: TypeRegistry,
    extractor: Arc<dyn RawValueExtractor>,
}

impl ArgumentTranslator {
    /// Creates a translator.
    pub fn new(registry: TypeRegistry, extractor: Arc<dyn RawValueExtractor>) -> Self {
        Self {
            registry,
            extractor,
        }
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Translates one declared parameter for `invocation`.
    ///
    /// Wrapped types recurse on their inner type; the innermost type is read
    /// through its candidate encodings in order.
    pub fn translate(
        &self,
        parameter: &DeclaredParameter,
        invocation: &Invocation,
    ) -> TranslationResult<Resolved> {
        let name = parameter.name();
        let result = self
            .registry
            .resolve_with(parameter.target(), invocation, &mut |leaf| {
                self.convert_leaf(name, leaf, invocation)
            });
        trace!(
            parameter = name,
            target_type = %parameter.target(),
            ok = result.is_ok(),
            "Translated parameter"
        );
        result
    }

    fn convert_leaf(
        &self,
        name: &str,
        target: &TypeDescriptor,
        invocation: &Invocation,
    ) -> TranslationResult<Resolved> {
        let candidates = self.registry.candidates(target);
        if candidates.is_empty() {
            return Err(TranslationError::NoConverter {
                parameter: name.to_string(),
                target: target.to_string(),
            });
        }

        let mut actual: Option<OptionKind> = None;
        for candidate in candidates {
            match self.extractor.extract(name, candidate.kind(), invocation) {
                Extraction::Present(raw) => {
                    return candidate.convert(&raw).map_err(|e| TranslationError::TypeMismatch {
                        parameter: name.to_string(),
                        expected: target.to_string(),
                        reason: e.to_string(),
                    });
                }
                Extraction::Absent => {
                    return Err(TranslationError::NotPresent {
                        parameter: name.to_string(),
                    });
                }
                Extraction::KindMismatch { actual: kind } => {
                    trace!(
                        parameter = name,
                        expected = %candidate.kind(),
                        actual = %kind,
                        "Option kind differs, trying next encoding"
                    );
                    actual = Some(kind);
                }
            }
        }

        Err(TranslationError::TypeMismatch {
            parameter: name.to_string(),
            expected: target.to_string(),
            reason: match actual {
                Some(kind) => format!("option was sent as {kind}"),
                None => "no encoding matched".to_string(),
            },
        })
    }
}

impl fmt::Debug for ArgumentTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentTranslator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// The translation failures of one invocation, one per failing parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArguments {
    errors: Vec<TranslationError>,
}

impl InvalidArguments {
    /// Creates the failure value.
    pub fn new(errors: Vec<TranslationError>) -> Self {
        Self { errors }
    }

    /// Returns the collected errors in parameter order.
    pub fn errors(&self) -> &[TranslationError] {
        &self.errors
    }
}

impl fmt::Display for InvalidArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

crate::impl_typed!(InvalidArguments);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::registry::TypeRegistryBuilder;
    use crate::error::{ConvertError, FailureReason};
    use crate::foundation::deferred::Deferred;
    use crate::foundation::descriptor::{FromResolved, Typed};
    use crate::foundation::invocation::Identity;
    use crate::foundation::numeric::Narrowing;
    use crate::foundation::raw::{OptionMap, RawValue, StoredOptions};

    fn translator() -> ArgumentTranslator {
        let mut builder = TypeRegistryBuilder::standard();
        builder
            .register::<i32, _>(OptionKind::Integer, |raw| {
                Narrowing::Reject.narrow_i32(raw.as_long()?)
            })
            .unwrap()
            .register::<String, _>(OptionKind::String, RawValue::as_string)
            .unwrap()
            .register::<f32, _>(OptionKind::Number, |raw| {
                Narrowing::Reject.narrow_f32(raw.as_double()?)
            })
            .unwrap()
            .register_overlay::<f32, _>(OptionKind::String, |raw| {
                let text = raw.as_string()?;
                text.trim().parse::<f32>().map_err(|_| ConvertError::Parse {
                    value: text,
                    target: "f32",
                })
            })
            .unwrap();
        ArgumentTranslator::new(builder.build(), Arc::new(StoredOptions))
    }

    fn invocation(options: OptionMap) -> Invocation {
        Invocation::builder("test", Identity::new(1, "tester"))
            .context(options)
            .build()
    }

    fn translate<T: FromResolved>(
        translator: &ArgumentTranslator,
        name: &str,
        options: OptionMap,
    ) -> TranslationResult<T> {
        let parameter = DeclaredParameter::option_of::<T>(name);
        translator
            .translate(&parameter, &invocation(options))
            .map(|value| T::from_resolved(value).unwrap())
    }

    #[test]
    fn test_integer_option() {
        let options = OptionMap::new().with("count", OptionKind::Integer, json!(42));
        assert_eq!(translate::<i32>(&translator(), "count", options), Ok(42));
    }

    #[test]
    fn test_absent_optional_is_none() {
        assert_eq!(
            translate::<Option<i32>>(&translator(), "count", OptionMap::new()),
            Ok(None)
        );
    }

    #[test]
    fn test_absent_required_is_not_present() {
        let err = translate::<i32>(&translator(), "count", OptionMap::new()).unwrap_err();
        assert_eq!(
            err,
            TranslationError::NotPresent {
                parameter: "count".into()
            }
        );
    }

    #[test]
    fn test_out_of_range_is_type_mismatch() {
        let options = OptionMap::new().with("count", OptionKind::Integer, json!(1i64 << 40));
        let err = translate::<i32>(&translator(), "count", options).unwrap_err();
        assert_eq!(err.reason(), FailureReason::TypeMismatch);
        assert_eq!(err.parameter(), "count");
    }

    #[test]
    fn test_optional_does_not_hide_mismatch() {
        let options = OptionMap::new().with("count", OptionKind::Integer, json!(null));
        let err = translate::<Option<i32>>(&translator(), "count", options).unwrap_err();
        assert_eq!(err.reason(), FailureReason::TypeMismatch);
    }

    #[test]
    fn test_overlay_used_for_other_kind() {
        let translator = translator();

        let native = OptionMap::new().with("ratio", OptionKind::Number, json!(0.5));
        assert_eq!(translate::<f32>(&translator, "ratio", native), Ok(0.5));

        let overlay = OptionMap::new().with("ratio", OptionKind::String, json!("2.25"));
        assert_eq!(translate::<f32>(&translator, "ratio", overlay), Ok(2.25));

        let bad = OptionMap::new().with("ratio", OptionKind::String, json!("lots"));
        let err = translate::<f32>(&translator, "ratio", bad).unwrap_err();
        assert_eq!(err.reason(), FailureReason::TypeMismatch);
    }

    #[test]
    fn test_unmatched_kind_is_type_mismatch() {
        let options = OptionMap::new().with("count", OptionKind::Boolean, json!(true));
        let err = translate::<i32>(&translator(), "count", options).unwrap_err();
        assert!(matches!(
            err,
            TranslationError::TypeMismatch { ref reason, .. } if reason.contains("BOOLEAN")
        ));
    }

    #[test]
    fn test_unregistered_type_is_no_converter() {
        let options = OptionMap::new().with("flag", OptionKind::Boolean, json!(true));
        let err = translate::<bool>(&translator(), "flag", options).unwrap_err();
        assert_eq!(
            err,
            TranslationError::NoConverter {
                parameter: "flag".into(),
                target: "bool".into()
            }
        );
    }

    #[test]
    fn test_wrapper_law() {
        let translator = translator();
        let present = OptionMap::new().with("name", OptionKind::String, json!("ada"));

        let plain = translate::<String>(&translator, "name", present.clone());
        let wrapped = translate::<Option<String>>(&translator, "name", present);
        assert_eq!(wrapped, plain.map(Some));

        // The inner wrapper absorbs the absence; the outer one wraps that success.
        let nested = translate::<Option<Option<String>>>(&translator, "name", OptionMap::new());
        assert_eq!(nested, Ok(Some(None)));
    }

    #[test]
    fn test_wrapper_law_propagates_mismatch() {
        let translator = translator();
        let wrong_kind = || OptionMap::new().with("count", OptionKind::Boolean, json!(true));

        let plain = translate::<i32>(&translator, "count", wrong_kind()).unwrap_err();
        assert_eq!(plain.reason(), FailureReason::TypeMismatch);

        let wrapped = translate::<Option<i32>>(&translator, "count", wrong_kind());
        assert_eq!(wrapped, Err(plain.clone()));
        let nested = translate::<Option<Option<i32>>>(&translator, "count", wrong_kind());
        assert_eq!(nested, Err(plain));
    }

    #[tokio::test]
    async fn test_deferred_parameter() {
        let options = OptionMap::new().with("count", OptionKind::Integer, json!(7));
        let deferred = translate::<Deferred<i32>>(&translator(), "count", options).unwrap();
        assert_eq!(deferred.await, Ok(7));

        let err = translate::<Deferred<i32>>(&translator(), "count", OptionMap::new()).unwrap_err();
        assert_eq!(err.reason(), FailureReason::NotPresent);
    }

    #[test]
    fn test_invalid_arguments_display() {
        let failure = InvalidArguments::new(vec![
            TranslationError::NotPresent {
                parameter: "a".into(),
            },
            TranslationError::NotPresent {
                parameter: "b".into(),
            },
        ]);
        assert_eq!(failure.to_string(), "`a` is not present; `b` is not present");
        assert_eq!(<InvalidArguments as Typed>::descriptor().simple_name(), "InvalidArguments");
    }
}
