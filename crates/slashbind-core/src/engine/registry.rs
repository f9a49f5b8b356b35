//! The type conversion registry.
//!
//! Maps target types to ordered lists of raw encodings (a primary converter
//! followed by overlays) and generic container types to wrapper rules. The
//! registry is assembled once through [`TypeRegistryBuilder`] and then frozen
//! into an `Arc`-shared [`TypeRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Absence, ConvertResult, RegistryError, RegistryResult};
use crate::foundation::deferred::Deferred;
use crate::foundation::descriptor::{IntoResolved, Resolved, TypeDescriptor, TypeKey};
use crate::foundation::invocation::Invocation;
use crate::foundation::raw::{OptionKind, RawValue};

/// A converter from a raw value to an erased target value.
pub type ConvertFn = Arc<dyn Fn(&RawValue) -> ConvertResult<Resolved> + Send + Sync>;

/// Maps a wrapper descriptor to the descriptor of its inner value.
pub type UnwrapFn = Arc<dyn Fn(&TypeDescriptor) -> Option<TypeDescriptor> + Send + Sync>;

/// Wraps a resolved inner value into the container.
pub type WrapFn = Arc<dyn Fn(Resolved, &Invocation) -> Resolved + Send + Sync>;

/// Produces the container's empty value.
pub type EmptyFn = Arc<dyn Fn() -> Resolved + Send + Sync>;

// ============================================================================
// Entries
// ============================================================================

/// One raw encoding of a target type.
#[derive(Clone)]
pub struct ConverterEntry {
    target: TypeDescriptor,
    kind: OptionKind,
    overlay: bool,
    convert: ConvertFn,
}

impl ConverterEntry {
    /// Returns the target type.
    pub fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    /// Returns the raw kind this encoding reads.
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Returns `true` for overlay encodings.
    pub fn is_overlay(&self) -> bool {
        self.overlay
    }

    /// Runs the converter.
    pub fn convert(&self, raw: &RawValue) -> ConvertResult<Resolved> {
        (self.convert)(raw)
    }
}

impl fmt::Debug for ConverterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterEntry")
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

/// A generic container rule.
///
/// `wrap` is total over any inner value produced. A wrapper with an empty
/// value recovers from absence: when the inner value is not present, the
/// container resolves to its empty value instead of failing.
#[derive(Clone)]
pub struct WrapperEntry {
    container: TypeKey,
    unwrap: UnwrapFn,
    wrap: WrapFn,
    empty: Option<EmptyFn>,
}

impl WrapperEntry {
    /// Creates a wrapper rule for the erased container type.
    pub fn new<U, W>(container: TypeKey, unwrap: U, wrap: W) -> Self
    where
        U: Fn(&TypeDescriptor) -> Option<TypeDescriptor> + Send + Sync + 'static,
        W: Fn(Resolved, &Invocation) -> Resolved + Send + Sync + 'static,
    {
        Self {
            container,
            unwrap: Arc::new(unwrap),
            wrap: Arc::new(wrap),
            empty: None,
        }
    }

    /// Sets the value used when the inner value is absent.
    pub fn on_absent<E>(mut self, empty: E) -> Self
    where
        E: Fn() -> Resolved + Send + Sync + 'static,
    {
        self.empty = Some(Arc::new(empty));
        self
    }

    /// The `Option` rule: absence resolves to `None`.
    pub fn optional() -> Self {
        Self::new(
            TypeKey::of::<Option<Resolved>>(),
            |desc| desc.first_param().cloned(),
            |value, _| -> Resolved { Box::new(Some(value)) },
        )
        .on_absent(|| -> Resolved { Box::new(None::<Resolved>) })
    }

    /// The `Deferred` rule: the handler receives a future tied to the
    /// invocation's cancellation token.
    pub fn deferred() -> Self {
        Self::new(
            TypeKey::of::<Deferred<Resolved>>(),
            |desc| desc.first_param().cloned(),
            |value, invocation| -> Resolved {
                Box::new(Deferred::ready(value).with_cancellation(invocation.token().clone()))
            },
        )
    }

    /// Returns the container key.
    pub fn container(&self) -> TypeKey {
        self.container
    }

    /// Returns the inner descriptor of `desc`.
    pub fn inner(&self, desc: &TypeDescriptor) -> Option<TypeDescriptor> {
        (self.unwrap)(desc)
    }

    /// Wraps an inner value.
    pub fn wrap(&self, value: Resolved, invocation: &Invocation) -> Resolved {
        (self.wrap)(value, invocation)
    }

    /// Returns the empty value, if this wrapper recovers from absence.
    pub fn empty(&self) -> Option<Resolved> {
        self.empty.as_ref().map(|empty| empty())
    }

    /// Returns `true` if this wrapper recovers from absence.
    pub fn recovers_absence(&self) -> bool {
        self.empty.is_some()
    }
}

impl fmt::Debug for WrapperEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperEntry")
            .field("container", &self.container)
            .field("recovers_absence", &self.recovers_absence())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects converter and wrapper registrations during startup.
#[derive(Default)]
pub struct TypeRegistryBuilder {
    converters: HashMap<TypeDescriptor, Vec<ConverterEntry>>,
    wrappers: HashMap<TypeKey, WrapperEntry>,
}

impl TypeRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the `Option` and `Deferred` wrappers.
    pub fn standard() -> Self {
        let mut builder = Self::new();
        builder.wrappers.insert(
            TypeKey::of::<Option<Resolved>>(),
            WrapperEntry::optional(),
        );
        builder.wrappers.insert(
            TypeKey::of::<Deferred<Resolved>>(),
            WrapperEntry::deferred(),
        );
        builder
    }

    /// Registers the primary converter of `T`.
    ///
    /// Fails with [`RegistryError::DuplicateType`] if `T` already has one.
    pub fn register<T, F>(&mut self, kind: OptionKind, convert: F) -> RegistryResult<&mut Self>
    where
        T: IntoResolved,
        F: Fn(&RawValue) -> ConvertResult<T> + Send + Sync + 'static,
    {
        let target = T::descriptor();
        if self.converters.contains_key(&target) {
            return Err(RegistryError::DuplicateType {
                target: target.to_string(),
                kind,
            });
        }
        debug!(target_type = %target, %kind, "Registered converter");
        let entry = Self::entry::<T, F>(target.clone(), kind, false, convert);
        self.converters.insert(target, vec![entry]);
        Ok(self)
    }

    /// Registers an alternate encoding of `T`.
    ///
    /// The primary converter stays first. Fails with
    /// [`RegistryError::MissingPrimary`] if `T` has no primary converter and
    /// with [`RegistryError::DuplicateType`] if `T` already reads `kind`.
    pub fn register_overlay<T, F>(
        &mut self,
        kind: OptionKind,
        convert: F,
    ) -> RegistryResult<&mut Self>
    where
        T: IntoResolved,
        F: Fn(&RawValue) -> ConvertResult<T> + Send + Sync + 'static,
    {
        let target = T::descriptor();
        let Some(entries) = self.converters.get_mut(&target) else {
            return Err(RegistryError::MissingPrimary {
                target: target.to_string(),
            });
        };
        if entries.iter().any(|entry| entry.kind == kind) {
            return Err(RegistryError::DuplicateType {
                target: target.to_string(),
                kind,
            });
        }
        debug!(target_type = %target, %kind, "Registered overlay");
        entries.push(Self::entry::<T, F>(target, kind, true, convert));
        Ok(self)
    }

    /// Registers a container rule.
    pub fn register_wrapper(&mut self, wrapper: WrapperEntry) -> RegistryResult<&mut Self> {
        let container = wrapper.container();
        if self.wrappers.contains_key(&container) {
            return Err(RegistryError::DuplicateWrapper {
                wrapper: container.simple_name().to_string(),
            });
        }
        debug!(wrapper = container.simple_name(), "Registered wrapper");
        self.wrappers.insert(container, wrapper);
        Ok(self)
    }

    /// Freezes the registrations.
    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            converters: Arc::new(self.converters),
            wrappers: Arc::new(self.wrappers),
        }
    }

    fn entry<T, F>(target: TypeDescriptor, kind: OptionKind, overlay: bool, convert: F) -> ConverterEntry
    where
        T: IntoResolved,
        F: Fn(&RawValue) -> ConvertResult<T> + Send + Sync + 'static,
    {
        ConverterEntry {
            target,
            kind,
            overlay,
            convert: Arc::new(move |raw: &RawValue| convert(raw).map(IntoResolved::into_resolved)),
        }
    }
}

// ============================================================================
// Frozen Registry
// ============================================================================

/// The frozen converter and wrapper tables. Cheap to clone.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    converters: Arc<HashMap<TypeDescriptor, Vec<ConverterEntry>>>,
    wrappers: Arc<HashMap<TypeKey, WrapperEntry>>,
}

impl TypeRegistry {
    /// Returns the primary converter of `target`.
    pub fn resolve_converter(&self, target: &TypeDescriptor) -> Option<&ConverterEntry> {
        self.candidates(target).first()
    }

    /// Returns the encodings of `target`: the primary, then overlays in
    /// registration order.
    pub fn candidates(&self, target: &TypeDescriptor) -> &[ConverterEntry] {
        self.converters
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the wrapper rule matching the outer type of `desc`.
    pub fn resolve_wrapper(&self, desc: &TypeDescriptor) -> Option<&WrapperEntry> {
        if !desc.is_parameterized() {
            return None;
        }
        self.wrappers.get(&desc.key())
    }

    /// Strips every registered wrapper from `desc`.
    pub fn leaf(&self, desc: &TypeDescriptor) -> TypeDescriptor {
        let mut current = desc.clone();
        while let Some(inner) = self
            .resolve_wrapper(&current)
            .and_then(|wrapper| wrapper.inner(&current))
        {
            current = inner;
        }
        current
    }

    /// Returns `true` if `desc` has a converter path.
    pub fn supports(&self, desc: &TypeDescriptor) -> bool {
        !self.candidates(&self.leaf(desc)).is_empty()
    }

    /// Returns the first raw kind of `desc` that the caller can emit.
    ///
    /// Used when publishing command schemas.
    pub fn preferred_kind(
        &self,
        desc: &TypeDescriptor,
        supported: &[OptionKind],
    ) -> Option<OptionKind> {
        self.candidates(&self.leaf(desc))
            .iter()
            .map(ConverterEntry::kind)
            .find(|kind| supported.contains(kind))
    }

    /// Resolves `target` through the wrapper rules, calling `leaf` for the
    /// innermost type.
    ///
    /// On success every wrapper wraps the inner value. Failures propagate
    /// unchanged, except absence, which a wrapper with an empty value turns
    /// into that value.
    pub fn resolve_with<E, F>(
        &self,
        target: &TypeDescriptor,
        invocation: &Invocation,
        leaf: &mut F,
    ) -> Result<Resolved, E>
    where
        E: Absence,
        F: FnMut(&TypeDescriptor) -> Result<Resolved, E>,
    {
        let Some((wrapper, inner)) = self
            .resolve_wrapper(target)
            .and_then(|wrapper| wrapper.inner(target).map(|inner| (wrapper, inner)))
        else {
            return leaf(target);
        };

        match self.resolve_with(&inner, invocation, leaf) {
            Ok(value) => Ok(wrapper.wrap(value, invocation)),
            Err(error) if error.is_absent() => wrapper.empty().ok_or(error),
            Err(error) => Err(error),
        }
    }

    /// Returns the number of types with converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns `true` if no converters are registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("converters", &self.converters.len())
            .field("wrappers", &self.wrappers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::NotPresent;
    use crate::foundation::descriptor::{FromResolved, Typed};
    use crate::foundation::invocation::Identity;

    fn registry() -> TypeRegistry {
        let mut builder = TypeRegistryBuilder::standard();
        builder
            .register::<i64, _>(OptionKind::Integer, RawValue::as_long)
            .unwrap()
            .register::<f32, _>(OptionKind::Number, |raw| Ok(raw.as_double()? as f32))
            .unwrap()
            .register_overlay::<f32, _>(OptionKind::String, |raw| Ok(raw.as_double()? as f32))
            .unwrap();
        builder.build()
    }

    fn invocation() -> Invocation {
        Invocation::builder("test", Identity::new(1, "tester")).build()
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let mut builder = TypeRegistryBuilder::new();
        builder
            .register::<i64, _>(OptionKind::Integer, RawValue::as_long)
            .unwrap();
        let err = builder
            .register::<i64, _>(OptionKind::String, RawValue::as_long)
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateType { .. }));
    }

    #[test]
    fn test_overlay_requires_primary() {
        let mut builder = TypeRegistryBuilder::new();
        let err = builder
            .register_overlay::<f32, _>(OptionKind::String, |_| Ok(0.0f32))
            .err()
            .unwrap();
        assert_eq!(
            err,
            RegistryError::MissingPrimary {
                target: "f32".into()
            }
        );
    }

    #[test]
    fn test_overlay_with_same_kind_is_duplicate() {
        let mut builder = TypeRegistryBuilder::new();
        builder
            .register::<f32, _>(OptionKind::Number, |_| Ok(0.0f32))
            .unwrap();
        let err = builder
            .register_overlay::<f32, _>(OptionKind::Number, |_| Ok(1.0f32))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateType { .. }));
    }

    #[test]
    fn test_duplicate_wrapper_is_rejected() {
        let mut builder = TypeRegistryBuilder::standard();
        let err = builder
            .register_wrapper(WrapperEntry::optional())
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateWrapper { .. }));
    }

    #[test]
    fn test_candidates_keep_primary_first() {
        let registry = registry();
        let kinds: Vec<_> = registry
            .candidates(&f32::descriptor())
            .iter()
            .map(|entry| (entry.kind(), entry.is_overlay()))
            .collect();
        assert_eq!(
            kinds,
            [(OptionKind::Number, false), (OptionKind::String, true)]
        );
    }

    #[test]
    fn test_resolve_converter_is_deterministic() {
        let registry = registry();
        let first = registry.resolve_converter(&f32::descriptor()).unwrap().kind();
        for _ in 0..10 {
            let again = registry.resolve_converter(&f32::descriptor()).unwrap().kind();
            assert_eq!(first, again);
        }
        assert!(registry.resolve_converter(&bool::descriptor()).is_none());
    }

    #[test]
    fn test_preferred_kind_unwraps_and_filters() {
        let registry = registry();
        let desc = <Option<f32>>::descriptor();
        assert_eq!(
            registry.preferred_kind(&desc, &[OptionKind::Number, OptionKind::String]),
            Some(OptionKind::Number)
        );
        assert_eq!(
            registry.preferred_kind(&desc, &[OptionKind::String]),
            Some(OptionKind::String)
        );
        assert_eq!(registry.preferred_kind(&desc, &[OptionKind::Boolean]), None);
    }

    #[test]
    fn test_supports_through_wrappers() {
        let registry = registry();
        assert!(registry.supports(&<Option<Option<i64>>>::descriptor()));
        assert!(!registry.supports(&<Option<String>>::descriptor()));
        assert_eq!(
            registry.leaf(&<Deferred<Option<i64>>>::descriptor()),
            i64::descriptor()
        );
    }

    #[test]
    fn test_resolve_with_wraps_success() {
        let registry = registry();
        let invocation = invocation();
        let value = registry
            .resolve_with::<NotPresent, _>(
                &<Option<i64>>::descriptor(),
                &invocation,
                &mut |_| Ok(Box::new(9i64) as Resolved),
            )
            .unwrap();
        assert_eq!(<Option<i64>>::from_resolved(value), Ok(Some(9)));
    }

    #[test]
    fn test_resolve_with_recovers_absence_only_for_optional() {
        let registry = registry();
        let invocation = invocation();

        let value = registry
            .resolve_with(&<Option<i64>>::descriptor(), &invocation, &mut |_| {
                Err(NotPresent::named("i64"))
            })
            .unwrap();
        assert_eq!(<Option<i64>>::from_resolved(value), Ok(None));

        let err = registry
            .resolve_with(&<Deferred<i64>>::descriptor(), &invocation, &mut |_| {
                Err(NotPresent::named("i64"))
            })
            .err()
            .unwrap();
        assert_eq!(err, NotPresent::named("i64"));
    }

    #[tokio::test]
    async fn test_deferred_wrapper_resolves_inner() {
        let registry = registry();
        let invocation = invocation();
        let raw = RawValue::new("n", OptionKind::Integer, json!(3));
        let value = registry
            .resolve_with::<NotPresent, _>(
                &<Deferred<i64>>::descriptor(),
                &invocation,
                &mut |leaf| Ok(registry.resolve_converter(leaf).unwrap().convert(&raw).unwrap()),
            )
            .unwrap();
        let deferred = <Deferred<i64>>::from_resolved(value).unwrap();
        assert_eq!(deferred.await, Ok(3));
    }
}
