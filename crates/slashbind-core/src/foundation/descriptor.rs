//! Explicit type descriptors used as registry keys.
//!
//! Handlers are type-indexed without reflection: every parameter and return
//! type is described by a [`TypeDescriptor`], and values travel between the
//! engine's stages as type-erased [`Resolved`] boxes.
//!
//! Generic containers are erased at their inner position. An `Option<i32>` is
//! carried as an `Option<Resolved>` whose descriptor is
//! `Option<Resolved>[i32]`, so a single wrapper rule serves every inner type.
//!
//! # Example
//!
//! ```rust,ignore
//! use slashbind_core::{FromResolved, IntoResolved, Typed};
//!
//! let desc = <Option<i32>>::descriptor();
//! assert_eq!(desc.to_string(), "Option<i32>");
//!
//! let erased = Some(7i32).into_resolved();
//! assert_eq!(<Option<i32>>::from_resolved(erased).unwrap(), Some(7));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{DeferredError, Mismatch};
use crate::foundation::deferred::Deferred;

/// A type-erased value moving between the engine's stages.
pub type Resolved = Box<dyn Any + Send>;

// ============================================================================
// Type Keys
// ============================================================================

/// Identity of a concrete Rust type.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the unqualified name without generic arguments.
    ///
    /// `alloc::string::String` becomes `String` and
    /// `core::option::Option<i32>` becomes `Option`.
    pub fn simple_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// Type Descriptors
// ============================================================================

/// Describes a (possibly parameterized) target type.
///
/// The key identifies the erased outer type; `params` describe the erased
/// positions, so `Option<Option<i32>>` is `Option[Option[i32]]`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    key: TypeKey,
    params: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// Describes the non-generic type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            params: Vec::new(),
        }
    }

    /// Describes the erased container `C` applied to `params`.
    pub fn parameterized<C: ?Sized + 'static>(params: Vec<TypeDescriptor>) -> Self {
        Self {
            key: TypeKey::of::<C>(),
            params,
        }
    }

    /// Returns the outer key.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the type parameters.
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    /// Returns the first type parameter, if any.
    pub fn first_param(&self) -> Option<&TypeDescriptor> {
        self.params.first()
    }

    /// Returns `true` if the descriptor carries type parameters.
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }

    /// Returns the simple name of the outer type.
    pub fn simple_name(&self) -> &'static str {
        self.key.simple_name()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key.simple_name())?;
        if let Some((first, rest)) = self.params.split_first() {
            write!(f, "<{first}")?;
            for param in rest {
                write!(f, ", {param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self})")
    }
}

// ============================================================================
// Typed Values
// ============================================================================

/// A type that can be described by a [`TypeDescriptor`].
pub trait Typed: Sized + Send + 'static {
    /// Returns the descriptor of `Self`.
    fn descriptor() -> TypeDescriptor;
}

/// A value that can be erased into a [`Resolved`] box.
pub trait IntoResolved: Typed {
    /// Erases the value.
    fn into_resolved(self) -> Resolved;
}

/// A value that can be recovered from a [`Resolved`] box.
pub trait FromResolved: Typed {
    /// Recovers the value, failing if the box holds another type.
    fn from_resolved(value: Resolved) -> Result<Self, Mismatch>;
}

/// Implements [`Typed`], [`IntoResolved`] and [`FromResolved`] for plain types.
///
/// Plain types are stored in the [`Resolved`] box as themselves.
///
/// ```rust,ignore
/// #[derive(Debug, Clone)]
/// struct Ticket(u32);
///
/// slashbind_core::impl_typed!(Ticket);
/// ```
#[macro_export]
macro_rules! impl_typed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Typed for $ty {
                fn descriptor() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::of::<$ty>()
                }
            }

            impl $crate::IntoResolved for $ty {
                fn into_resolved(self) -> $crate::Resolved {
                    ::std::boxed::Box::new(self)
                }
            }

            impl $crate::FromResolved for $ty {
                fn from_resolved(
                    value: $crate::Resolved,
                ) -> ::std::result::Result<Self, $crate::Mismatch> {
                    value
                        .downcast::<$ty>()
                        .map(|value| *value)
                        .map_err(|_| $crate::Mismatch::of::<$ty>())
                }
            }
        )*
    };
}

impl_typed!(
    (),
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
);

/// Downcasts a box into the erased container `C`.
pub(crate) fn downcast<C: 'static>(value: Resolved) -> Result<C, Mismatch> {
    value
        .downcast::<C>()
        .map(|value| *value)
        .map_err(|_| Mismatch::of::<C>())
}

impl<T: Typed> Typed for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::parameterized::<Option<Resolved>>(vec![T::descriptor()])
    }
}

impl<T: IntoResolved> IntoResolved for Option<T> {
    fn into_resolved(self) -> Resolved {
        Box::new(self.map(IntoResolved::into_resolved))
    }
}

impl<T: FromResolved> FromResolved for Option<T> {
    fn from_resolved(value: Resolved) -> Result<Self, Mismatch> {
        downcast::<Option<Resolved>>(value)?
            .map(T::from_resolved)
            .transpose()
    }
}

impl<T: Typed> Typed for Deferred<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::parameterized::<Deferred<Resolved>>(vec![T::descriptor()])
    }
}

impl<T: IntoResolved> IntoResolved for Deferred<T> {
    fn into_resolved(self) -> Resolved {
        Box::new(self.map(IntoResolved::into_resolved))
    }
}

impl<T: FromResolved> FromResolved for Deferred<T> {
    fn from_resolved(value: Resolved) -> Result<Self, Mismatch> {
        let inner = downcast::<Deferred<Resolved>>(value)?;
        Ok(inner.try_map(|value| T::from_resolved(value).map_err(DeferredError::from)))
    }
}

/// `Result` erases its error to text; only the success side stays typed.
impl<T, E> Typed for Result<T, E>
where
    T: Typed,
    E: fmt::Display + Send + 'static,
{
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::parameterized::<Result<Resolved, String>>(vec![T::descriptor()])
    }
}

impl<T, E> IntoResolved for Result<T, E>
where
    T: IntoResolved,
    E: fmt::Display + Send + 'static,
{
    fn into_resolved(self) -> Resolved {
        Box::new(
            self.map(IntoResolved::into_resolved)
                .map_err(|error| error.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_names() {
        assert_eq!(TypeKey::of::<String>().simple_name(), "String");
        assert_eq!(TypeKey::of::<Option<i32>>().simple_name(), "Option");
        assert_eq!(TypeKey::of::<i64>().simple_name(), "i64");
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(<Option<i32>>::descriptor().to_string(), "Option<i32>");
        assert_eq!(
            <Option<Deferred<String>>>::descriptor().to_string(),
            "Option<Deferred<String>>"
        );
        assert_eq!(<Result<(), String>>::descriptor().to_string(), "Result<()>");
    }

    #[test]
    fn test_descriptor_equality_ignores_names() {
        assert_eq!(<Option<i32>>::descriptor(), <Option<i32>>::descriptor());
        assert_ne!(<Option<i32>>::descriptor(), <Option<i64>>::descriptor());
        assert_eq!(
            <Option<i32>>::descriptor().key(),
            <Option<String>>::descriptor().key()
        );
    }

    #[test]
    fn test_option_recovers_through_erasure() {
        let erased = Some(42i32).into_resolved();
        assert_eq!(<Option<i32>>::from_resolved(erased), Ok(Some(42)));

        let erased = None::<i32>.into_resolved();
        assert_eq!(<Option<i32>>::from_resolved(erased), Ok(None));
    }

    #[test]
    fn test_mismatch_is_reported() {
        let erased = 42i64.into_resolved();
        let err = i32::from_resolved(erased).unwrap_err();
        assert_eq!(err.expected(), "i32");
    }

    #[tokio::test]
    async fn test_deferred_recovers_lazily() {
        let erased = Deferred::ready(5u8).into_resolved();
        let deferred = <Deferred<u8>>::from_resolved(erased).unwrap();
        assert_eq!(deferred.await, Ok(5));

        let erased = Deferred::ready(5u8).into_resolved();
        let deferred = <Deferred<String>>::from_resolved(erased).unwrap();
        assert!(matches!(deferred.await, Err(DeferredError::Mismatch(_))));
    }
}
