//! The [`Handler`] trait.
//!
//! Handlers are plain async functions. The trait is implemented for
//! functions of up to 16 parameters whose types implement [`FromResolved`]
//! and whose output implements [`IntoResolved`], similar to Axum's handler
//! system. The implementation also reports the parameter and return
//! descriptors, which lets a command be checked against its declared
//! metadata before it is ever dispatched.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn roll(sides: Option<i32>, user: User) -> String {
//!     format!("{} rolled {}", user.name, fair_die(sides.unwrap_or(6)))
//! }
//!
//! assert_eq!(Handler::<(Option<i32>, User)>::parameter_types(&roll).len(), 2);
//! ```

use futures::future::BoxFuture;

use slashbind_core::{FromResolved, IntoResolved, Mismatch, Resolved, TypeDescriptor, Typed};

/// A command handler taking the parameter tuple `T`.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The handler's return type.
    type Output: IntoResolved;

    /// Returns the descriptors of the handler's parameters in order.
    fn parameter_types(&self) -> Vec<TypeDescriptor>;

    /// Returns the descriptor of the handler's return type.
    fn output_type(&self) -> TypeDescriptor {
        <Self::Output as Typed>::descriptor()
    }

    /// Calls the handler with erased arguments in parameter order.
    fn call(self, args: Vec<Resolved>) -> BoxFuture<'static, Result<Resolved, Mismatch>>;
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoResolved,
            $( $ty: FromResolved, )*
        {
            type Output = Res;

            fn parameter_types(&self) -> Vec<TypeDescriptor> {
                vec![$($ty::descriptor(),)*]
            }

            fn call(self, args: Vec<Resolved>) -> BoxFuture<'static, Result<Resolved, Mismatch>> {
                Box::pin(async move {
                    let mut args = args.into_iter();
                    $(
                        let $ty = $ty::from_resolved(args.next().ok_or_else(Mismatch::of::<$ty>)?)?;
                    )*

                    Ok((self)($($ty,)*).await.into_resolved())
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16);

#[cfg(test)]
mod tests {
    use super::*;

    fn signature<T, H: Handler<T>>(handler: &H) -> (Vec<String>, String) {
        let params = handler
            .parameter_types()
            .iter()
            .map(ToString::to_string)
            .collect();
        (params, handler.output_type().to_string())
    }

    #[test]
    fn test_parameter_types() {
        async fn greet(name: String, times: Option<i32>) -> String {
            name.repeat(times.unwrap_or(1) as usize)
        }
        let (params, output) = signature(&greet);
        assert_eq!(params, ["String", "Option<i32>"]);
        assert_eq!(output, "String");

        async fn nothing() {}
        let (params, output) = signature(&nothing);
        assert!(params.is_empty());
        assert_eq!(output, "()");
    }

    #[tokio::test]
    async fn test_call_with_erased_arguments() {
        async fn add(a: i64, b: Option<i64>) -> i64 {
            a + b.unwrap_or(0)
        }
        let args = vec![2i64.into_resolved(), Some(3i64).into_resolved()];
        let value = Handler::<(i64, Option<i64>)>::call(add, args).await.unwrap();
        assert_eq!(i64::from_resolved(value), Ok(5));
    }

    #[tokio::test]
    async fn test_wrong_argument_type_is_a_mismatch() {
        async fn echo(text: String) -> String {
            text
        }
        let err = Handler::<(String,)>::call(echo, vec![1i32.into_resolved()])
            .await
            .unwrap_err();
        assert_eq!(err.expected(), "String");

        let err = Handler::<(String,)>::call(echo, Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err, Mismatch::of::<String>());
    }
}
