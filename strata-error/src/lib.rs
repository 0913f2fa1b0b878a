#![deny(missing_docs)]

//! This crate defines error & result types for Strata.
//! It also contains a variety of useful macros for error handling.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{env, fmt};

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    #[allow(clippy::panic)]
    fn from(msg: T) -> Self {
        if env::var("STRATA_PANIC_ON_ERR").as_deref().unwrap_or("") == "1" {
            panic!("{}\nBacktrace:\n{}", msg.into(), Backtrace::capture());
        } else {
            Self(msg.into())
        }
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

// Alias of `Backtrace` so `thiserror` does not treat these fields as backtraces: that would
// generate `Error::provide`, which requires the nightly-only `error_generic_member_access`.
type CapturedBacktrace = Backtrace;

/// The top-level error type for Strata.
///
/// The variants map onto the error classes a caller of a dataframe library expects:
/// [`StrataError::InvalidArgument`] is a `ValueError`, [`StrataError::NotFound`] a `KeyError`,
/// [`StrataError::TypeMismatch`] a `TypeError`.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum StrataError {
    /// An invalid argument was provided, e.g. unsorted divisions or an unknown axis.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, CapturedBacktrace),
    /// A label, column or group key could not be found.
    #[error("{0}\nBacktrace:\n{1}")]
    NotFound(ErrString, CapturedBacktrace),
    /// An operation was applied to values of a type that does not support it.
    #[error("{0}\nBacktrace:\n{1}")]
    TypeMismatch(ErrString, CapturedBacktrace),
    /// The operation is part of the API surface but deliberately not implemented.
    #[error("function {0} not implemented\nBacktrace:\n{1}")]
    NotImplemented(ErrString, CapturedBacktrace),
    /// The task graph could not be executed, e.g. a key is missing or a task has the wrong shape.
    #[error("{0}\nBacktrace:\n{1}")]
    ComputeError(ErrString, CapturedBacktrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<StrataError>),
    /// A wrapper for errors from the Arrow library.
    #[cfg(feature = "arrow")]
    #[error("{0}\nBacktrace:\n{1}")]
    ArrowError(arrow_schema::ArrowError, CapturedBacktrace),
    /// A wrapper for errors from the jiff date-time library.
    #[error("{0}\nBacktrace:\n{1}")]
    JiffError(jiff::Error, CapturedBacktrace),
}

impl StrataError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        StrataError::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, skipping any [`StrataError::Context`] wrappers.
    pub fn unwrap_context(&self) -> &StrataError {
        match self {
            StrataError::Context(_, inner) => inner.unwrap_context(),
            other => other,
        }
    }

    /// Whether this error is, or wraps, an [`StrataError::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.unwrap_context(), StrataError::InvalidArgument(..))
    }

    /// Whether this error is, or wraps, a [`StrataError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self.unwrap_context(), StrataError::NotFound(..))
    }

    /// Whether this error is, or wraps, a [`StrataError::TypeMismatch`].
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.unwrap_context(), StrataError::TypeMismatch(..))
    }

    /// Whether this error is, or wraps, a [`StrataError::NotImplemented`].
    pub fn is_not_implemented(&self) -> bool {
        matches!(self.unwrap_context(), StrataError::NotImplemented(..))
    }
}

impl Debug for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return [`StrataError`]s as their error type.
pub type StrataResult<T> = Result<T, StrataError>;

/// A trait for unwrapping a StrataResult.
pub trait StrataUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn strata_unwrap(self) -> Self::Output;
}

impl<T, E> StrataUnwrap for Result<T, E>
where
    E: Into<StrataError>,
{
    type Output = T;

    #[inline(always)]
    fn strata_unwrap(self) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|err| strata_panic!(err))
    }
}

/// A trait for expect-ing a StrataResult or an Option.
pub trait StrataExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn strata_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> StrataExpect for Result<T, E>
where
    E: Into<StrataError>,
{
    type Output = T;

    #[inline(always)]
    fn strata_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| strata_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> StrataExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn strata_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = StrataError::InvalidArgument(
                msg.to_string().into(),
                Backtrace::capture(),
            );
            strata_panic!(err)
        })
    }
}

/// A convenient macro for creating a StrataError.
#[macro_export]
macro_rules! strata_err {
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::StrataError::Context($msg.into(), Box::new($err))
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::StrataError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strata_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a StrataError.
#[macro_export]
macro_rules! strata_bail {
    ($($tt:tt)+) => {
        return Err($crate::strata_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a StrataError in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! strata_panic {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strata_panic!($crate::strata_err!($variant: $fmt, $($arg),*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strata_panic!($crate::strata_err!($fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::StrataError = $err;
        #[allow(clippy::panic)]
        panic!("{}", err.with_context(format!($fmt, $($arg),*)));
    }};
    ($err:expr) => {{
        let err: $crate::StrataError = $err;
        #[allow(clippy::panic)]
        panic!("{}", err);
    }};
}

#[cfg(feature = "arrow")]
impl From<arrow_schema::ArrowError> for StrataError {
    fn from(value: arrow_schema::ArrowError) -> Self {
        StrataError::ArrowError(value, Backtrace::capture())
    }
}

impl From<jiff::Error> for StrataError {
    fn from(value: jiff::Error) -> Self {
        StrataError::JiffError(value, Backtrace::capture())
    }
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn must_use(error: crate::StrataError) -> crate::StrataError {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(present: bool) -> StrataResult<u8> {
        if !present {
            strata_bail!(NotFound: "column {} not found", "x");
        }
        Ok(1)
    }

    #[test]
    fn bail_with_variant() {
        let err = lookup(false).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("column x not found"));
    }

    #[test]
    fn default_variant_is_invalid_argument() {
        let err = strata_err!("divisions must be sorted: {}", "[3, 1]");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn expect_passes_through() {
        assert_eq!(lookup(true).strata_expect("present"), 1);
        assert_eq!(Some(3).strata_expect("some"), 3);
    }

    #[test]
    #[should_panic]
    fn expect_panics() {
        lookup(false).strata_expect("missing");
    }
}
