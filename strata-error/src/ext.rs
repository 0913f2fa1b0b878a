use crate::StrataResult;

/// Extension trait for nested [`StrataResult`]s.
pub trait ResultExt<T>: private::Sealed {
    /// Flatten a nested [`StrataResult`]. Helper function until <https://github.com/rust-lang/rust/issues/70142> is stabilized.
    fn flatten(self) -> StrataResult<T>;
}

/// Attach a message to a failed [`StrataResult`].
pub trait ContextExt<T>: private::Sealed {
    /// Wrap the error, if any, in [`crate::StrataError::Context`].
    fn context<S: Into<String>>(self, msg: S) -> StrataResult<T>;
}

mod private {
    use crate::StrataResult;

    pub trait Sealed {}

    impl<T> Sealed for StrataResult<T> {}
}

impl<T> ResultExt<T> for StrataResult<StrataResult<T>> {
    fn flatten(self) -> StrataResult<T> {
        match self {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }
}

impl<T> ContextExt<T> for StrataResult<T> {
    fn context<S: Into<String>>(self, msg: S) -> StrataResult<T> {
        self.map_err(|e| {
            let msg: String = msg.into();
            e.with_context(msg)
        })
    }
}
