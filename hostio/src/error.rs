use std::{fmt, io};

/// The neutral error code reported through the out-parameter of every
/// fallible operation.
///
/// Codes are Win32 system error codes on every platform; see
/// [`hostio_driver::error_code`] for how native failures are translated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ErrorCode(pub i32);

#[allow(missing_docs)]
impl ErrorCode {
    pub const SUCCESS: Self = Self::native(hostio_driver::consts::ERROR_SUCCESS);
    pub const FILE_NOT_FOUND: Self = Self::native(hostio_driver::consts::ERROR_FILE_NOT_FOUND);
    pub const PATH_NOT_FOUND: Self = Self::native(hostio_driver::consts::ERROR_PATH_NOT_FOUND);
    pub const ACCESS_DENIED: Self = Self::native(hostio_driver::consts::ERROR_ACCESS_DENIED);
    pub const INVALID_HANDLE: Self = Self::native(hostio_driver::consts::ERROR_INVALID_HANDLE);
    pub const SHARING_VIOLATION: Self =
        Self::native(hostio_driver::consts::ERROR_SHARING_VIOLATION);
    pub const LOCK_VIOLATION: Self = Self::native(hostio_driver::consts::ERROR_LOCK_VIOLATION);
    pub const FILE_EXISTS: Self = Self::native(hostio_driver::consts::ERROR_FILE_EXISTS);
    pub const INVALID_PARAMETER: Self =
        Self::native(hostio_driver::consts::ERROR_INVALID_PARAMETER);
    pub const DIR_NOT_EMPTY: Self = Self::native(hostio_driver::consts::ERROR_DIR_NOT_EMPTY);
    pub const ALREADY_EXISTS: Self = Self::native(hostio_driver::consts::ERROR_ALREADY_EXISTS);

    const fn native(code: u32) -> Self {
        Self(code as i32)
    }

    /// Whether this is [`ErrorCode::SUCCESS`].
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl From<&io::Error> for ErrorCode {
    fn from(err: &io::Error) -> Self {
        Self::native(hostio_driver::error_code(err))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error code {}", self.0)
    }
}

/// Runs a native operation under the out-parameter contract: `error` is reset
/// to [`ErrorCode::SUCCESS`] first and only overwritten when `f` fails.
pub(crate) fn run<T>(
    error: &mut ErrorCode,
    op: &str,
    f: impl FnOnce() -> io::Result<T>,
) -> Option<T> {
    *error = ErrorCode::SUCCESS;
    match f() {
        Ok(res) => Some(res),
        Err(e) => {
            *error = ErrorCode::from(&e);
            tracing::debug!("{op} failed with {}: {e}", error.0);
            None
        }
    }
}
