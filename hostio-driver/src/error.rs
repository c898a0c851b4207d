use std::io;

use crate::consts::*;

/// A failure that already carries its Win32 error code.
///
/// Backends use it for conditions that have no OS error of their own, such as
/// a share-mode conflict detected by the Unix share table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("native error {0}")]
pub struct NativeError(u32);

impl NativeError {
    /// Create [`NativeError`] from a Win32 error code.
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// The Win32 error code.
    pub const fn code(self) -> u32 {
        self.0
    }

    fn kind(self) -> io::ErrorKind {
        match self.0 {
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => io::ErrorKind::NotFound,
            ERROR_ACCESS_DENIED => io::ErrorKind::PermissionDenied,
            ERROR_FILE_EXISTS | ERROR_ALREADY_EXISTS => io::ErrorKind::AlreadyExists,
            ERROR_INVALID_PARAMETER | ERROR_INVALID_NAME => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        }
    }
}

impl From<NativeError> for io::Error {
    fn from(e: NativeError) -> Self {
        io::Error::new(e.kind(), e)
    }
}

/// Translates an error returned by this crate into the Win32 error code space.
///
/// A [`NativeError`] payload wins, then the raw OS error (verbatim on
/// Windows, mapped from `errno` on Unix), then the [`io::ErrorKind`].
pub fn error_code(err: &io::Error) -> u32 {
    if let Some(native) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<NativeError>())
    {
        return native.code();
    }
    if let Some(raw) = err.raw_os_error() {
        return crate::sys::os_error_code(raw);
    }
    match err.kind() {
        io::ErrorKind::NotFound => ERROR_FILE_NOT_FOUND,
        io::ErrorKind::PermissionDenied => ERROR_ACCESS_DENIED,
        io::ErrorKind::AlreadyExists => ERROR_FILE_EXISTS,
        io::ErrorKind::InvalidInput => ERROR_INVALID_PARAMETER,
        io::ErrorKind::WouldBlock => ERROR_SHARING_VIOLATION,
        io::ErrorKind::UnexpectedEof => ERROR_HANDLE_EOF,
        io::ErrorKind::OutOfMemory => ERROR_NOT_ENOUGH_MEMORY,
        io::ErrorKind::Unsupported => ERROR_NOT_SUPPORTED,
        _ => ERROR_GEN_FAILURE,
    }
}
