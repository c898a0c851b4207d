//! The native layer of hostio.
//!
//! Every function here has the shape of the matching Win32 file API:
//! dispositions, access masks, share modes and flag bundles are passed as the
//! raw native values in [`consts`], 64-bit quantities travel as split
//! high/low 32-bit words, and failures come back as [`std::io::Error`].
//!
//! On Windows the calls go straight to the system. On Unix the same contract
//! is emulated on top of POSIX: open flags are derived from the disposition,
//! share modes are enforced by a process-wide table, `find_first_file` globs a
//! directory, and `errno` values are folded into the Win32 error code space by
//! [`error_code`].

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]

use std::ffi::OsString;

/// Helper macro to execute a system call
#[cfg(unix)]
macro_rules! syscall {
    ($e:expr) => {{
        #[allow(unused_unsafe)]
        let res = unsafe { $e };
        if res == -1 {
            Err(::std::io::Error::last_os_error())
        } else {
            Ok(res)
        }
    }};
}

/// Helper macro to execute a system call
#[cfg(windows)]
macro_rules! syscall {
    ($fn: ident ( $($arg: expr),* $(,)* ), $op: tt $rhs: expr) => {{
        #[allow(unused_unsafe)]
        let res = unsafe { $fn($($arg, )*) };
        if res $op $rhs {
            Err(::std::io::Error::last_os_error())
        } else {
            Ok(res)
        }
    }};
    (BOOL, $fn: ident ( $($arg: expr),* $(,)* )) => {
        syscall!($fn($($arg, )*), == 0)
    };
    (HANDLE, $fn: ident ( $($arg: expr),* $(,)* )) => {
        syscall!($fn($($arg, )*), == ::windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE)
    };
}

pub mod consts;

mod error;
pub use error::*;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        #[path = "windows/mod.rs"]
        mod sys;
    } else if #[cfg(unix)] {
        #[path = "unix/mod.rs"]
        mod sys;
    }
}

pub use sys::*;

/// A timestamp in its native split-word form: the high and low halves of a
/// 64-bit count of 100-nanosecond intervals since 1601-01-01 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FileTime {
    /// Low 32 bits.
    pub low: u32,
    /// High 32 bits.
    pub high: u32,
}

/// Attribute, timestamp and size information of a path, as returned by
/// [`get_file_attributes_ex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileAttributeData {
    /// Native attribute bits.
    pub attributes: u32,
    /// Creation time.
    pub creation_time: FileTime,
    /// Last access time.
    pub last_access_time: FileTime,
    /// Last write time.
    pub last_write_time: FileTime,
    /// High 32 bits of the length.
    pub size_high: u32,
    /// Low 32 bits of the length.
    pub size_low: u32,
}

/// One entry produced by [`find_first_file`] / [`find_next_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindData {
    /// Native attribute bits.
    pub attributes: u32,
    /// Creation time.
    pub creation_time: FileTime,
    /// Last access time.
    pub last_access_time: FileTime,
    /// Last write time.
    pub last_write_time: FileTime,
    /// High 32 bits of the length.
    pub size_high: u32,
    /// Low 32 bits of the length.
    pub size_low: u32,
    /// Name of the entry, without its directory.
    pub name: OsString,
}

impl From<&FindData> for FileAttributeData {
    fn from(data: &FindData) -> Self {
        Self {
            attributes: data.attributes,
            creation_time: data.creation_time,
            last_access_time: data.last_access_time,
            last_write_time: data.last_write_time,
            size_high: data.size_high,
            size_low: data.size_low,
        }
    }
}

/// The standard streams of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    /// Standard input.
    Input,
    /// Standard output.
    Output,
    /// Standard error.
    Error,
}
