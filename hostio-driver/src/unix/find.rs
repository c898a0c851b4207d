use std::{
    ffi::{CStr, CString, OsStr, OsString},
    io,
    os::unix::ffi::{OsStrExt, OsStringExt},
    path::{Path, PathBuf},
    vec,
};

use super::{path_cstr, stat};
use crate::{consts::*, FindData, NativeError};

/// An in-progress enumeration started by [`find_first_file`].
///
/// The directory is read and matched in full when the enumeration starts.
#[derive(Debug)]
pub struct FindHandle {
    entries: vec::IntoIter<FindData>,
}

/// Splits `dir/pattern` into the directory to read and the glob to match.
fn split_pattern(pattern: &Path) -> io::Result<(PathBuf, &OsStr)> {
    let glob = pattern
        .file_name()
        .ok_or(NativeError::new(ERROR_FILE_NOT_FOUND))?;
    let dir = match pattern.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, glob))
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "emscripten", target_os = "redox"))] {
        fn errno_location() -> *mut libc::c_int {
            unsafe { libc::__errno_location() }
        }
    } else if #[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))] {
        fn errno_location() -> *mut libc::c_int {
            unsafe { libc::__errno() }
        }
    } else {
        fn errno_location() -> *mut libc::c_int {
            unsafe { libc::__error() }
        }
    }
}

fn set_errno(value: libc::c_int) {
    unsafe { *errno_location() = value };
}

struct Dir(*mut libc::DIR);

impl Drop for Dir {
    fn drop(&mut self) {
        unsafe { libc::closedir(self.0) };
    }
}

/// All names in `dir`, including `.` and `..`.
fn read_names(dir: &Path) -> io::Result<Vec<OsString>> {
    let c = path_cstr(dir)?;
    let handle = unsafe { libc::opendir(c.as_ptr()) };
    if handle.is_null() {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(libc::ENOENT | libc::ENOTDIR) => {
                Err(NativeError::new(ERROR_PATH_NOT_FOUND).into())
            }
            _ => Err(err),
        };
    }
    let handle = Dir(handle);
    let mut names = vec![];
    loop {
        // A null entry is either the end or a failure; only errno tells.
        set_errno(0);
        let entry = unsafe { libc::readdir(handle.0) };
        if entry.is_null() {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(0) {
                break;
            }
            return Err(err);
        }
        // SAFETY: `d_name` is NUL-terminated and lives until the next readdir.
        let name = unsafe { CStr::from_ptr((*entry).d_name.as_ptr()) };
        names.push(OsString::from_vec(name.to_bytes().to_vec()));
    }
    Ok(names)
}

fn matches(glob: &CStr, name: &OsStr) -> bool {
    match CString::new(name.as_bytes()) {
        Ok(name) => unsafe { libc::fnmatch(glob.as_ptr(), name.as_ptr(), 0) == 0 },
        Err(_) => false,
    }
}

/// Starts enumerating the entries matching `pattern`, a directory followed
/// by an `fnmatch(3)` glob.
///
/// No matching entry fails with [`ERROR_FILE_NOT_FOUND`]; a missing directory
/// with [`ERROR_PATH_NOT_FOUND`].
pub fn find_first_file(pattern: &Path) -> io::Result<(FindHandle, FindData)> {
    let (dir, glob) = split_pattern(pattern)?;
    let glob = CString::new(glob.as_bytes())
        .map_err(|_| io::Error::from(NativeError::new(ERROR_INVALID_NAME)))?;
    let mut entries = vec![];
    for name in read_names(&dir)? {
        if !matches(&glob, &name) {
            continue;
        }
        let path = dir.join(&name);
        match stat::query(&path) {
            Ok(st) => entries.push(stat::find_data(&st, &name)),
            // Removed since the directory was read.
            Err(e) => tracing::trace!("skipping {}: {e}", path.display()),
        }
    }
    let mut entries = entries.into_iter();
    match entries.next() {
        Some(first) => Ok((FindHandle { entries }, first)),
        None => Err(NativeError::new(ERROR_FILE_NOT_FOUND).into()),
    }
}

/// Next entry, or `None` once the enumeration is exhausted.
pub fn find_next_file(find: &mut FindHandle) -> io::Result<Option<FindData>> {
    Ok(find.entries.next())
}

/// Ends an enumeration.
pub fn find_close(find: FindHandle) -> io::Result<()> {
    drop(find);
    Ok(())
}
