//! Process-wide path remapping.
//!
//! When a remapper is registered, every path-accepting operation hands its
//! path to it first and uses the replacement, if any. Register before other
//! threads start using the crate; the last registration wins.

use std::{
    borrow::Cow,
    ffi::{c_char, CString},
    path::{Path, PathBuf},
    ptr::null_mut,
    sync::{Arc, PoisonError, RwLock},
};

/// Rewrites a path before it reaches the operating system.
pub trait PathRemapper: Send + Sync {
    /// The replacement for `path`, or `None` to keep it.
    fn remap(&self, path: &Path) -> Option<PathBuf>;
}

impl<F> PathRemapper for F
where
    F: Fn(&Path) -> Option<PathBuf> + Send + Sync,
{
    fn remap(&self, path: &Path) -> Option<PathBuf> {
        self(path)
    }
}

/// A host callback remapping a NUL-terminated UTF-8 path.
///
/// Called with a null buffer it returns the buffer size the replacement
/// needs, or 0 for no remapping. Called again with a buffer of that size it
/// writes the replacement.
pub type RemapPathFn =
    unsafe extern "C" fn(path: *const c_char, buffer: *mut c_char, len: usize) -> usize;

/// [`PathRemapper`] over a [`RemapPathFn`].
#[derive(Debug, Clone, Copy)]
pub struct RemapPathFunction(RemapPathFn);

impl RemapPathFunction {
    /// Wraps a host callback.
    ///
    /// # Safety
    ///
    /// `func` must follow the [`RemapPathFn`] protocol, never writing more than
    /// `len` bytes, and must be callable from any thread.
    pub unsafe fn new(func: RemapPathFn) -> Self {
        Self(func)
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn path_bytes(path: &Path) -> Option<Vec<u8>> {
            use std::os::unix::ffi::OsStrExt;
            Some(path.as_os_str().as_bytes().to_vec())
        }

        fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
            use std::os::unix::ffi::OsStringExt;
            std::ffi::OsString::from_vec(bytes).into()
        }
    } else {
        fn path_bytes(path: &Path) -> Option<Vec<u8>> {
            path.to_str().map(|s| s.as_bytes().to_vec())
        }

        fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
            String::from_utf8_lossy(&bytes).into_owned().into()
        }
    }
}

impl PathRemapper for RemapPathFunction {
    fn remap(&self, path: &Path) -> Option<PathBuf> {
        let path = CString::new(path_bytes(path)?).ok()?;
        // SAFETY: upheld by `RemapPathFunction::new`.
        let len = unsafe { (self.0)(path.as_ptr(), null_mut(), 0) };
        if len == 0 {
            return None;
        }
        let mut buf = vec![0u8; len];
        unsafe { (self.0)(path.as_ptr(), buf.as_mut_ptr().cast(), len) };
        if let Some(end) = buf.iter().position(|&b| b == 0) {
            buf.truncate(end);
        }
        Some(path_from_bytes(buf))
    }
}

static REMAPPER: RwLock<Option<Arc<dyn PathRemapper>>> = RwLock::new(None);

/// Registers the process-wide remapper, replacing the previous one. `None`
/// turns remapping off.
pub fn register_path_remapper(remapper: Option<Arc<dyn PathRemapper>>) {
    *REMAPPER.write().unwrap_or_else(PoisonError::into_inner) = remapper;
}

/// Registers a host callback as the process-wide remapper.
///
/// # Safety
///
/// See [`RemapPathFunction::new`].
pub unsafe fn register_remap_path_function(func: Option<RemapPathFn>) {
    register_path_remapper(
        func.map(|f| Arc::new(RemapPathFunction::new(f)) as Arc<dyn PathRemapper>),
    );
}

fn current() -> Option<Arc<dyn PathRemapper>> {
    REMAPPER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// The remapped form of `path`, or `None` when no remapper is registered or
/// it keeps the path.
pub fn remap_path(path: impl AsRef<Path>) -> Option<PathBuf> {
    let path = path.as_ref();
    let new_path = current()?.remap(path)?;
    tracing::trace!("remapped {} to {}", path.display(), new_path.display());
    Some(new_path)
}

/// Replaces `path` with its remapped form. Returns whether it changed.
pub fn remap_path_in_place(path: &mut PathBuf) -> bool {
    match remap_path(&*path) {
        Some(new_path) => {
            *path = new_path;
            true
        }
        None => false,
    }
}

pub(crate) fn remapped(path: &Path) -> Cow<'_, Path> {
    match remap_path(path) {
        Some(new_path) => Cow::Owned(new_path),
        None => Cow::Borrowed(path),
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    unsafe extern "C" fn to_upper(path: *const c_char, buffer: *mut c_char, len: usize) -> usize {
        let path = CStr::from_ptr(path).to_bytes();
        if !path.starts_with(b"/lower") {
            return 0;
        }
        // Report extra room to check the trim at the terminator.
        let needed = path.len() + 8;
        if !buffer.is_null() && len >= needed {
            let upper = path.to_ascii_uppercase();
            std::ptr::copy_nonoverlapping(upper.as_ptr(), buffer.cast(), upper.len());
            *buffer.add(upper.len()) = 0;
        }
        needed
    }

    #[test]
    fn host_function() {
        let remapper = unsafe { RemapPathFunction::new(to_upper) };
        assert_eq!(
            remapper.remap(Path::new("/lower/case")),
            Some(PathBuf::from("/LOWER/CASE"))
        );
        assert_eq!(remapper.remap(Path::new("/other")), None);
    }

    #[test]
    fn closure() {
        let remapper = |path: &Path| path.strip_prefix("/a").ok().map(|p| Path::new("/b").join(p));
        assert_eq!(
            remapper.remap(Path::new("/a/x")),
            Some(PathBuf::from("/b/x"))
        );
        assert_eq!(remapper.remap(Path::new("/c")), None);
    }
}
