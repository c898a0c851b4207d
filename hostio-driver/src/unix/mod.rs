use std::{
    ffi::CString,
    fs, io,
    os::{
        fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd},
        unix::{ffi::OsStrExt, fs::MetadataExt, fs::OpenOptionsExt},
    },
    path::{Path, PathBuf},
};

use crate::{consts::*, FileAttributeData, FileTime, NativeError, StdStream};

mod find;
mod share;
mod stat;

pub use find::*;
use share::{FileKey, ShareGuard};

pub(crate) fn path_cstr(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes().to_vec()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "file name contained an unexpected NUL byte",
        )
    })
}

/// `ENOENT` means the path itself is missing only if its parent exists.
pub(crate) fn fix_path_error(err: io::Error, path: &Path) -> io::Error {
    if err.raw_os_error() != Some(libc::ENOENT) {
        return err;
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            NativeError::new(ERROR_PATH_NOT_FOUND).into()
        }
        _ => err,
    }
}

fn native(code: u32) -> io::Error {
    NativeError::new(code).into()
}

pub(crate) fn os_error_code(errno: i32) -> u32 {
    match errno {
        libc::EACCES | libc::EPERM | libc::EROFS => ERROR_ACCESS_DENIED,
        libc::EAGAIN => ERROR_SHARING_VIOLATION,
        libc::EBUSY => ERROR_LOCK_VIOLATION,
        libc::EEXIST => ERROR_FILE_EXISTS,
        libc::ENOENT => ERROR_FILE_NOT_FOUND,
        libc::ENOTDIR => ERROR_PATH_NOT_FOUND,
        libc::ENAMETOOLONG => ERROR_FILENAME_EXCED_RANGE,
        libc::ENOSPC | libc::EFBIG => ERROR_HANDLE_DISK_FULL,
        libc::EISDIR => ERROR_CANNOT_MAKE,
        libc::ENOTEMPTY => ERROR_DIR_NOT_EMPTY,
        libc::ENOEXEC => ERROR_BAD_FORMAT,
        libc::EXDEV => ERROR_NOT_SAME_DEVICE,
        libc::EBADF => ERROR_INVALID_HANDLE,
        libc::EINVAL | libc::ESPIPE => ERROR_INVALID_PARAMETER,
        libc::EMFILE | libc::ENFILE => ERROR_TOO_MANY_OPEN_FILES,
        libc::ENOMEM => ERROR_NOT_ENOUGH_MEMORY,
        libc::ELOOP => ERROR_CANT_RESOLVE_FILENAME,
        libc::EPIPE => ERROR_BROKEN_PIPE,
        _ => ERROR_GEN_FAILURE,
    }
}

#[derive(Debug)]
struct DeleteOnClose(PathBuf);

impl Drop for DeleteOnClose {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            tracing::debug!("delete on close of {} failed: {e}", self.0.display());
        }
    }
}

/// An open native file.
///
/// Dropping the handle closes it; [`close_handle`] does the same and reports
/// the result of `close(2)`.
#[derive(Debug)]
pub struct Handle {
    // Drop order matters: the descriptor is closed before the share entry is
    // released and before a delete-on-close unlink.
    fd: OwnedFd,
    share: Option<ShareGuard>,
    delete_on_close: Option<DeleteOnClose>,
}

impl Handle {
    fn from_fd(fd: OwnedFd) -> Self {
        Self {
            fd,
            share: None,
            delete_on_close: None,
        }
    }
}

impl AsRawFd for Handle {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for Handle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl From<OwnedFd> for Handle {
    fn from(fd: OwnedFd) -> Self {
        Self::from_fd(fd)
    }
}

/// Creates a directory. An existing entry fails with [`ERROR_ALREADY_EXISTS`].
pub fn create_directory(path: &Path) -> io::Result<()> {
    let c = path_cstr(path)?;
    match syscall!(libc::mkdir(c.as_ptr(), 0o777)) {
        Ok(_) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EEXIST) => Err(native(ERROR_ALREADY_EXISTS)),
        Err(e) => Err(fix_path_error(e, path)),
    }
}

/// Removes an empty directory.
pub fn remove_directory(path: &Path) -> io::Result<()> {
    let c = path_cstr(path)?;
    syscall!(libc::rmdir(c.as_ptr())).map_err(|e| fix_path_error(e, path))?;
    Ok(())
}

/// The working directory of the process.
pub fn current_directory() -> io::Result<PathBuf> {
    std::env::current_dir()
}

/// Changes the working directory of the process.
pub fn set_current_directory(path: &Path) -> io::Result<()> {
    let c = path_cstr(path)?;
    syscall!(libc::chdir(c.as_ptr())).map_err(|e| fix_path_error(e, path))?;
    Ok(())
}

fn rename(from: &Path, to: &Path) -> io::Result<()> {
    let (f, t) = (path_cstr(from)?, path_cstr(to)?);
    syscall!(libc::rename(f.as_ptr(), t.as_ptr()))?;
    Ok(())
}

/// Moves a file or directory. Unlike `rename(2)`, an existing destination is
/// an error, and files are copied across devices.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    let source = stat::query(src)?;
    share::check_delete(FileKey::from_stat(&source.st))?;
    if let Ok(target) = stat::query(dst) {
        if FileKey::from_stat(&target.st) != FileKey::from_stat(&source.st) {
            return Err(native(ERROR_ALREADY_EXISTS));
        }
    }
    match rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) && !source.is_dir() => {
            copy_file(src, dst, true)?;
            delete_file(src)
        }
        Err(e) => Err(fix_path_error(e, dst)),
    }
}

/// Replaces `replaced` with `replacement`, keeping the old file at `backup`
/// when given. The Win32 flags have no POSIX counterpart and are ignored.
pub fn replace_file(
    replaced: &Path,
    replacement: &Path,
    backup: Option<&Path>,
    _flags: u32,
) -> io::Result<()> {
    stat::lstat(replaced)?;
    stat::lstat(replacement)?;
    if let Some(backup) = backup {
        rename(replaced, backup).map_err(|e| fix_path_error(e, backup))?;
    }
    if let Err(e) = rename(replacement, replaced) {
        let e = fix_path_error(e, replacement);
        if let Some(backup) = backup {
            if let Err(restore) = rename(backup, replaced) {
                tracing::debug!("restoring {} failed: {restore}", replaced.display());
            }
        }
        return Err(e);
    }
    Ok(())
}

fn set_times(fd: BorrowedFd, access: libc::timespec, write: libc::timespec) -> io::Result<()> {
    let times = [access, write];
    syscall!(libc::futimens(fd.as_raw_fd(), times.as_ptr()))?;
    Ok(())
}

/// Copies contents, permissions and access/write times.
pub fn copy_file(src: &Path, dst: &Path, fail_if_exists: bool) -> io::Result<()> {
    let mut reader = fs::File::open(src).map_err(|e| fix_path_error(e, src))?;
    let meta = reader.metadata()?;
    if meta.is_dir() {
        return Err(native(ERROR_ACCESS_DENIED));
    }
    if let Ok(target) = fs::metadata(dst) {
        if target.dev() == meta.dev() && target.ino() == meta.ino() {
            return Err(native(ERROR_SHARING_VIOLATION));
        }
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).mode(meta.mode());
    if fail_if_exists {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    let mut writer = options.open(dst).map_err(|e| fix_path_error(e, dst))?;
    io::copy(&mut reader, &mut writer)?;
    writer.set_permissions(meta.permissions())?;
    set_times(
        writer.as_fd(),
        libc::timespec {
            tv_sec: meta.atime() as _,
            tv_nsec: meta.atime_nsec() as _,
        },
        libc::timespec {
            tv_sec: meta.mtime() as _,
            tv_nsec: meta.mtime_nsec() as _,
        },
    )
}

/// Deletes a file. Directories fail with [`ERROR_ACCESS_DENIED`], open
/// handles without [`FILE_SHARE_DELETE`] with [`ERROR_SHARING_VIOLATION`].
pub fn delete_file(path: &Path) -> io::Result<()> {
    let st = stat::lstat(path)?;
    if stat::is_dir(&st) {
        return Err(native(ERROR_ACCESS_DENIED));
    }
    share::check_delete(FileKey::from_stat(&st))?;
    let c = path_cstr(path)?;
    syscall!(libc::unlink(c.as_ptr())).map_err(|e| fix_path_error(e, path))?;
    Ok(())
}

/// Attribute bits of a path.
pub fn get_file_attributes(path: &Path) -> io::Result<u32> {
    let st = stat::query(path)?;
    Ok(stat::attributes(&st, path.file_name()))
}

/// Attributes, timestamps and length of a path.
pub fn get_file_attributes_ex(path: &Path) -> io::Result<FileAttributeData> {
    let st = stat::query(path)?;
    Ok(stat::attribute_data(&st, path.file_name()))
}

/// Only [`FILE_ATTRIBUTE_READONLY`] has a POSIX meaning: it clears every
/// write bit, and its absence restores the owner's.
pub fn set_file_attributes(path: &Path, attrs: u32) -> io::Result<()> {
    let st = stat::query(path)?;
    let mode = st.st.st_mode & 0o7777;
    let mode = if attrs & FILE_ATTRIBUTE_READONLY != 0 {
        mode & !(libc::S_IWUSR | libc::S_IWGRP | libc::S_IWOTH)
    } else {
        mode | libc::S_IWUSR
    };
    let c = path_cstr(path)?;
    syscall!(libc::chmod(c.as_ptr(), mode)).map_err(|e| fix_path_error(e, path))?;
    Ok(())
}

/// The directory for temporary files.
pub fn temp_path() -> io::Result<PathBuf> {
    Ok(std::env::temp_dir())
}

fn access_flags(access: u32) -> libc::c_int {
    match access & (GENERIC_READ | GENERIC_WRITE) {
        x if x == GENERIC_READ | GENERIC_WRITE => libc::O_RDWR,
        GENERIC_WRITE => libc::O_WRONLY,
        _ => libc::O_RDONLY,
    }
}

#[cfg(linux_all)]
fn advise(fd: BorrowedFd, flags: u32) {
    let advice = if flags & FILE_FLAG_SEQUENTIAL_SCAN != 0 {
        libc::POSIX_FADV_SEQUENTIAL
    } else if flags & FILE_FLAG_RANDOM_ACCESS != 0 {
        libc::POSIX_FADV_RANDOM
    } else {
        return;
    };
    let res = unsafe { libc::posix_fadvise(fd.as_raw_fd(), 0, 0, advice) };
    if res != 0 {
        tracing::debug!("posix_fadvise failed: {}", io::Error::from_raw_os_error(res));
    }
}

#[cfg(not(linux_all))]
fn advise(_fd: BorrowedFd, _flags: u32) {}

/// Opens or creates a file.
///
/// The share mode is checked against the other handles of this process
/// before any truncation happens. Directories can only be opened with
/// [`FILE_FLAG_BACKUP_SEMANTICS`].
pub fn create_file(
    path: &Path,
    access: u32,
    share: u32,
    disposition: u32,
    flags: u32,
) -> io::Result<Handle> {
    let c = path_cstr(path)?;
    let mut oflags = libc::O_CLOEXEC | access_flags(access);
    let truncate = match disposition {
        CREATE_NEW => {
            oflags |= libc::O_CREAT | libc::O_EXCL;
            false
        }
        CREATE_ALWAYS => {
            oflags |= libc::O_CREAT;
            true
        }
        OPEN_EXISTING => false,
        OPEN_ALWAYS => {
            oflags |= libc::O_CREAT;
            false
        }
        TRUNCATE_EXISTING => true,
        _ => return Err(native(ERROR_INVALID_PARAMETER)),
    };
    if flags & FILE_FLAG_WRITE_THROUGH != 0 {
        oflags |= libc::O_SYNC;
    }
    let fd = match syscall!(libc::open(c.as_ptr(), oflags, 0o666 as libc::c_uint)) {
        Ok(fd) => unsafe { OwnedFd::from_raw_fd(fd) },
        Err(e) if e.raw_os_error() == Some(libc::EISDIR) => {
            return Err(native(ERROR_ACCESS_DENIED));
        }
        Err(e) => return Err(fix_path_error(e, path)),
    };
    let st = stat::fstat(fd.as_fd())?;
    if stat::is_dir(&st) && flags & FILE_FLAG_BACKUP_SEMANTICS == 0 {
        return Err(native(ERROR_ACCESS_DENIED));
    }
    let guard = share::acquire(FileKey::from_stat(&st), access, share)?;
    if truncate {
        syscall!(libc::ftruncate(fd.as_raw_fd(), 0))?;
    }
    advise(fd.as_fd(), flags);
    Ok(Handle {
        fd,
        share: Some(guard),
        delete_on_close: (flags & FILE_FLAG_DELETE_ON_CLOSE != 0)
            .then(|| DeleteOnClose(path.to_path_buf())),
    })
}

/// Closes a handle, reporting the result of `close(2)`.
pub fn close_handle(handle: Handle) -> io::Result<()> {
    let Handle {
        fd,
        share,
        delete_on_close,
    } = handle;
    let res = syscall!(libc::close(fd.into_raw_fd()));
    drop(share);
    drop(delete_on_close);
    res.map(|_| ())
}

/// Reads into `buf`, returning the number of bytes read.
pub fn read_file(handle: &Handle, buf: &mut [u8]) -> io::Result<u32> {
    loop {
        match syscall!(libc::read(
            handle.as_raw_fd(),
            buf.as_mut_ptr().cast(),
            buf.len()
        )) {
            Ok(n) => return Ok(n as u32),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Writes `buf`, returning the number of bytes written.
pub fn write_file(handle: &Handle, buf: &[u8]) -> io::Result<u32> {
    loop {
        match syscall!(libc::write(handle.as_raw_fd(), buf.as_ptr().cast(), buf.len())) {
            Ok(n) => return Ok(n as u32),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Moves the file pointer by the 64-bit distance `distance_high:distance_low`
/// and returns the low word of the new position, storing its high word back
/// into `distance_high`.
pub fn set_file_pointer(
    handle: &Handle,
    distance_low: u32,
    distance_high: &mut i32,
    method: u32,
) -> io::Result<u32> {
    let whence = match method {
        FILE_BEGIN => libc::SEEK_SET,
        FILE_CURRENT => libc::SEEK_CUR,
        FILE_END => libc::SEEK_END,
        _ => return Err(native(ERROR_INVALID_PARAMETER)),
    };
    let distance = ((*distance_high as i64) << 32) | distance_low as i64;
    let pos = match syscall!(libc::lseek(handle.as_raw_fd(), distance as _, whence)) {
        Ok(pos) => pos as i64,
        Err(e) if e.raw_os_error() == Some(libc::EINVAL) && distance < 0 => {
            return Err(native(ERROR_NEGATIVE_SEEK));
        }
        Err(e) => return Err(e),
    };
    *distance_high = (pos >> 32) as i32;
    Ok(pos as u32)
}

/// Flushes the file to disk.
pub fn flush_file_buffers(handle: &Handle) -> io::Result<()> {
    syscall!(libc::fsync(handle.as_raw_fd()))?;
    Ok(())
}

/// Returns the `(low, high)` words of the file length.
pub fn get_file_size(handle: &Handle) -> io::Result<(u32, u32)> {
    let size = stat::fstat(handle.as_fd())?.st_size as u64;
    Ok((size as u32, (size >> 32) as u32))
}

/// Truncates or extends the file at the current file pointer.
pub fn set_end_of_file(handle: &Handle) -> io::Result<()> {
    let pos = syscall!(libc::lseek(handle.as_raw_fd(), 0, libc::SEEK_CUR))?;
    syscall!(libc::ftruncate(handle.as_raw_fd(), pos))?;
    Ok(())
}

/// Sets the access and write times. `None` leaves a time unchanged; the
/// creation time cannot be set on POSIX and is ignored.
pub fn set_file_time(
    handle: &Handle,
    _creation: Option<&FileTime>,
    last_access: Option<&FileTime>,
    last_write: Option<&FileTime>,
) -> io::Result<()> {
    let omit = libc::timespec {
        tv_sec: 0,
        tv_nsec: libc::UTIME_OMIT,
    };
    set_times(
        handle.as_fd(),
        last_access.map_or(omit, stat::timespec),
        last_write.map_or(omit, stat::timespec),
    )
}

#[cfg(target_os = "linux")]
const SET_LOCK: libc::c_int = libc::F_OFD_SETLK;
#[cfg(not(target_os = "linux"))]
const SET_LOCK: libc::c_int = libc::F_SETLK;

fn lock_range(handle: &Handle, offset: u64, length: u64, unlock: bool) -> io::Result<()> {
    if length == 0 {
        return Ok(());
    }
    let kind = if unlock {
        libc::F_UNLCK
    } else {
        let mode = syscall!(libc::fcntl(handle.as_raw_fd(), libc::F_GETFL))?;
        if mode & libc::O_ACCMODE == libc::O_RDONLY {
            libc::F_RDLCK
        } else {
            libc::F_WRLCK
        }
    };
    // SAFETY: all-zero is a valid `flock`; `l_pid` must stay zero for OFD locks.
    let mut lock: libc::flock = unsafe { std::mem::zeroed() };
    lock.l_type = kind as _;
    lock.l_whence = libc::SEEK_SET as _;
    lock.l_start = offset as _;
    lock.l_len = length as _;
    match syscall!(libc::fcntl(handle.as_raw_fd(), SET_LOCK, &lock as *const libc::flock)) {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.raw_os_error(), Some(libc::EAGAIN | libc::EACCES)) => {
            Err(native(ERROR_LOCK_VIOLATION))
        }
        Err(e) => Err(e),
    }
}

/// Locks a byte range. A conflicting lock fails with [`ERROR_LOCK_VIOLATION`].
pub fn lock_file(
    handle: &Handle,
    offset_low: u32,
    offset_high: u32,
    length_low: u32,
    length_high: u32,
) -> io::Result<()> {
    let offset = ((offset_high as u64) << 32) | offset_low as u64;
    let length = ((length_high as u64) << 32) | length_low as u64;
    lock_range(handle, offset, length, false)
}

/// Unlocks a byte range.
pub fn unlock_file(
    handle: &Handle,
    offset_low: u32,
    offset_high: u32,
    length_low: u32,
    length_high: u32,
) -> io::Result<()> {
    let offset = ((offset_high as u64) << 32) | offset_low as u64;
    let length = ((length_high as u64) << 32) | length_low as u64;
    lock_range(handle, offset, length, true)
}

/// Kind of the open file, one of the `FILE_TYPE_*` values.
pub fn get_file_type(handle: &Handle) -> io::Result<u32> {
    let st = stat::fstat(handle.as_fd())?;
    Ok(match st.st_mode & libc::S_IFMT {
        libc::S_IFREG | libc::S_IFDIR | libc::S_IFBLK => FILE_TYPE_DISK,
        libc::S_IFCHR => FILE_TYPE_CHAR,
        libc::S_IFIFO | libc::S_IFSOCK => FILE_TYPE_PIPE,
        _ => FILE_TYPE_UNKNOWN,
    })
}

/// Duplicates a standard stream, or returns `None` when it is closed.
pub fn std_handle(stream: StdStream) -> io::Result<Option<Handle>> {
    let fd = match stream {
        StdStream::Input => libc::STDIN_FILENO,
        StdStream::Output => libc::STDOUT_FILENO,
        StdStream::Error => libc::STDERR_FILENO,
    };
    match syscall!(libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 3)) {
        Ok(fd) => Ok(Some(Handle::from_fd(unsafe { OwnedFd::from_raw_fd(fd) }))),
        Err(e) if e.raw_os_error() == Some(libc::EBADF) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Creates an anonymous pipe whose ends are inherited by child processes.
pub fn create_pipe() -> io::Result<(Handle, Handle)> {
    let mut fds = [0; 2];
    syscall!(libc::pipe(fds.as_mut_ptr()))?;
    // SAFETY: `pipe` returned two fresh descriptors.
    let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    Ok((Handle::from_fd(read), Handle::from_fd(write)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_table() {
        assert_eq!(os_error_code(libc::ENOENT), ERROR_FILE_NOT_FOUND);
        assert_eq!(os_error_code(libc::ENOTDIR), ERROR_PATH_NOT_FOUND);
        assert_eq!(os_error_code(libc::EACCES), ERROR_ACCESS_DENIED);
        assert_eq!(os_error_code(libc::EROFS), ERROR_ACCESS_DENIED);
        assert_eq!(os_error_code(libc::EEXIST), ERROR_FILE_EXISTS);
        assert_eq!(os_error_code(libc::ENOSPC), ERROR_HANDLE_DISK_FULL);
        assert_eq!(os_error_code(libc::ENOTEMPTY), ERROR_DIR_NOT_EMPTY);
        assert_eq!(os_error_code(libc::EXDEV), ERROR_NOT_SAME_DEVICE);
        assert_eq!(os_error_code(libc::EDOM), ERROR_GEN_FAILURE);
    }

    #[test]
    fn missing_parent_is_path_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = io::Error::from_raw_os_error(libc::ENOENT);
        let err = fix_path_error(err, &dir.path().join("a"));
        assert_eq!(crate::error_code(&err), ERROR_FILE_NOT_FOUND);

        let err = io::Error::from_raw_os_error(libc::ENOENT);
        let err = fix_path_error(err, &dir.path().join("missing").join("a"));
        assert_eq!(crate::error_code(&err), ERROR_PATH_NOT_FOUND);
    }

    #[test]
    fn access_mask() {
        assert_eq!(access_flags(GENERIC_READ), libc::O_RDONLY);
        assert_eq!(access_flags(GENERIC_WRITE), libc::O_WRONLY);
        assert_eq!(access_flags(GENERIC_READ | GENERIC_WRITE), libc::O_RDWR);
    }
}
