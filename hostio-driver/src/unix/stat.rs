//! `stat(2)` results folded into attributes, timestamps and sizes.

use std::{
    ffi::{CStr, OsStr},
    io,
    mem::MaybeUninit,
    os::{
        fd::{AsRawFd, BorrowedFd},
        unix::ffi::OsStrExt,
    },
    path::Path,
};

use super::{fix_path_error, path_cstr};
use crate::{consts::*, FileAttributeData, FileTime, FindData};

/// 100-nanosecond ticks between 1601-01-01 and 1970-01-01.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// A followed `stat` plus whether the path itself is a symbolic link.
#[derive(Clone, Copy)]
pub(crate) struct Stat {
    pub st: libc::stat,
    pub link: bool,
}

impl Stat {
    pub fn is_dir(&self) -> bool {
        is_dir(&self.st)
    }
}

pub(crate) fn is_dir(st: &libc::stat) -> bool {
    st.st_mode & libc::S_IFMT == libc::S_IFDIR
}

fn stat_raw(path: &CStr, follow: bool) -> io::Result<libc::stat> {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    if follow {
        syscall!(libc::stat(path.as_ptr(), st.as_mut_ptr()))?;
    } else {
        syscall!(libc::lstat(path.as_ptr(), st.as_mut_ptr()))?;
    }
    // SAFETY: the call succeeded and filled the buffer.
    Ok(unsafe { st.assume_init() })
}

/// `lstat` of the path itself.
pub(crate) fn lstat(path: &Path) -> io::Result<libc::stat> {
    let c = path_cstr(path)?;
    stat_raw(&c, false).map_err(|e| fix_path_error(e, path))
}

/// `stat` of the path, falling back to the link itself when it dangles.
pub(crate) fn query(path: &Path) -> io::Result<Stat> {
    let c = path_cstr(path)?;
    let lst = stat_raw(&c, false).map_err(|e| fix_path_error(e, path))?;
    if lst.st_mode & libc::S_IFMT != libc::S_IFLNK {
        return Ok(Stat {
            st: lst,
            link: false,
        });
    }
    let st = stat_raw(&c, true).unwrap_or(lst);
    Ok(Stat { st, link: true })
}

pub(crate) fn fstat(fd: BorrowedFd) -> io::Result<libc::stat> {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    syscall!(libc::fstat(fd.as_raw_fd(), st.as_mut_ptr()))?;
    // SAFETY: the call succeeded and filled the buffer.
    Ok(unsafe { st.assume_init() })
}

/// Synthesizes Win32 attribute bits. `name` is the final path component and
/// decides [`FILE_ATTRIBUTE_HIDDEN`].
pub(crate) fn attributes(stat: &Stat, name: Option<&OsStr>) -> u32 {
    let mut attrs = 0;
    if stat.is_dir() {
        attrs |= FILE_ATTRIBUTE_DIRECTORY;
    }
    if stat.st.st_mode & libc::S_IWUSR == 0 {
        attrs |= FILE_ATTRIBUTE_READONLY;
    }
    if name.is_some_and(|n| n.as_bytes().first() == Some(&b'.')) {
        attrs |= FILE_ATTRIBUTE_HIDDEN;
    }
    if stat.link {
        attrs |= FILE_ATTRIBUTE_REPARSE_POINT;
    }
    if attrs == 0 {
        attrs = FILE_ATTRIBUTE_NORMAL;
    }
    attrs
}

pub(crate) fn filetime(sec: i64, nsec: i64) -> FileTime {
    let ticks = sec
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(nsec / 100)
        .saturating_add(UNIX_EPOCH_TICKS)
        .max(0) as u64;
    FileTime {
        low: ticks as u32,
        high: (ticks >> 32) as u32,
    }
}

pub(crate) fn timespec(time: &FileTime) -> libc::timespec {
    let ticks = (((time.high as u64) << 32) | time.low as u64) as i64 - UNIX_EPOCH_TICKS;
    libc::timespec {
        tv_sec: ticks.div_euclid(TICKS_PER_SECOND) as _,
        tv_nsec: (ticks.rem_euclid(TICKS_PER_SECOND) * 100) as _,
    }
}

#[cfg(not(noctime))]
fn creation_time(st: &libc::stat) -> FileTime {
    // Without a birth time, the older of the change and modification times is
    // the best estimate.
    if (st.st_mtime, st.st_mtime_nsec) < (st.st_ctime, st.st_ctime_nsec) {
        filetime(st.st_mtime as _, st.st_mtime_nsec as _)
    } else {
        filetime(st.st_ctime as _, st.st_ctime_nsec as _)
    }
}

#[cfg(noctime)]
fn creation_time(st: &libc::stat) -> FileTime {
    filetime(st.st_birthtime as _, st.st_birthtime_nsec as _)
}

pub(crate) fn attribute_data(stat: &Stat, name: Option<&OsStr>) -> FileAttributeData {
    let st = &stat.st;
    let size = if stat.is_dir() { 0 } else { st.st_size as u64 };
    FileAttributeData {
        attributes: attributes(stat, name),
        creation_time: creation_time(st),
        last_access_time: filetime(st.st_atime as _, st.st_atime_nsec as _),
        last_write_time: filetime(st.st_mtime as _, st.st_mtime_nsec as _),
        size_high: (size >> 32) as u32,
        size_low: size as u32,
    }
}

pub(crate) fn find_data(stat: &Stat, name: &OsStr) -> FindData {
    let data = attribute_data(stat, Some(name));
    FindData {
        attributes: data.attributes,
        creation_time: data.creation_time,
        last_access_time: data.last_access_time,
        last_write_time: data.last_write_time,
        size_high: data.size_high,
        size_low: data.size_low,
        name: name.to_os_string(),
    }
}
