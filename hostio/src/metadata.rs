use std::{
    io,
    path::{Path, PathBuf},
};

use hostio_driver::{consts::ERROR_SHARING_VIOLATION, FileAttributeData, FindData};

use crate::{
    error::run,
    filetime::{filetime_to_ticks, join_words},
    remap::remapped,
    ErrorCode, FileAttributes,
};

/// The native attribute and enumeration calls the resolver and enumerator
/// are written against.
pub trait Native {
    /// An open enumeration.
    type Find;

    /// Attribute bits of a path.
    fn file_attributes(&self, path: &Path) -> io::Result<u32>;

    /// Attributes, timestamps and length of a path.
    fn file_attribute_data(&self, path: &Path) -> io::Result<FileAttributeData>;

    /// Starts an enumeration of `pattern`.
    fn find_first(&self, pattern: &Path) -> io::Result<(Self::Find, FindData)>;

    /// Next entry, `None` once exhausted.
    fn find_next(&self, find: &mut Self::Find) -> io::Result<Option<FindData>>;

    /// Ends an enumeration.
    fn find_close(&self, find: Self::Find) -> io::Result<()>;
}

/// [`Native`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

impl Native for System {
    type Find = hostio_driver::FindHandle;

    fn file_attributes(&self, path: &Path) -> io::Result<u32> {
        hostio_driver::get_file_attributes(path)
    }

    fn file_attribute_data(&self, path: &Path) -> io::Result<FileAttributeData> {
        hostio_driver::get_file_attributes_ex(path)
    }

    fn find_first(&self, pattern: &Path) -> io::Result<(Self::Find, FindData)> {
        hostio_driver::find_first_file(pattern)
    }

    fn find_next(&self, find: &mut Self::Find) -> io::Result<Option<FindData>> {
        hostio_driver::find_next_file(find)
    }

    fn find_close(&self, find: Self::Find) -> io::Result<()> {
        hostio_driver::find_close(find)
    }
}

fn is_sharing_violation(err: &io::Error) -> bool {
    hostio_driver::error_code(err) == ERROR_SHARING_VIOLATION
}

/// Looks `path` up through a single-entry enumeration.
fn find_single<N: Native>(native: &N, path: &Path) -> io::Result<FindData> {
    let (find, data) = native.find_first(path)?;
    if let Err(e) = native.find_close(find) {
        tracing::debug!("closing the lookup of {} failed: {e}", path.display());
    }
    Ok(data)
}

/// Runs `direct`, falling back to a single-entry enumeration only when it
/// fails with a sharing violation. If the fallback fails too, the direct
/// call's error is returned.
fn with_find_fallback<N: Native, T>(
    native: &N,
    path: &Path,
    direct: impl FnOnce(&N, &Path) -> io::Result<T>,
    from_find: impl FnOnce(FindData) -> T,
) -> io::Result<T> {
    match direct(native, path) {
        Err(e) if is_sharing_violation(&e) => {
            tracing::trace!("{} is locked, looking it up by enumeration", path.display());
            find_single(native, path).map(from_find).map_err(|_| e)
        }
        res => res,
    }
}

/// Attribute bits of `path`, tolerating a sharing violation.
pub fn resolve_attributes<N: Native>(native: &N, path: &Path) -> io::Result<u32> {
    with_find_fallback(native, path, N::file_attributes, |data| data.attributes)
}

/// Attribute data of `path`, tolerating a sharing violation.
pub fn resolve_attribute_data<N: Native>(
    native: &N,
    path: &Path,
) -> io::Result<FileAttributeData> {
    with_find_fallback(native, path, N::file_attribute_data, |data| {
        FileAttributeData::from(&data)
    })
}

/// Metadata of a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeutralStat {
    /// Attribute bits.
    pub attributes: FileAttributes,
    /// Creation time in ticks.
    pub creation_time: i64,
    /// Last access time in ticks.
    pub last_access_time: i64,
    /// Last write time in ticks.
    pub last_write_time: i64,
    /// Length in bytes.
    pub length: i64,
    /// The queried path.
    pub name: PathBuf,
}

impl NeutralStat {
    fn new(data: &FileAttributeData, name: &Path) -> Self {
        Self {
            attributes: FileAttributes::from_bits_retain(data.attributes as i32),
            creation_time: filetime_to_ticks(&data.creation_time),
            last_access_time: filetime_to_ticks(&data.last_access_time),
            last_write_time: filetime_to_ticks(&data.last_write_time),
            length: join_words(data.size_high, data.size_low),
            name: name.to_path_buf(),
        }
    }
}

/// Attribute bits of `path`, or `-1` on failure.
pub fn get_file_attributes(path: impl AsRef<Path>, error: &mut ErrorCode) -> i32 {
    let path = remapped(path.as_ref());
    run(error, "get_file_attributes", || {
        resolve_attributes(&System, &path)
    })
    .map_or(-1, |attrs| attrs as i32)
}

/// Fills `stat` with the metadata of `path`. On failure `stat` is reset to
/// its zeroed default and `false` is returned.
pub fn get_file_stat(
    path: impl AsRef<Path>,
    stat: &mut NeutralStat,
    error: &mut ErrorCode,
) -> bool {
    let path = remapped(path.as_ref());
    match run(error, "get_file_stat", || {
        resolve_attribute_data(&System, &path)
    }) {
        Some(data) => {
            *stat = NeutralStat::new(&data, &path);
            true
        }
        None => {
            *stat = NeutralStat::default();
            false
        }
    }
}
