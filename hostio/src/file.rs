use std::path::Path;

use hostio_driver::{
    consts::{FILE_ATTRIBUTE_DIRECTORY, FILE_BEGIN, FILE_CURRENT, FILE_FLAG_BACKUP_SEMANTICS},
    Handle,
};

use crate::{
    convert::{convert_access, convert_mode, convert_options, convert_seek_origin, convert_share},
    error::run,
    filetime::{join_words, split_words, ticks_to_filetime},
    metadata::{resolve_attributes, Native, System},
    remap::remapped,
    ErrorCode, FileAccess, FileMode, FileOptions, FileShare, SeekOrigin,
};

/// An open file, pipe or console stream.
///
/// The handle is released exactly once: by [`close`], which reports the
/// result, or by dropping it, which discards any error.
#[derive(Debug)]
pub struct FileHandle(Handle);

impl FileHandle {
    /// The native handle.
    pub fn as_native(&self) -> &Handle {
        &self.0
    }

    /// Unwraps the native handle.
    pub fn into_native(self) -> Handle {
        self.0
    }
}

impl From<Handle> for FileHandle {
    fn from(handle: Handle) -> Self {
        Self(handle)
    }
}

/// Attribute and flag bundle for opening `path`. An existing directory
/// always gets [`FILE_FLAG_BACKUP_SEMANTICS`].
pub(crate) fn open_flags<N: Native>(native: &N, path: &Path, options: FileOptions) -> u32 {
    let mut flags = convert_options(options);
    if let Ok(attrs) = resolve_attributes(native, path) {
        if attrs & FILE_ATTRIBUTE_DIRECTORY != 0 {
            flags |= FILE_FLAG_BACKUP_SEMANTICS;
        }
    }
    flags
}

/// Opens or creates a file.
pub fn open(
    path: impl AsRef<Path>,
    mode: FileMode,
    access: FileAccess,
    share: FileShare,
    options: FileOptions,
    error: &mut ErrorCode,
) -> Option<FileHandle> {
    let path = remapped(path.as_ref());
    *error = ErrorCode::SUCCESS;
    let flags = open_flags(&System, &path, options);
    run(error, "open", || {
        hostio_driver::create_file(
            &path,
            convert_access(access),
            convert_share(share),
            convert_mode(mode),
            flags,
        )
    })
    .map(FileHandle)
}

/// Closes a handle.
pub fn close(handle: FileHandle, error: &mut ErrorCode) -> bool {
    run(error, "close", || hostio_driver::close_handle(handle.0)).is_some()
}

/// `buf[offset..offset + count]`, or `None` when it is out of bounds.
fn window(len: usize, offset: i32, count: i32) -> Option<std::ops::Range<usize>> {
    let offset = usize::try_from(offset).ok()?;
    let end = offset.checked_add(usize::try_from(count).ok()?)?;
    (end <= len).then_some(offset..end)
}

/// Reads up to `count` bytes into `buf` at `offset`.
///
/// Returns the number of bytes read, 0 at the end of the stream, or -1 on
/// failure. An out-of-bounds window reads nothing and reports success.
pub fn read(
    handle: &FileHandle,
    buf: &mut [u8],
    offset: i32,
    count: i32,
    error: &mut ErrorCode,
) -> i32 {
    *error = ErrorCode::SUCCESS;
    let Some(range) = window(buf.len(), offset, count) else {
        return 0;
    };
    run(error, "read", || hostio_driver::read_file(&handle.0, &mut buf[range]))
        .map_or(-1, |n| n as i32)
}

/// Writes `count` bytes of `buf` from `offset`.
///
/// Returns the number of bytes written or -1 on failure. An out-of-bounds
/// window writes nothing and reports success.
pub fn write(
    handle: &FileHandle,
    buf: &[u8],
    offset: i32,
    count: i32,
    error: &mut ErrorCode,
) -> i32 {
    *error = ErrorCode::SUCCESS;
    let Some(range) = window(buf.len(), offset, count) else {
        return 0;
    };
    run(error, "write", || hostio_driver::write_file(&handle.0, &buf[range]))
        .map_or(-1, |n| n as i32)
}

fn set_pointer(handle: &Handle, offset: i64, method: u32) -> std::io::Result<i64> {
    let (high, low) = split_words(offset);
    let mut high = high as i32;
    let low = hostio_driver::set_file_pointer(handle, low, &mut high, method)?;
    Ok(join_words(high as u32, low))
}

/// Moves the file pointer. Returns the new position, or -1 on failure.
pub fn seek(handle: &FileHandle, offset: i64, origin: SeekOrigin, error: &mut ErrorCode) -> i64 {
    run(error, "seek", || {
        set_pointer(&handle.0, offset, convert_seek_origin(origin))
    })
    .unwrap_or(-1)
}

/// Flushes buffered data to the device.
pub fn flush(handle: &FileHandle, error: &mut ErrorCode) -> bool {
    run(error, "flush", || hostio_driver::flush_file_buffers(&handle.0)).is_some()
}

/// Length of the file, or -1 on failure.
pub fn get_length(handle: &FileHandle, error: &mut ErrorCode) -> i64 {
    run(error, "get_length", || {
        let (low, high) = hostio_driver::get_file_size(&handle.0)?;
        Ok(join_words(high, low))
    })
    .unwrap_or(-1)
}

/// Truncates or extends the file to `length`, keeping the file pointer.
///
/// The steps are not atomic. When one fails the rest are skipped, so the
/// file pointer may be left at `length`.
pub fn set_length(handle: &FileHandle, length: i64, error: &mut ErrorCode) -> bool {
    run(error, "set_length", || {
        let handle = &handle.0;
        let position = set_pointer(handle, 0, FILE_CURRENT)?;
        set_pointer(handle, length, FILE_BEGIN)?;
        hostio_driver::set_end_of_file(handle)?;
        set_pointer(handle, position, FILE_BEGIN)?;
        Ok(())
    })
    .is_some()
}

/// Sets the file times in ticks. A negative time leaves that time unchanged.
pub fn set_file_time(
    handle: &FileHandle,
    creation_time: i64,
    last_access_time: i64,
    last_write_time: i64,
    error: &mut ErrorCode,
) -> bool {
    let time = |ticks: i64| (ticks >= 0).then(|| ticks_to_filetime(ticks));
    let (creation, last_access, last_write) = (
        time(creation_time),
        time(last_access_time),
        time(last_write_time),
    );
    run(error, "set_file_time", || {
        hostio_driver::set_file_time(
            &handle.0,
            creation.as_ref(),
            last_access.as_ref(),
            last_write.as_ref(),
        )
    })
    .is_some()
}

/// Locks `length` bytes from `position`.
pub fn lock(handle: &FileHandle, position: i64, length: i64, error: &mut ErrorCode) {
    let (offset_high, offset_low) = split_words(position);
    let (length_high, length_low) = split_words(length);
    run(error, "lock", || {
        hostio_driver::lock_file(&handle.0, offset_low, offset_high, length_low, length_high)
    });
}

/// Unlocks `length` bytes from `position`.
pub fn unlock(handle: &FileHandle, position: i64, length: i64, error: &mut ErrorCode) {
    let (offset_high, offset_low) = split_words(position);
    let (length_high, length_low) = split_words(length);
    run(error, "unlock", || {
        hostio_driver::unlock_file(&handle.0, offset_low, offset_high, length_low, length_high)
    });
}

/// Kind of the open file, one of the `FILE_TYPE_*` codes.
pub fn get_file_type(handle: &FileHandle, error: &mut ErrorCode) -> i32 {
    run(error, "get_file_type", || hostio_driver::get_file_type(&handle.0))
        .map_or(hostio_driver::consts::FILE_TYPE_UNKNOWN as i32, |ty| ty as i32)
}

#[cfg(test)]
mod tests {
    use hostio_driver::consts::*;

    use super::*;
    use crate::metadata::fake::Fake;

    #[test]
    fn windows() {
        assert_eq!(window(10, 0, 10), Some(0..10));
        assert_eq!(window(10, 4, 0), Some(4..4));
        assert_eq!(window(10, 4, 7), None);
        assert_eq!(window(10, -1, 1), None);
        assert_eq!(window(10, 1, -1), None);
        assert_eq!(window(10, i32::MAX, i32::MAX), None);
    }

    #[test]
    fn directory_gets_backup_semantics() {
        let dir = Fake {
            attributes: Some(Ok(FILE_ATTRIBUTE_DIRECTORY)),
            ..Default::default()
        };
        let flags = open_flags(&dir, Path::new("d"), FileOptions::empty());
        assert_eq!(flags, FILE_ATTRIBUTE_NORMAL | FILE_FLAG_BACKUP_SEMANTICS);

        let file = Fake {
            attributes: Some(Ok(FILE_ATTRIBUTE_ARCHIVE)),
            ..Default::default()
        };
        let flags = open_flags(&file, Path::new("f"), FileOptions::WRITE_THROUGH);
        assert_eq!(flags, FILE_ATTRIBUTE_NORMAL | FILE_FLAG_WRITE_THROUGH);

        let missing = Fake {
            attributes: Some(Err(ERROR_FILE_NOT_FOUND)),
            ..Default::default()
        };
        let flags = open_flags(&missing, Path::new("m"), FileOptions::empty());
        assert_eq!(flags, FILE_ATTRIBUTE_NORMAL);
    }
}
