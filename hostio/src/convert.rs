//! Translation of neutral enums into native flags.
//!
//! None of these fail: an unknown value logs a warning and maps to a fixed
//! fallback.

use hostio_driver::consts::*;

use crate::{FileAccess, FileAttributes, FileMode, FileOptions, FileShare, SeekOrigin};

/// Creation disposition for a [`FileMode`]. Unknown modes open an existing
/// file.
pub fn convert_mode(mode: FileMode) -> u32 {
    match mode {
        FileMode::CREATE_NEW => CREATE_NEW,
        FileMode::CREATE => CREATE_ALWAYS,
        FileMode::OPEN => OPEN_EXISTING,
        FileMode::OPEN_OR_CREATE => OPEN_ALWAYS,
        FileMode::TRUNCATE => TRUNCATE_EXISTING,
        FileMode::APPEND => OPEN_ALWAYS,
        FileMode(other) => {
            tracing::warn!("FileMode has unknown value {other:#x}");
            OPEN_EXISTING
        }
    }
}

/// Access mask for a [`FileAccess`]. Unknown values read only.
pub fn convert_access(access: FileAccess) -> u32 {
    match access {
        FileAccess::READ => GENERIC_READ,
        FileAccess::WRITE => GENERIC_WRITE,
        FileAccess::READ_WRITE => GENERIC_READ | GENERIC_WRITE,
        FileAccess(other) => {
            tracing::warn!("FileAccess has unknown value {other:#x}");
            GENERIC_READ
        }
    }
}

/// Share mode for a [`FileShare`].
///
/// Any bit outside of read, write and delete invalidates the whole value,
/// which then shares nothing.
pub fn convert_share(share: FileShare) -> u32 {
    let known = FileShare::READ | FileShare::WRITE | FileShare::DELETE;
    if share.bits() & !known.bits() != 0 {
        tracing::warn!("FileShare has unknown value {:#x}", share.bits());
        return 0;
    }
    let mut native = 0;
    if share.contains(FileShare::READ) {
        native |= FILE_SHARE_READ;
    }
    if share.contains(FileShare::WRITE) {
        native |= FILE_SHARE_WRITE;
    }
    if share.contains(FileShare::DELETE) {
        native |= FILE_SHARE_DELETE;
    }
    native
}

/// Move method for a [`SeekOrigin`]. Unknown origins seek from the current
/// position.
pub fn convert_seek_origin(origin: SeekOrigin) -> u32 {
    match origin {
        SeekOrigin::BEGIN => FILE_BEGIN,
        SeekOrigin::CURRENT => FILE_CURRENT,
        SeekOrigin::END => FILE_END,
        SeekOrigin(other) => {
            tracing::warn!("SeekOrigin has unknown value {other:#x}");
            FILE_CURRENT
        }
    }
}

/// Native attribute bits for [`FileAttributes`].
pub fn convert_attributes(attrs: FileAttributes) -> u32 {
    let mut native = attrs.bits() as u32;
    if attrs.contains(FileAttributes::ENCRYPTED) {
        native |= FILE_ATTRIBUTE_ENCRYPTED;
    }
    native
}

/// The attribute and flag bundle passed to `create_file` for
/// [`FileOptions`].
pub fn convert_options(options: FileOptions) -> u32 {
    if options.is_empty() {
        return FILE_ATTRIBUTE_NORMAL;
    }
    let mut native = if options.contains(FileOptions::ENCRYPTED) {
        FILE_ATTRIBUTE_ENCRYPTED
    } else {
        FILE_ATTRIBUTE_NORMAL
    };
    for (option, flag) in [
        (FileOptions::DELETE_ON_CLOSE, FILE_FLAG_DELETE_ON_CLOSE),
        (FileOptions::SEQUENTIAL_SCAN, FILE_FLAG_SEQUENTIAL_SCAN),
        (FileOptions::RANDOM_ACCESS, FILE_FLAG_RANDOM_ACCESS),
        (FileOptions::TEMPORARY, FILE_ATTRIBUTE_TEMPORARY),
        (FileOptions::ASYNCHRONOUS, FILE_FLAG_OVERLAPPED),
        (FileOptions::WRITE_THROUGH, FILE_FLAG_WRITE_THROUGH),
    ] {
        if options.contains(option) {
            native |= flag;
        }
    }
    native
}
