//! Native flag values and error codes.
//!
//! These are the Win32 values on every platform; the Unix backend interprets
//! them itself.

#![allow(missing_docs)]

// Creation dispositions.
pub const CREATE_NEW: u32 = 1;
pub const CREATE_ALWAYS: u32 = 2;
pub const OPEN_EXISTING: u32 = 3;
pub const OPEN_ALWAYS: u32 = 4;
pub const TRUNCATE_EXISTING: u32 = 5;

// Access rights.
pub const GENERIC_READ: u32 = 0x8000_0000;
pub const GENERIC_WRITE: u32 = 0x4000_0000;

// Share modes.
pub const FILE_SHARE_READ: u32 = 0x1;
pub const FILE_SHARE_WRITE: u32 = 0x2;
pub const FILE_SHARE_DELETE: u32 = 0x4;

// Move methods.
pub const FILE_BEGIN: u32 = 0;
pub const FILE_CURRENT: u32 = 1;
pub const FILE_END: u32 = 2;

// File attributes.
pub const FILE_ATTRIBUTE_READONLY: u32 = 0x1;
pub const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
pub const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
pub const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x20;
pub const FILE_ATTRIBUTE_DEVICE: u32 = 0x40;
pub const FILE_ATTRIBUTE_NORMAL: u32 = 0x80;
pub const FILE_ATTRIBUTE_TEMPORARY: u32 = 0x100;
pub const FILE_ATTRIBUTE_SPARSE_FILE: u32 = 0x200;
pub const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
pub const FILE_ATTRIBUTE_COMPRESSED: u32 = 0x800;
pub const FILE_ATTRIBUTE_OFFLINE: u32 = 0x1000;
pub const FILE_ATTRIBUTE_NOT_CONTENT_INDEXED: u32 = 0x2000;
pub const FILE_ATTRIBUTE_ENCRYPTED: u32 = 0x4000;
pub const INVALID_FILE_ATTRIBUTES: u32 = u32::MAX;

// File flags.
pub const FILE_FLAG_WRITE_THROUGH: u32 = 0x8000_0000;
pub const FILE_FLAG_OVERLAPPED: u32 = 0x4000_0000;
pub const FILE_FLAG_RANDOM_ACCESS: u32 = 0x1000_0000;
pub const FILE_FLAG_SEQUENTIAL_SCAN: u32 = 0x0800_0000;
pub const FILE_FLAG_DELETE_ON_CLOSE: u32 = 0x0400_0000;
pub const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;

// ReplaceFile flags.
pub const REPLACEFILE_WRITE_THROUGH: u32 = 0x1;
pub const REPLACEFILE_IGNORE_MERGE_ERRORS: u32 = 0x2;

// File types.
pub const FILE_TYPE_UNKNOWN: u32 = 0;
pub const FILE_TYPE_DISK: u32 = 1;
pub const FILE_TYPE_CHAR: u32 = 2;
pub const FILE_TYPE_PIPE: u32 = 3;

// Error codes.
pub const ERROR_SUCCESS: u32 = 0;
pub const ERROR_INVALID_FUNCTION: u32 = 1;
pub const ERROR_FILE_NOT_FOUND: u32 = 2;
pub const ERROR_PATH_NOT_FOUND: u32 = 3;
pub const ERROR_TOO_MANY_OPEN_FILES: u32 = 4;
pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_INVALID_HANDLE: u32 = 6;
pub const ERROR_NOT_ENOUGH_MEMORY: u32 = 8;
pub const ERROR_BAD_FORMAT: u32 = 11;
pub const ERROR_NOT_SAME_DEVICE: u32 = 17;
pub const ERROR_NO_MORE_FILES: u32 = 18;
pub const ERROR_GEN_FAILURE: u32 = 31;
pub const ERROR_SHARING_VIOLATION: u32 = 32;
pub const ERROR_LOCK_VIOLATION: u32 = 33;
pub const ERROR_HANDLE_EOF: u32 = 38;
pub const ERROR_HANDLE_DISK_FULL: u32 = 39;
pub const ERROR_NOT_SUPPORTED: u32 = 50;
pub const ERROR_FILE_EXISTS: u32 = 80;
pub const ERROR_CANNOT_MAKE: u32 = 82;
pub const ERROR_INVALID_PARAMETER: u32 = 87;
pub const ERROR_BROKEN_PIPE: u32 = 109;
pub const ERROR_INVALID_NAME: u32 = 123;
pub const ERROR_NEGATIVE_SEEK: u32 = 131;
pub const ERROR_DIR_NOT_EMPTY: u32 = 145;
pub const ERROR_NOT_LOCKED: u32 = 158;
pub const ERROR_ALREADY_EXISTS: u32 = 183;
pub const ERROR_FILENAME_EXCED_RANGE: u32 = 206;
pub const ERROR_CANT_RESOLVE_FILENAME: u32 = 1921;

#[cfg(windows)]
const _: () = {
    use windows_sys::Win32::{Foundation, Storage::FileSystem};

    assert!(FILE_FLAG_BACKUP_SEMANTICS == FileSystem::FILE_FLAG_BACKUP_SEMANTICS);
    assert!(FILE_FLAG_DELETE_ON_CLOSE == FileSystem::FILE_FLAG_DELETE_ON_CLOSE);
    assert!(FILE_ATTRIBUTE_ENCRYPTED == FileSystem::FILE_ATTRIBUTE_ENCRYPTED);
    assert!(FILE_SHARE_DELETE == FileSystem::FILE_SHARE_DELETE);
    assert!(TRUNCATE_EXISTING == FileSystem::TRUNCATE_EXISTING);
    assert!(ERROR_SHARING_VIOLATION == Foundation::ERROR_SHARING_VIOLATION);
    assert!(ERROR_FILE_NOT_FOUND == Foundation::ERROR_FILE_NOT_FOUND);
};
