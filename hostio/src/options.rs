//! Platform-neutral enums as they cross the host boundary.
//!
//! The values are raw integers chosen by the host, so every type accepts any
//! value; translation into native flags lives in [`crate::convert`].

#![allow(missing_docs)]

use bitflags::bitflags;

/// How to open or create a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileMode(pub i32);

impl FileMode {
    pub const CREATE_NEW: Self = Self(1);
    pub const CREATE: Self = Self(2);
    pub const OPEN: Self = Self(3);
    pub const OPEN_OR_CREATE: Self = Self(4);
    pub const TRUNCATE: Self = Self(5);
    pub const APPEND: Self = Self(6);
}

/// Requested access to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileAccess(pub i32);

impl FileAccess {
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(2);
    pub const READ_WRITE: Self = Self(3);
}

/// Reference point of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SeekOrigin(pub i32);

impl SeekOrigin {
    pub const BEGIN: Self = Self(0);
    pub const CURRENT: Self = Self(1);
    pub const END: Self = Self(2);
}

bitflags! {
    /// Access other handles may have while this one is open. The empty set
    /// means no sharing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileShare: i32 {
        const READ = 1;
        const WRITE = 2;
        const DELETE = 4;
        const _ = !0;
    }

    /// File attribute bits. They coincide with the native bits, except for
    /// [`FileAttributes::ENCRYPTED`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileAttributes: i32 {
        const READ_ONLY = 0x1;
        const HIDDEN = 0x2;
        const SYSTEM = 0x4;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
        const DEVICE = 0x40;
        const NORMAL = 0x80;
        const TEMPORARY = 0x100;
        const SPARSE_FILE = 0x200;
        const REPARSE_POINT = 0x400;
        const COMPRESSED = 0x800;
        const OFFLINE = 0x1000;
        const NOT_CONTENT_INDEXED = 0x2000;
        const ENCRYPTED = 0x4000;
        const _ = !0;
    }

    /// Extra behavior requested when opening a file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileOptions: i32 {
        const TEMPORARY = 1;
        const ENCRYPTED = 0x4000;
        const DELETE_ON_CLOSE = 0x0400_0000;
        const SEQUENTIAL_SCAN = 0x0800_0000;
        const RANDOM_ACCESS = 0x1000_0000;
        const ASYNCHRONOUS = 0x4000_0000;
        const WRITE_THROUGH = 0x8000_0000_u32 as i32;
        const _ = !0;
    }
}
