//! Process-wide share-mode bookkeeping.
//!
//! POSIX has no share modes, so every handle opened by [`super::create_file`]
//! registers its access and share mode here, keyed by device and inode.

use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use once_cell::sync::Lazy;

use crate::{consts::*, NativeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FileKey {
    dev: u64,
    ino: u64,
}

impl FileKey {
    pub(crate) fn from_stat(st: &libc::stat) -> Self {
        Self {
            dev: st.st_dev as _,
            ino: st.st_ino as _,
        }
    }
}

#[derive(Debug)]
struct Entry {
    id: u64,
    access: u32,
    share: u32,
}

impl Entry {
    fn conflicts(&self, access: u32, share: u32) -> bool {
        (access & GENERIC_READ != 0 && self.share & FILE_SHARE_READ == 0)
            || (access & GENERIC_WRITE != 0 && self.share & FILE_SHARE_WRITE == 0)
            || (self.access & GENERIC_READ != 0 && share & FILE_SHARE_READ == 0)
            || (self.access & GENERIC_WRITE != 0 && share & FILE_SHARE_WRITE == 0)
    }
}

static TABLE: Lazy<Mutex<HashMap<FileKey, Vec<Entry>>>> = Lazy::new(Default::default);
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn table() -> MutexGuard<'static, HashMap<FileKey, Vec<Entry>>> {
    TABLE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn violation() -> io::Error {
    NativeError::new(ERROR_SHARING_VIOLATION).into()
}

/// Keeps a handle's share registration alive; dropping it unregisters.
#[derive(Debug)]
pub(crate) struct ShareGuard {
    key: FileKey,
    id: u64,
}

impl Drop for ShareGuard {
    fn drop(&mut self) {
        let mut table = table();
        if let Some(entries) = table.get_mut(&self.key) {
            entries.retain(|e| e.id != self.id);
            if entries.is_empty() {
                table.remove(&self.key);
            }
        }
    }
}

/// Registers a new handle, failing if it conflicts with one already open.
pub(crate) fn acquire(key: FileKey, access: u32, share: u32) -> io::Result<ShareGuard> {
    let mut table = table();
    let entries = table.entry(key).or_default();
    if entries.iter().any(|e| e.conflicts(access, share)) {
        return Err(violation());
    }
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    entries.push(Entry { id, access, share });
    Ok(ShareGuard { key, id })
}

/// Fails if any open handle on the file does not allow deletion.
pub(crate) fn check_delete(key: FileKey) -> io::Result<()> {
    match table().get(&key) {
        Some(entries) if entries.iter().any(|e| e.share & FILE_SHARE_DELETE == 0) => {
            Err(violation())
        }
        _ => Ok(()),
    }
}
