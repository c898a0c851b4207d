use std::{
    ffi::OsString,
    io,
    mem::MaybeUninit,
    os::windows::{
        ffi::OsStringExt,
        io::{AsRawHandle, FromRawHandle, IntoRawHandle, OwnedHandle, RawHandle},
    },
    path::{Path, PathBuf},
    ptr::{null, null_mut},
};

use widestring::{U16CStr, U16CString};
use windows_sys::Win32::{
    Foundation::{
        CloseHandle, DuplicateHandle, GetLastError, DUPLICATE_SAME_ACCESS, FILETIME, HANDLE,
        NO_ERROR,
    },
    Security::SECURITY_ATTRIBUTES,
    Storage::FileSystem::{
        CopyFileW, CreateDirectoryW, CreateFileW, DeleteFileW, FindClose, FindFirstFileW,
        FindNextFileW, FlushFileBuffers, GetFileAttributesExW, GetFileAttributesW, GetFileSize,
        GetFileType, GetFileExInfoStandard, LockFile, MoveFileExW, ReadFile, RemoveDirectoryW,
        ReplaceFileW, SetEndOfFile, SetFileAttributesW, SetFilePointer, SetFileTime, UnlockFile,
        WriteFile, INVALID_FILE_SIZE, INVALID_SET_FILE_POINTER, MOVEFILE_COPY_ALLOWED,
        WIN32_FILE_ATTRIBUTE_DATA, WIN32_FIND_DATAW,
    },
    System::{
        Console::{GetStdHandle, STD_ERROR_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE},
        Pipes::CreatePipe,
        Threading::GetCurrentProcess,
    },
};

use crate::{consts::*, FileAttributeData, FileTime, FindData, NativeError, StdStream};

fn wide(path: &Path) -> io::Result<U16CString> {
    U16CString::from_os_str(path).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "file name contained an unexpected NUL byte",
        )
    })
}

/// Windows errors are already in the neutral space.
pub(crate) fn os_error_code(code: i32) -> u32 {
    code as u32
}

fn filetime(ft: &FILETIME) -> FileTime {
    FileTime {
        low: ft.dwLowDateTime,
        high: ft.dwHighDateTime,
    }
}

fn native_filetime(time: &FileTime) -> FILETIME {
    FILETIME {
        dwLowDateTime: time.low,
        dwHighDateTime: time.high,
    }
}

/// An open native file.
#[derive(Debug)]
pub struct Handle(OwnedHandle);

impl Handle {
    fn raw(&self) -> HANDLE {
        self.0.as_raw_handle() as _
    }

    /// # Safety
    ///
    /// `handle` must be a valid handle owned by the caller.
    unsafe fn from_raw(handle: HANDLE) -> Self {
        Self(OwnedHandle::from_raw_handle(handle as RawHandle))
    }
}

impl AsRawHandle for Handle {
    fn as_raw_handle(&self) -> RawHandle {
        self.0.as_raw_handle()
    }
}

impl From<OwnedHandle> for Handle {
    fn from(handle: OwnedHandle) -> Self {
        Self(handle)
    }
}

/// An in-progress `FindFirstFileW` enumeration.
#[derive(Debug)]
pub struct FindHandle(HANDLE);

impl Drop for FindHandle {
    fn drop(&mut self) {
        unsafe { FindClose(self.0) };
    }
}

fn find_data(data: &WIN32_FIND_DATAW) -> FindData {
    let name = U16CStr::from_slice_truncate(&data.cFileName)
        .map(U16CStr::to_os_string)
        .unwrap_or_else(|_| OsString::from_wide(&data.cFileName));
    FindData {
        attributes: data.dwFileAttributes,
        creation_time: filetime(&data.ftCreationTime),
        last_access_time: filetime(&data.ftLastAccessTime),
        last_write_time: filetime(&data.ftLastWriteTime),
        size_high: data.nFileSizeHigh,
        size_low: data.nFileSizeLow,
        name,
    }
}

/// Starts enumerating the entries matching `pattern`.
pub fn find_first_file(pattern: &Path) -> io::Result<(FindHandle, FindData)> {
    let pattern = wide(pattern)?;
    let mut data = MaybeUninit::<WIN32_FIND_DATAW>::uninit();
    let handle = syscall!(HANDLE, FindFirstFileW(pattern.as_ptr(), data.as_mut_ptr()))?;
    // SAFETY: the call succeeded and filled the buffer.
    let data = unsafe { data.assume_init() };
    Ok((FindHandle(handle), find_data(&data)))
}

/// Next entry, or `None` once the enumeration is exhausted.
pub fn find_next_file(find: &mut FindHandle) -> io::Result<Option<FindData>> {
    let mut data = MaybeUninit::<WIN32_FIND_DATAW>::uninit();
    match syscall!(BOOL, FindNextFileW(find.0, data.as_mut_ptr())) {
        // SAFETY: the call succeeded and filled the buffer.
        Ok(_) => Ok(Some(find_data(unsafe { data.assume_init_ref() }))),
        Err(e) if e.raw_os_error() == Some(ERROR_NO_MORE_FILES as _) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Ends an enumeration.
pub fn find_close(find: FindHandle) -> io::Result<()> {
    let handle = find.0;
    std::mem::forget(find);
    syscall!(BOOL, FindClose(handle))?;
    Ok(())
}

/// Creates a directory.
pub fn create_directory(path: &Path) -> io::Result<()> {
    let path = wide(path)?;
    syscall!(BOOL, CreateDirectoryW(path.as_ptr(), null()))?;
    Ok(())
}

/// Removes an empty directory.
pub fn remove_directory(path: &Path) -> io::Result<()> {
    let path = wide(path)?;
    syscall!(BOOL, RemoveDirectoryW(path.as_ptr()))?;
    Ok(())
}

/// The working directory of the process.
pub fn current_directory() -> io::Result<PathBuf> {
    std::env::current_dir()
}

/// Changes the working directory of the process.
pub fn set_current_directory(path: &Path) -> io::Result<()> {
    std::env::set_current_dir(path)
}

/// Moves a file or directory, copying across volumes.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    let (src, dst) = (wide(src)?, wide(dst)?);
    syscall!(
        BOOL,
        MoveFileExW(src.as_ptr(), dst.as_ptr(), MOVEFILE_COPY_ALLOWED)
    )?;
    Ok(())
}

/// Replaces `replaced` with `replacement`, keeping the old file at `backup`
/// when given.
pub fn replace_file(
    replaced: &Path,
    replacement: &Path,
    backup: Option<&Path>,
    flags: u32,
) -> io::Result<()> {
    let (replaced, replacement) = (wide(replaced)?, wide(replacement)?);
    let backup = backup.map(wide).transpose()?;
    syscall!(
        BOOL,
        ReplaceFileW(
            replaced.as_ptr(),
            replacement.as_ptr(),
            backup.as_ref().map_or(null(), |b| b.as_ptr()),
            flags,
            null(),
            null(),
        )
    )?;
    Ok(())
}

/// Copies a file.
pub fn copy_file(src: &Path, dst: &Path, fail_if_exists: bool) -> io::Result<()> {
    let (src, dst) = (wide(src)?, wide(dst)?);
    syscall!(
        BOOL,
        CopyFileW(src.as_ptr(), dst.as_ptr(), fail_if_exists as _)
    )?;
    Ok(())
}

/// Deletes a file.
pub fn delete_file(path: &Path) -> io::Result<()> {
    let path = wide(path)?;
    syscall!(BOOL, DeleteFileW(path.as_ptr()))?;
    Ok(())
}

/// Attribute bits of a path.
pub fn get_file_attributes(path: &Path) -> io::Result<u32> {
    let path = wide(path)?;
    syscall!(GetFileAttributesW(path.as_ptr()), == INVALID_FILE_ATTRIBUTES)
}

/// Attributes, timestamps and length of a path.
pub fn get_file_attributes_ex(path: &Path) -> io::Result<FileAttributeData> {
    let path = wide(path)?;
    let mut data = MaybeUninit::<WIN32_FILE_ATTRIBUTE_DATA>::uninit();
    syscall!(
        BOOL,
        GetFileAttributesExW(
            path.as_ptr(),
            GetFileExInfoStandard,
            data.as_mut_ptr().cast()
        )
    )?;
    // SAFETY: the call succeeded and filled the buffer.
    let data = unsafe { data.assume_init() };
    Ok(FileAttributeData {
        attributes: data.dwFileAttributes,
        creation_time: filetime(&data.ftCreationTime),
        last_access_time: filetime(&data.ftLastAccessTime),
        last_write_time: filetime(&data.ftLastWriteTime),
        size_high: data.nFileSizeHigh,
        size_low: data.nFileSizeLow,
    })
}

/// Sets the attribute bits of a path.
pub fn set_file_attributes(path: &Path, attrs: u32) -> io::Result<()> {
    let path = wide(path)?;
    syscall!(BOOL, SetFileAttributesW(path.as_ptr(), attrs))?;
    Ok(())
}

/// The directory for temporary files.
pub fn temp_path() -> io::Result<PathBuf> {
    Ok(std::env::temp_dir())
}

/// Opens or creates a file.
pub fn create_file(
    path: &Path,
    access: u32,
    share: u32,
    disposition: u32,
    flags: u32,
) -> io::Result<Handle> {
    let path = wide(path)?;
    let handle = syscall!(
        HANDLE,
        CreateFileW(
            path.as_ptr(),
            access,
            share,
            null(),
            disposition,
            flags,
            0,
        )
    )?;
    // SAFETY: the call succeeded and returned a fresh handle.
    Ok(unsafe { Handle::from_raw(handle) })
}

/// Closes a handle, reporting the result of `CloseHandle`.
pub fn close_handle(handle: Handle) -> io::Result<()> {
    let raw = handle.0.into_raw_handle();
    syscall!(BOOL, CloseHandle(raw as _))?;
    Ok(())
}

/// Reads into `buf`, returning the number of bytes read.
pub fn read_file(handle: &Handle, buf: &mut [u8]) -> io::Result<u32> {
    let mut read = 0;
    let len = buf.len().min(u32::MAX as usize) as u32;
    syscall!(
        BOOL,
        ReadFile(
            handle.raw(),
            buf.as_mut_ptr().cast(),
            len,
            &mut read,
            null_mut()
        )
    )?;
    Ok(read)
}

/// Writes `buf`, returning the number of bytes written.
pub fn write_file(handle: &Handle, buf: &[u8]) -> io::Result<u32> {
    let mut written = 0;
    let len = buf.len().min(u32::MAX as usize) as u32;
    syscall!(
        BOOL,
        WriteFile(
            handle.raw(),
            buf.as_ptr().cast(),
            len,
            &mut written,
            null_mut()
        )
    )?;
    Ok(written)
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
    let low = unsafe { SetFilePointer(handle.raw(), distance_low as i32, distance_high, method) };
    // A low word of all ones is only a failure when the last error says so.
    if low == INVALID_SET_FILE_POINTER && unsafe { GetLastError() } != NO_ERROR {
        return Err(io::Error::last_os_error());
    }
    Ok(low)
}

/// Flushes the file to disk.
pub fn flush_file_buffers(handle: &Handle) -> io::Result<()> {
    syscall!(BOOL, FlushFileBuffers(handle.raw()))?;
    Ok(())
}

/// Returns the `(low, high)` words of the file length.
pub fn get_file_size(handle: &Handle) -> io::Result<(u32, u32)> {
    let mut high = 0;
    let low = unsafe { GetFileSize(handle.raw(), &mut high) };
    if low == INVALID_FILE_SIZE && unsafe { GetLastError() } != NO_ERROR {
        return Err(io::Error::last_os_error());
    }
    Ok((low, high))
}

/// Truncates or extends the file at the current file pointer.
pub fn set_end_of_file(handle: &Handle) -> io::Result<()> {
    syscall!(BOOL, SetEndOfFile(handle.raw()))?;
    Ok(())
}

/// Sets the file times. `None` leaves a time unchanged.
pub fn set_file_time(
    handle: &Handle,
    creation: Option<&FileTime>,
    last_access: Option<&FileTime>,
    last_write: Option<&FileTime>,
) -> io::Result<()> {
    let creation = creation.map(native_filetime);
    let last_access = last_access.map(native_filetime);
    let last_write = last_write.map(native_filetime);
    let ptr = |t: &Option<FILETIME>| t.as_ref().map_or(null(), |t| t as *const FILETIME);
    syscall!(
        BOOL,
        SetFileTime(
            handle.raw(),
            ptr(&creation),
            ptr(&last_access),
            ptr(&last_write)
        )
    )?;
    Ok(())
}

/// Locks a byte range.
pub fn lock_file(
    handle: &Handle,
    offset_low: u32,
    offset_high: u32,
    length_low: u32,
    length_high: u32,
) -> io::Result<()> {
    syscall!(
        BOOL,
        LockFile(handle.raw(), offset_low, offset_high, length_low, length_high)
    )?;
    Ok(())
}

/// Unlocks a byte range.
pub fn unlock_file(
    handle: &Handle,
    offset_low: u32,
    offset_high: u32,
    length_low: u32,
    length_high: u32,
) -> io::Result<()> {
    syscall!(
        BOOL,
        UnlockFile(handle.raw(), offset_low, offset_high, length_low, length_high)
    )?;
    Ok(())
}

/// Kind of the open file, one of the `FILE_TYPE_*` values.
pub fn get_file_type(handle: &Handle) -> io::Result<u32> {
    let ty = unsafe { GetFileType(handle.raw()) };
    if ty == FILE_TYPE_UNKNOWN {
        let code = unsafe { GetLastError() };
        if code != NO_ERROR {
            return Err(NativeError::new(code).into());
        }
    }
    Ok(ty)
}

/// Duplicates a standard stream, or returns `None` when it is closed.
pub fn std_handle(stream: StdStream) -> io::Result<Option<Handle>> {
    let id = match stream {
        StdStream::Input => STD_INPUT_HANDLE,
        StdStream::Output => STD_OUTPUT_HANDLE,
        StdStream::Error => STD_ERROR_HANDLE,
    };
    let handle = syscall!(HANDLE, GetStdHandle(id))?;
    if handle == 0 {
        return Ok(None);
    }
    let mut dup = 0;
    let process = unsafe { GetCurrentProcess() };
    syscall!(
        BOOL,
        DuplicateHandle(process, handle, process, &mut dup, 0, 0, DUPLICATE_SAME_ACCESS)
    )?;
    // SAFETY: the duplicate belongs to us.
    Ok(Some(unsafe { Handle::from_raw(dup) }))
}

/// Creates an anonymous pipe whose ends are inherited by child processes.
pub fn create_pipe() -> io::Result<(Handle, Handle)> {
    let attrs = SECURITY_ATTRIBUTES {
        nLength: std::mem::size_of::<SECURITY_ATTRIBUTES>() as _,
        lpSecurityDescriptor: null_mut(),
        bInheritHandle: 1,
    };
    let (mut read, mut write) = (0, 0);
    syscall!(BOOL, CreatePipe(&mut read, &mut write, &attrs, 0))?;
    // SAFETY: both ends were just created.
    Ok(unsafe { (Handle::from_raw(read), Handle::from_raw(write)) })
}
