use hostio_driver::StdStream;

use crate::{error::run, ErrorCode, FileHandle};

fn std_handle(stream: StdStream) -> Option<FileHandle> {
    let mut error = ErrorCode::SUCCESS;
    run(&mut error, "std_handle", || hostio_driver::std_handle(stream))
        .flatten()
        .map(FileHandle::from)
}

/// A new handle to the standard input of the process, or `None` if it has
/// none. Closing it leaves the process stream open.
pub fn console_input() -> Option<FileHandle> {
    std_handle(StdStream::Input)
}

/// A new handle to the standard output of the process, or `None` if it has
/// none. Closing it leaves the process stream open.
pub fn console_output() -> Option<FileHandle> {
    std_handle(StdStream::Output)
}

/// A new handle to the standard error of the process, or `None` if it has
/// none. Closing it leaves the process stream open.
pub fn console_error() -> Option<FileHandle> {
    std_handle(StdStream::Error)
}

/// Creates an anonymous pipe, returning its `(read, write)` ends. Both are
/// inherited by child processes.
pub fn create_pipe() -> Option<(FileHandle, FileHandle)> {
    let mut error = ErrorCode::SUCCESS;
    let (read, write) = run(&mut error, "create_pipe", hostio_driver::create_pipe)?;
    Some((read.into(), write.into()))
}
