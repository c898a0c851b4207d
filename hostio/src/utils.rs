use std::path::Path;

use hostio_driver::consts::{REPLACEFILE_IGNORE_MERGE_ERRORS, REPLACEFILE_WRITE_THROUGH};

use crate::{convert::convert_attributes, error::run, remap::remapped, ErrorCode, FileAttributes};

/// Creates a new, empty directory.
pub fn create_directory(path: impl AsRef<Path>, error: &mut ErrorCode) -> bool {
    let path = remapped(path.as_ref());
    run(error, "create_directory", || {
        hostio_driver::create_directory(&path)
    })
    .is_some()
}

/// Removes an empty directory.
pub fn remove_directory(path: impl AsRef<Path>, error: &mut ErrorCode) -> bool {
    let path = remapped(path.as_ref());
    run(error, "remove_directory", || {
        hostio_driver::remove_directory(&path)
    })
    .is_some()
}

/// Moves a file or directory. An existing destination is an error.
pub fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>, error: &mut ErrorCode) -> bool {
    let src = remapped(src.as_ref());
    let dst = remapped(dst.as_ref());
    run(error, "move_file", || hostio_driver::move_file(&src, &dst)).is_some()
}

/// Replaces `dst` with `src`, first moving the old `dst` to `backup` when
/// given.
pub fn replace_file(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    backup: Option<&Path>,
    ignore_metadata_errors: bool,
    error: &mut ErrorCode,
) -> bool {
    let src = remapped(src.as_ref());
    let dst = remapped(dst.as_ref());
    let backup = backup.map(remapped);
    let mut flags = REPLACEFILE_WRITE_THROUGH;
    if ignore_metadata_errors {
        flags |= REPLACEFILE_IGNORE_MERGE_ERRORS;
    }
    run(error, "replace_file", || {
        hostio_driver::replace_file(&dst, &src, backup.as_deref(), flags)
    })
    .is_some()
}

/// Copies a file. Without `overwrite` an existing destination is an error.
pub fn copy_file(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    overwrite: bool,
    error: &mut ErrorCode,
) -> bool {
    let src = remapped(src.as_ref());
    let dst = remapped(dst.as_ref());
    run(error, "copy_file", || {
        hostio_driver::copy_file(&src, &dst, !overwrite)
    })
    .is_some()
}

/// Deletes a file.
pub fn delete_file(path: impl AsRef<Path>, error: &mut ErrorCode) -> bool {
    let path = remapped(path.as_ref());
    run(error, "delete_file", || hostio_driver::delete_file(&path)).is_some()
}

/// Sets the attributes of a path.
pub fn set_file_attributes(
    path: impl AsRef<Path>,
    attrs: FileAttributes,
    error: &mut ErrorCode,
) -> bool {
    let path = remapped(path.as_ref());
    run(error, "set_file_attributes", || {
        hostio_driver::set_file_attributes(&path, convert_attributes(attrs))
    })
    .is_some()
}
