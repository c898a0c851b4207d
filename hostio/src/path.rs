use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{error::run, remap::remapped, ErrorCode};

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        /// Separates a volume from the rest of a path.
        pub const VOLUME_SEPARATOR_CHAR: char = ':';
        /// The preferred directory separator.
        pub const DIRECTORY_SEPARATOR_CHAR: char = '\\';
        /// The alternative directory separator.
        pub const ALT_DIRECTORY_SEPARATOR_CHAR: char = '/';
        /// Separates entries of a path list.
        pub const PATH_SEPARATOR: char = ';';

        const INVALID_PATH_CHARS: &[char] = &[
            '"', '<', '>', '|', '\u{8}', '\u{10}', '\u{11}', '\u{12}', '\u{14}', '\u{15}',
            '\u{16}', '\u{17}', '\u{18}', '\u{19}', '\0',
        ];
    } else {
        /// Separates a volume from the rest of a path.
        pub const VOLUME_SEPARATOR_CHAR: char = '/';
        /// The preferred directory separator.
        pub const DIRECTORY_SEPARATOR_CHAR: char = '/';
        /// The alternative directory separator.
        pub const ALT_DIRECTORY_SEPARATOR_CHAR: char = '/';
        /// Separates entries of a path list.
        pub const PATH_SEPARATOR: char = ':';

        const INVALID_PATH_CHARS: &[char] = &['\0'];
    }
}

/// Characters that may not appear in a path.
pub fn invalid_path_chars() -> &'static [char] {
    INVALID_PATH_CHARS
}

/// The directory for temporary files, ending with a directory separator.
pub fn get_temp_path() -> Option<PathBuf> {
    let mut error = ErrorCode::SUCCESS;
    let path = run(&mut error, "get_temp_path", hostio_driver::temp_path)?;
    let mut path = OsString::from(path);
    if !path
        .to_string_lossy()
        .ends_with([DIRECTORY_SEPARATOR_CHAR, ALT_DIRECTORY_SEPARATOR_CHAR])
    {
        path.push(DIRECTORY_SEPARATOR_CHAR.encode_utf8(&mut [0; 4]));
    }
    Some(path.into())
}

/// The working directory of the process.
pub fn get_current_directory(error: &mut ErrorCode) -> Option<PathBuf> {
    run(error, "get_current_directory", hostio_driver::current_directory)
}

/// Changes the working directory of the process.
pub fn set_current_directory(path: impl AsRef<Path>, error: &mut ErrorCode) -> bool {
    let path = remapped(path.as_ref());
    run(error, "set_current_directory", || {
        hostio_driver::set_current_directory(&path)
    })
    .is_some()
}
