use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use hostio_driver::consts::ERROR_FILE_NOT_FOUND;

use crate::{
    convert::convert_attributes,
    error::run,
    metadata::{Native, System},
    remap::remapped,
    ErrorCode, FileAttributes,
};

fn is_pseudo_entry(name: &OsStr) -> bool {
    name == "." || name == ".."
}

/// Lists the entries matching `pattern`, joined onto `dir`, in enumeration
/// order.
///
/// An entry is kept when `attributes & mask == attrs`. No match at all is an
/// empty listing, and `.`/`..` are never listed. A failure of the final
/// close turns the whole listing into an error.
pub fn list_entries<N: Native>(
    native: &N,
    dir: &Path,
    pattern: &Path,
    attrs: FileAttributes,
    mask: FileAttributes,
) -> io::Result<Vec<PathBuf>> {
    let (mut find, first) = match native.find_first(pattern) {
        Ok(res) => res,
        Err(e) if hostio_driver::error_code(&e) == ERROR_FILE_NOT_FOUND => return Ok(vec![]),
        Err(e) => return Err(e),
    };
    let attrs = attrs.bits() as u32;
    let mask = convert_attributes(mask);
    let mut entries = vec![];
    let mut data = Some(first);
    while let Some(entry) = data {
        if !is_pseudo_entry(&entry.name) && entry.attributes & mask == attrs {
            entries.push(dir.join(&entry.name));
        }
        data = match native.find_next(&mut find) {
            Ok(next) => next,
            Err(e) => {
                tracing::trace!("enumeration of {} ended: {e}", pattern.display());
                None
            }
        };
    }
    native.find_close(find)?;
    Ok(entries)
}

/// Lists the entries of `dir` matching `pattern`, a path of the form
/// `dir/glob`. Returns `None` on failure.
pub fn get_file_system_entries(
    dir: impl AsRef<Path>,
    pattern: impl AsRef<Path>,
    attrs: FileAttributes,
    mask: FileAttributes,
    error: &mut ErrorCode,
) -> Option<Vec<PathBuf>> {
    let dir = remapped(dir.as_ref());
    let pattern = remapped(pattern.as_ref());
    run(error, "get_file_system_entries", || {
        list_entries(&System, &dir, &pattern, attrs, mask)
    })
}

#[cfg(test)]
mod tests {
    use hostio_driver::{consts::*, FindData};

    use super::*;
    use crate::metadata::fake::Fake;

    fn entry(name: &str, attributes: u32) -> FindData {
        FindData {
            attributes,
            name: name.into(),
            ..Default::default()
        }
    }

    fn listing() -> Vec<FindData> {
        vec![
            entry(".", FILE_ATTRIBUTE_DIRECTORY),
            entry("..", FILE_ATTRIBUTE_DIRECTORY),
            entry("b", FILE_ATTRIBUTE_NORMAL),
            entry("sub", FILE_ATTRIBUTE_DIRECTORY),
            entry("a", FILE_ATTRIBUTE_HIDDEN),
        ]
    }

    fn list(fake: &Fake, attrs: FileAttributes, mask: FileAttributes) -> io::Result<Vec<PathBuf>> {
        list_entries(fake, Path::new("d"), Path::new("d/*"), attrs, mask)
    }

    #[test]
    fn all_entries_in_order() {
        let fake = Fake {
            entries: listing(),
            ..Default::default()
        };
        let entries = list(&fake, FileAttributes::empty(), FileAttributes::empty()).unwrap();
        assert_eq!(
            entries,
            [Path::new("d/b"), Path::new("d/sub"), Path::new("d/a")]
        );
    }

    #[test]
    fn mask_and_value() {
        let fake = Fake {
            entries: listing(),
            ..Default::default()
        };
        let dirs = list(&fake, FileAttributes::DIRECTORY, FileAttributes::DIRECTORY).unwrap();
        assert_eq!(dirs, [Path::new("d/sub")]);
        let files = list(&fake, FileAttributes::empty(), FileAttributes::DIRECTORY).unwrap();
        assert_eq!(files, [Path::new("d/b"), Path::new("d/a")]);
    }

    #[test]
    fn no_match_is_empty() {
        let fake = Fake::default();
        assert!(list(&fake, FileAttributes::empty(), FileAttributes::empty())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn find_error_is_reported() {
        let fake = Fake {
            find_error: Some(ERROR_PATH_NOT_FOUND),
            ..Default::default()
        };
        let err = list(&fake, FileAttributes::empty(), FileAttributes::empty()).unwrap_err();
        assert_eq!(hostio_driver::error_code(&err), ERROR_PATH_NOT_FOUND);
    }

    #[test]
    fn next_error_ends_listing() {
        let fake = Fake {
            entries: vec![entry("a", FILE_ATTRIBUTE_NORMAL)],
            next_error: Some(ERROR_GEN_FAILURE),
            ..Default::default()
        };
        let entries = list(&fake, FileAttributes::empty(), FileAttributes::empty()).unwrap();
        assert_eq!(entries, [Path::new("d/a")]);
    }

    #[test]
    fn close_error_overrides_listing() {
        let fake = Fake {
            entries: listing(),
            close_error: Some(ERROR_INVALID_HANDLE),
            ..Default::default()
        };
        let err = list(&fake, FileAttributes::empty(), FileAttributes::empty()).unwrap_err();
        assert_eq!(hostio_driver::error_code(&err), ERROR_INVALID_HANDLE);
    }
}
