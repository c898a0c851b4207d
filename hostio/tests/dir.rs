use hostio::*;

fn ok() -> ErrorCode {
    ErrorCode::SUCCESS
}

#[test]
fn entries_of_new_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("d");
    let mut error = ok();

    assert!(create_directory(&dir, &mut error));
    let entries = get_file_system_entries(
        &dir,
        dir.join("*"),
        FileAttributes::empty(),
        FileAttributes::empty(),
        &mut error,
    )
    .unwrap();
    assert!(entries.is_empty());
    assert!(error.is_success());

    std::fs::write(dir.join("a.txt"), b"a").unwrap();
    let entries = get_file_system_entries(
        &dir,
        dir.join("*"),
        FileAttributes::empty(),
        FileAttributes::empty(),
        &mut error,
    )
    .unwrap();
    assert_eq!(entries, [dir.join("a.txt")]);
}

#[test]
fn filter_directories() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    let mut error = ok();
    assert!(create_directory(dir.join("sub"), &mut error));
    std::fs::write(dir.join("file"), b"f").unwrap();

    let dirs = get_file_system_entries(
        dir,
        dir.join("*"),
        FileAttributes::DIRECTORY,
        FileAttributes::DIRECTORY,
        &mut error,
    )
    .unwrap();
    assert_eq!(dirs, [dir.join("sub")]);

    let files = get_file_system_entries(
        dir,
        dir.join("*"),
        FileAttributes::empty(),
        FileAttributes::DIRECTORY,
        &mut error,
    )
    .unwrap();
    assert_eq!(files, [dir.join("file")]);
}

#[test]
fn missing_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("missing");
    let mut error = ok();
    let entries = get_file_system_entries(
        &dir,
        dir.join("*"),
        FileAttributes::empty(),
        FileAttributes::empty(),
        &mut error,
    );
    assert!(entries.is_none());
    assert_eq!(error, ErrorCode::PATH_NOT_FOUND);
}

#[test]
fn directory_lifecycle() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("d");
    let mut error = ok();

    assert!(create_directory(&dir, &mut error));
    assert!(!create_directory(&dir, &mut error));
    assert_eq!(error, ErrorCode::ALREADY_EXISTS);

    let attrs = get_file_attributes(&dir, &mut error);
    assert!(error.is_success());
    assert!(FileAttributes::from_bits_retain(attrs).contains(FileAttributes::DIRECTORY));

    std::fs::write(dir.join("f"), b"f").unwrap();
    assert!(!remove_directory(&dir, &mut error));
    assert_eq!(error, ErrorCode::DIR_NOT_EMPTY);

    assert!(delete_file(dir.join("f"), &mut error));
    assert!(remove_directory(&dir, &mut error));
    assert!(!dir.exists());
}

#[test]
fn move_copy_delete() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    let (a, b, c) = (dir.join("a"), dir.join("b"), dir.join("c"));
    let mut error = ok();
    std::fs::write(&a, b"first").unwrap();

    assert!(copy_file(&a, &b, false, &mut error));
    assert!(!copy_file(&a, &b, false, &mut error));
    assert_eq!(error, ErrorCode::FILE_EXISTS);
    std::fs::write(&a, b"second").unwrap();
    assert!(copy_file(&a, &b, true, &mut error));
    assert_eq!(std::fs::read(&b).unwrap(), b"second");

    assert!(move_file(&a, &c, &mut error));
    assert!(!a.exists());
    assert!(!move_file(&c, &b, &mut error));
    assert_eq!(error, ErrorCode::ALREADY_EXISTS);

    assert!(delete_file(&c, &mut error));
    assert!(!delete_file(&c, &mut error));
    assert_eq!(error, ErrorCode::FILE_NOT_FOUND);
}

#[test]
fn replace_with_backup() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    let (src, dst, backup) = (dir.join("src"), dir.join("dst"), dir.join("backup"));
    std::fs::write(&src, b"new").unwrap();
    std::fs::write(&dst, b"old").unwrap();
    let mut error = ok();

    assert!(replace_file(&src, &dst, Some(&backup), false, &mut error));
    assert_eq!(std::fs::read(&dst).unwrap(), b"new");
    assert_eq!(std::fs::read(&backup).unwrap(), b"old");
    assert!(!src.exists());
}

#[test]
fn read_only_attribute() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("f");
    std::fs::write(&path, b"f").unwrap();
    let mut error = ok();

    assert!(set_file_attributes(&path, FileAttributes::READ_ONLY, &mut error));
    let attrs = FileAttributes::from_bits_retain(get_file_attributes(&path, &mut error));
    assert!(attrs.contains(FileAttributes::READ_ONLY));

    assert!(set_file_attributes(&path, FileAttributes::NORMAL, &mut error));
    let attrs = FileAttributes::from_bits_retain(get_file_attributes(&path, &mut error));
    assert!(!attrs.contains(FileAttributes::READ_ONLY));
}

#[test]
fn current_directory() {
    let mut error = ok();
    let cwd = get_current_directory(&mut error).unwrap();
    assert!(error.is_success());
    assert!(cwd.is_absolute());

    let missing = cwd.join("surely-missing-directory");
    assert!(!set_current_directory(&missing, &mut error));
    assert_eq!(error, ErrorCode::FILE_NOT_FOUND);
}

#[test]
fn separators() {
    assert_eq!(
        DIRECTORY_SEPARATOR_CHAR,
        std::path::MAIN_SEPARATOR,
    );
    assert_ne!(PATH_SEPARATOR, DIRECTORY_SEPARATOR_CHAR);
}
