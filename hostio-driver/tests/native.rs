use std::path::PathBuf;

use hostio_driver::{consts::*, *};
use tempfile::TempDir;

const HELLO: &[u8] = b"hello world...";

fn tempfile() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file");
    std::fs::write(&path, b"").unwrap();
    (dir, path)
}

fn code<T: std::fmt::Debug>(res: std::io::Result<T>) -> u32 {
    error_code(&res.unwrap_err())
}

#[test]
fn create_write_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.bin");
    let handle = create_file(
        &path,
        GENERIC_READ | GENERIC_WRITE,
        0,
        CREATE_NEW,
        FILE_ATTRIBUTE_NORMAL,
    )
    .unwrap();
    assert_eq!(write_file(&handle, HELLO).unwrap(), HELLO.len() as u32);

    let mut high = 0;
    assert_eq!(set_file_pointer(&handle, 0, &mut high, FILE_BEGIN).unwrap(), 0);
    let mut buf = [0; 64];
    let n = read_file(&handle, &mut buf).unwrap();
    assert_eq!(&buf[..n as usize], HELLO);
    assert_eq!(get_file_size(&handle).unwrap(), (HELLO.len() as u32, 0));
    close_handle(handle).unwrap();

    assert_eq!(
        code(create_file(&path, GENERIC_READ, 0, CREATE_NEW, 0)),
        ERROR_FILE_EXISTS
    );
}

#[test]
fn open_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        code(create_file(
            &dir.path().join("nope"),
            GENERIC_READ,
            0,
            OPEN_EXISTING,
            0
        )),
        ERROR_FILE_NOT_FOUND
    );
    assert_eq!(
        code(create_file(
            &dir.path().join("nope").join("nope"),
            GENERIC_READ,
            0,
            OPEN_EXISTING,
            0
        )),
        ERROR_PATH_NOT_FOUND
    );
}

#[test]
fn truncate_at_pointer() {
    let (_dir, path) = tempfile();
    std::fs::write(&path, HELLO).unwrap();
    let handle = create_file(
        &path,
        GENERIC_READ | GENERIC_WRITE,
        FILE_SHARE_READ | FILE_SHARE_WRITE,
        OPEN_EXISTING,
        0,
    )
    .unwrap();
    let mut high = 0;
    set_file_pointer(&handle, 5, &mut high, FILE_BEGIN).unwrap();
    set_end_of_file(&handle).unwrap();
    assert_eq!(get_file_size(&handle).unwrap(), (5, 0));
    flush_file_buffers(&handle).unwrap();
}

#[test]
fn share_violation() {
    let (_dir, path) = tempfile();
    let first = create_file(&path, GENERIC_READ, 0, OPEN_EXISTING, 0).unwrap();
    assert_eq!(
        code(create_file(
            &path,
            GENERIC_READ,
            FILE_SHARE_READ,
            OPEN_EXISTING,
            0
        )),
        ERROR_SHARING_VIOLATION
    );
    close_handle(first).unwrap();
    let second = create_file(&path, GENERIC_READ, FILE_SHARE_READ, OPEN_EXISTING, 0);
    assert!(second.is_ok());
}

#[test]
fn attributes() {
    let dir = tempfile::tempdir().unwrap();
    let attrs = get_file_attributes(dir.path()).unwrap();
    assert_ne!(attrs & FILE_ATTRIBUTE_DIRECTORY, 0);

    let path = dir.path().join("f");
    std::fs::write(&path, HELLO).unwrap();
    let data = get_file_attributes_ex(&path).unwrap();
    assert_eq!(data.attributes & FILE_ATTRIBUTE_DIRECTORY, 0);
    assert_eq!((data.size_high, data.size_low), (0, HELLO.len() as u32));

    assert_eq!(
        code(get_file_attributes(&dir.path().join("missing"))),
        ERROR_FILE_NOT_FOUND
    );
}

#[test]
fn find_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), HELLO).unwrap();
    std::fs::write(dir.path().join("b.txt"), HELLO).unwrap();
    std::fs::write(dir.path().join("c.bin"), HELLO).unwrap();

    let (mut find, first) = find_first_file(&dir.path().join("*.txt")).unwrap();
    let mut names = vec![first.name];
    while let Some(data) = find_next_file(&mut find).unwrap() {
        assert_eq!((data.size_high, data.size_low), (0, HELLO.len() as u32));
        names.push(data.name);
    }
    find_close(find).unwrap();
    names.sort();
    assert_eq!(names, ["a.txt", "b.txt"]);

    assert_eq!(
        code(find_first_file(&dir.path().join("*.none"))),
        ERROR_FILE_NOT_FOUND
    );
    assert_eq!(
        code(find_first_file(&dir.path().join("missing").join("*"))),
        ERROR_PATH_NOT_FOUND
    );
}

#[test]
fn directories() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    create_directory(&sub).unwrap();
    assert_eq!(code(create_directory(&sub)), ERROR_ALREADY_EXISTS);
    std::fs::write(sub.join("f"), HELLO).unwrap();
    assert_eq!(code(remove_directory(&sub)), ERROR_DIR_NOT_EMPTY);
    delete_file(&sub.join("f")).unwrap();
    remove_directory(&sub).unwrap();
    assert!(!sub.exists());
}

#[test]
fn move_copy_replace() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let c = dir.path().join("c");
    std::fs::write(&a, b"first").unwrap();

    copy_file(&a, &b, true).unwrap();
    assert_eq!(std::fs::read(&b).unwrap(), b"first");
    assert_eq!(code(copy_file(&a, &b, true)), ERROR_FILE_EXISTS);

    std::fs::write(&a, b"second").unwrap();
    move_file(&a, &c).unwrap();
    assert!(!a.exists());
    assert_eq!(code(move_file(&c, &b)), ERROR_ALREADY_EXISTS);

    let backup = dir.path().join("backup");
    replace_file(&b, &c, Some(&backup), REPLACEFILE_WRITE_THROUGH).unwrap();
    assert_eq!(std::fs::read(&b).unwrap(), b"second");
    assert_eq!(std::fs::read(&backup).unwrap(), b"first");
    assert!(!c.exists());
}

#[test]
fn delete_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone");
    let handle = create_file(
        &path,
        GENERIC_WRITE,
        FILE_SHARE_DELETE,
        CREATE_ALWAYS,
        FILE_FLAG_DELETE_ON_CLOSE,
    )
    .unwrap();
    assert!(path.exists());
    close_handle(handle).unwrap();
    assert!(!path.exists());
}

#[test]
fn pipe() {
    let (read, write) = create_pipe().unwrap();
    assert_eq!(get_file_type(&read).unwrap(), FILE_TYPE_PIPE);
    assert_eq!(write_file(&write, HELLO).unwrap(), HELLO.len() as u32);
    close_handle(write).unwrap();
    let mut buf = [0; 64];
    let n = read_file(&read, &mut buf).unwrap();
    assert_eq!(&buf[..n as usize], HELLO);
}

#[cfg(unix)]
mod unix {
    use super::*;

    #[test]
    fn directory_needs_backup_semantics() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            code(create_file(dir.path(), GENERIC_READ, 0, OPEN_EXISTING, 0)),
            ERROR_ACCESS_DENIED
        );
        let handle = create_file(
            dir.path(),
            GENERIC_READ,
            0,
            OPEN_EXISTING,
            FILE_FLAG_BACKUP_SEMANTICS,
        )
        .unwrap();
        assert_eq!(get_file_type(&handle).unwrap(), FILE_TYPE_DISK);
    }

    #[test]
    fn delete_respects_share() {
        let (_dir, path) = tempfile();
        let handle = create_file(&path, GENERIC_READ, FILE_SHARE_READ, OPEN_EXISTING, 0)
            .unwrap();
        assert_eq!(code(delete_file(&path)), ERROR_SHARING_VIOLATION);
        drop(handle);
        delete_file(&path).unwrap();
    }

    #[test]
    fn hidden_and_readonly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dot");
        std::fs::write(&path, HELLO).unwrap();
        set_file_attributes(&path, FILE_ATTRIBUTE_READONLY).unwrap();
        let attrs = get_file_attributes(&path).unwrap();
        assert_ne!(attrs & FILE_ATTRIBUTE_HIDDEN, 0);
        assert_ne!(attrs & FILE_ATTRIBUTE_READONLY, 0);
        set_file_attributes(&path, FILE_ATTRIBUTE_NORMAL).unwrap();
        assert_eq!(get_file_attributes(&path).unwrap() & FILE_ATTRIBUTE_READONLY, 0);
    }

    #[test]
    fn zero_length_lock() {
        let (_dir, path) = tempfile();
        let handle = create_file(
            &path,
            GENERIC_READ | GENERIC_WRITE,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            OPEN_EXISTING,
            0,
        )
        .unwrap();
        lock_file(&handle, 0, 0, 0, 0).unwrap();
        unlock_file(&handle, 0, 0, 0, 0).unwrap();
    }
}

#[cfg(target_os = "linux")]
#[test]
fn lock_conflict() {
    let (_dir, path) = tempfile();
    let open = || {
        create_file(
            &path,
            GENERIC_READ | GENERIC_WRITE,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            OPEN_EXISTING,
            0,
        )
        .unwrap()
    };
    let (a, b) = (open(), open());
    lock_file(&a, 0, 0, 10, 0).unwrap();
    assert_eq!(code(lock_file(&b, 5, 0, 10, 0)), ERROR_LOCK_VIOLATION);
    lock_file(&b, 10, 0, 10, 0).unwrap();
    unlock_file(&a, 0, 0, 10, 0).unwrap();
    lock_file(&b, 0, 0, 10, 0).unwrap();
}
