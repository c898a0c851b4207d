use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use hostio::*;

// Every test swaps the process-wide remapper.
static LOCK: Mutex<()> = Mutex::new(());

fn redirect(from: PathBuf, to: PathBuf) -> Arc<dyn PathRemapper> {
    Arc::new(move |path: &Path| path.strip_prefix(&from).ok().map(|rest| to.join(rest)))
}

#[test]
fn operations_see_remapped_paths() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    let temp = tempfile::tempdir().unwrap();
    let real = temp.path().join("real");
    let virt = temp.path().join("virtual");
    std::fs::create_dir(&real).unwrap();
    register_path_remapper(Some(redirect(virt.clone(), real.clone())));

    let mut error = ErrorCode::SUCCESS;
    let file = open(
        virt.join("f"),
        FileMode::CREATE_NEW,
        FileAccess::WRITE,
        FileShare::empty(),
        FileOptions::empty(),
        &mut error,
    )
    .unwrap();
    assert_eq!(write(&file, b"data", 0, 4, &mut error), 4);
    assert!(close(file, &mut error));
    assert_eq!(std::fs::read(real.join("f")).unwrap(), b"data");

    let mut stat = NeutralStat::default();
    assert!(get_file_stat(virt.join("f"), &mut stat, &mut error));
    assert_eq!(stat.length, 4);
    assert_eq!(stat.name, real.join("f"));

    let entries = get_file_system_entries(
        &virt,
        virt.join("*"),
        FileAttributes::empty(),
        FileAttributes::empty(),
        &mut error,
    )
    .unwrap();
    assert_eq!(entries, [real.join("f")]);

    assert_eq!(remap_path(virt.join("x")), Some(real.join("x")));
    assert_eq!(remap_path(temp.path()), None);
    let mut path = virt.join("y");
    assert!(remap_path_in_place(&mut path));
    assert_eq!(path, real.join("y"));

    register_path_remapper(None);
    assert_eq!(remap_path(virt.join("x")), None);
    assert!(!delete_file(virt.join("f"), &mut error));
    assert!(delete_file(real.join("f"), &mut error));
}

#[test]
fn last_registration_wins() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    register_path_remapper(Some(redirect("/a".into(), "/b".into())));
    register_path_remapper(Some(redirect("/a".into(), "/c".into())));
    assert_eq!(remap_path("/a/x"), Some(PathBuf::from("/c/x")));
    register_path_remapper(None);
}
