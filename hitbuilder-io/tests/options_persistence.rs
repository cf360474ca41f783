use hitbuilder_core::testing::{capture_logs, diagnostics};
use hitbuilder_core::AnalysisOptions;
use hitbuilder_io::{Container, Error, OpenMode, OptionsPersistence, Workspace};
use log::Level;
use tempfile::tempdir;

fn tuned() -> AnalysisOptions {
    let mut options = AnalysisOptions::new()
        .with_build_window(1234)
        .with_build_events_by_timestamp(true)
        .with_addback_window(77)
        .with_static_window(true)
        .with_waveform_fitting(true)
        .with_correct_cross_talk(false);
    options.set_suppression_window(0.1 + 0.2).unwrap();
    options.set_suppression_energy(1.0 / 3.0).unwrap();
    options
}

#[test]
fn test_roundtrip_is_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    let mut ws = Workspace::new();
    let handle = ws.open(&path, OpenMode::Create).unwrap();

    let written = tuned();
    written.write_to_file(&mut ws, Some(handle)).unwrap();
    ws.close(handle).unwrap();

    let mut read = AnalysisOptions::new();
    read.read_from_file(&mut ws, &path).unwrap();
    assert_eq!(read, written);
    assert_eq!(
        read.suppression_window().to_bits(),
        written.suppression_window().to_bits()
    );
    assert_eq!(
        read.suppression_energy().to_bits(),
        written.suppression_energy().to_bits()
    );
}

#[test]
fn test_second_write_overwrites() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    let mut ws = Workspace::new();
    ws.open(&path, OpenMode::Create).unwrap();

    AnalysisOptions::new().write_to_file(&mut ws, None).unwrap();
    tuned().write_to_file(&mut ws, None).unwrap();

    let container = Container::open(&path, OpenMode::Read).unwrap();
    let records: Vec<_> = container
        .entries()
        .iter()
        .filter(|e| e.key == AnalysisOptions::KEY)
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].class, AnalysisOptions::CLASS_NAME);
    assert_eq!(records[0].version, AnalysisOptions::CLASS_VERSION);
    assert_eq!(records[0].decode::<AnalysisOptions>().unwrap(), tuned());
}

#[test]
fn test_read_only_target_is_restored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    drop(Container::open(&path, OpenMode::Create).unwrap());

    let mut ws = Workspace::new();
    let handle = ws.open(&path, OpenMode::Read).unwrap();
    let (result, lines) = capture_logs(|| tuned().write_to_file(&mut ws, Some(handle)));
    result.unwrap();

    let container = ws.container(handle).unwrap();
    assert_eq!(container.mode(), OpenMode::Read);
    assert!(container.get(AnalysisOptions::KEY).is_some());
    assert!(diagnostics(&lines).is_empty());
    assert!(lines
        .iter()
        .any(|l| l.level == Level::Info && l.message.contains("READ")));
}

#[test]
fn test_writable_target_stays_writable() {
    let dir = tempdir().unwrap();
    let mut ws = Workspace::new();
    let handle = ws
        .open(dir.path().join("run.json"), OpenMode::Update)
        .unwrap();
    tuned().write_to_file(&mut ws, Some(handle)).unwrap();
    assert_eq!(ws.container(handle).unwrap().mode(), OpenMode::Update);
}

#[test]
fn test_active_container_restored() {
    let dir = tempdir().unwrap();
    let mut ws = Workspace::new();
    let target = ws
        .open(dir.path().join("target.json"), OpenMode::Create)
        .unwrap();
    let current = ws
        .open(dir.path().join("current.json"), OpenMode::Create)
        .unwrap();
    assert_eq!(ws.active(), Some(current));

    tuned().write_to_file(&mut ws, Some(target)).unwrap();
    assert_eq!(ws.active(), Some(current));
    assert!(ws.container(current).unwrap().entries().is_empty());

    let mut options = AnalysisOptions::new();
    options
        .read_from_file(&mut ws, &dir.path().join("target.json"))
        .unwrap();
    assert_eq!(options, tuned());
    assert_eq!(ws.active(), Some(current));
}

#[test]
fn test_write_without_container() {
    let mut ws = Workspace::new();
    let (result, lines) = capture_logs(|| tuned().write_to_file(&mut ws, None));
    assert!(matches!(result, Err(Error::NoContainer)));
    assert_eq!(diagnostics(&lines).len(), 1);
}

#[test]
fn test_write_to_closed_container() {
    let dir = tempdir().unwrap();
    let mut ws = Workspace::new();
    let handle = ws
        .open(dir.path().join("run.json"), OpenMode::Create)
        .unwrap();
    ws.close(handle).unwrap();

    let (result, lines) = capture_logs(|| tuned().write_to_file(&mut ws, Some(handle)));
    assert!(matches!(result, Err(Error::UnknownHandle(_))));
    let errors = diagnostics(&lines);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, Level::Error);
}

#[test]
fn test_write_io_failure_single_diagnostic() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("runs");
    std::fs::create_dir(&nested).unwrap();
    let mut ws = Workspace::new();
    let writable = ws.open(nested.join("a.json"), OpenMode::Update).unwrap();
    let read_only = ws.open(nested.join("a.json"), OpenMode::Read).unwrap();
    std::fs::remove_dir_all(&nested).unwrap();

    let (result, lines) = capture_logs(|| tuned().write_to_file(&mut ws, Some(writable)));
    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(diagnostics(&lines).len(), 1);

    let (result, lines) = capture_logs(|| tuned().write_to_file(&mut ws, Some(read_only)));
    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(diagnostics(&lines).len(), 1);
    assert_eq!(ws.container(read_only).unwrap().mode(), OpenMode::Read);
    assert_eq!(ws.active(), Some(read_only));
}

#[test]
fn test_missing_record_leaves_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.json");
    let mut other = Container::open(&path, OpenMode::Create).unwrap();
    other
        .write_object("Calibration", "ChannelMap", 1, &vec![1, 2, 3], false)
        .unwrap();
    drop(other);

    let mut ws = Workspace::new();
    let mut options = tuned();
    let (result, lines) = capture_logs(|| options.read_from_file(&mut ws, &path));

    assert!(matches!(result, Err(Error::EntryNotFound { .. })));
    assert_eq!(diagnostics(&lines).len(), 1);
    assert_eq!(options, tuned());
    assert!(ws.active().is_none());
    assert_eq!(ws.open_containers().count(), 0);
}

#[test]
fn test_unreadable_container_single_diagnostic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "not a container").unwrap();

    let mut ws = Workspace::new();
    let mut options = tuned();
    let (result, lines) = capture_logs(|| options.read_from_file(&mut ws, &path));
    assert!(result.is_err());
    assert_eq!(diagnostics(&lines).len(), 1);
    assert_eq!(options, tuned());

    let (result, lines) =
        capture_logs(|| options.read_from_file(&mut ws, &dir.path().join("absent.json")));
    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(diagnostics(&lines).len(), 1);
}

#[test]
fn test_record_found_by_class() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    let mut container = Container::open(&path, OpenMode::Create).unwrap();
    container
        .write_object(
            "options_v2",
            AnalysisOptions::CLASS_NAME,
            AnalysisOptions::CLASS_VERSION,
            &tuned(),
            false,
        )
        .unwrap();
    drop(container);

    let mut options = AnalysisOptions::new();
    options.read_from_file(&mut Workspace::new(), &path).unwrap();
    assert_eq!(options, tuned());
}

#[test]
fn test_newer_record_version_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    let mut container = Container::open(&path, OpenMode::Create).unwrap();
    container
        .write_object(
            AnalysisOptions::KEY,
            AnalysisOptions::CLASS_NAME,
            AnalysisOptions::CLASS_VERSION + 1,
            &tuned(),
            false,
        )
        .unwrap();
    drop(container);

    let mut options = AnalysisOptions::new();
    let (result, lines) =
        capture_logs(|| options.read_from_file(&mut Workspace::new(), &path));
    assert!(matches!(result, Err(Error::InvalidFormat(_))));
    assert_eq!(diagnostics(&lines).len(), 1);
    assert_eq!(options, AnalysisOptions::new());
}

#[cfg(feature = "hdf5")]
#[test]
fn test_roundtrip_through_hdf5() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.nxs");
    let mut ws = Workspace::new();
    let handle = ws.open(&path, OpenMode::Create).unwrap();
    assert_eq!(
        ws.container(handle).unwrap().backend(),
        hitbuilder_io::Backend::Hdf5
    );
    tuned().write_to_file(&mut ws, None).unwrap();
    tuned().write_to_file(&mut ws, None).unwrap();
    ws.close(handle).unwrap();

    let reopened = Container::open(&path, OpenMode::Read).unwrap();
    assert_eq!(reopened.entries().len(), 1);

    let mut options = AnalysisOptions::new();
    options.read_from_file(&mut ws, &path).unwrap();
    assert_eq!(options, tuned());
}
