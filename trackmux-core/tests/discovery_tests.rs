// trackmux-core/tests/discovery_tests.rs

use trackmux_core::discovery::find_processable_files;
use trackmux_core::error::CoreError;
use std::fs::{self, File};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_find_processable_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input_dir = dir.path();

    File::create(input_dir.join("b_movie.mkv"))?;
    File::create(input_dir.join("a_movie.MKV"))?;
    File::create(input_dir.join("old_show.avi"))?;
    File::create(input_dir.join("already.mp4"))?;
    File::create(input_dir.join("notes.txt"))?;
    fs::create_dir(input_dir.join("subdir"))?;
    File::create(input_dir.join("subdir").join("nested.mkv"))?; // not descended into

    let files = find_processable_files(input_dir)?;
    let names: Vec<String> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["a_movie.MKV", "b_movie.mkv", "old_show.avi"]);

    dir.close()?;
    Ok(())
}

#[test]
fn test_find_processable_files_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    File::create(dir.path().join("document.txt"))?;
    fs::create_dir(dir.path().join("folder.mkv"))?; // a directory, not a file

    match find_processable_files(dir.path()) {
        Err(CoreError::NoFilesFound) => {}
        other => panic!("Unexpected result: {:?}", other),
    }

    dir.close()?;
    Ok(())
}

#[test]
fn test_find_processable_files_nonexistent_dir() {
    let missing = PathBuf::from("surely_this_does_not_exist_42_integration");
    match find_processable_files(&missing) {
        Err(CoreError::Io(_)) => {}
        other => panic!("Unexpected result: {:?}", other),
    }
}
