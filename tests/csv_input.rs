// tests/csv_input.rs
//! Reading input files from disk.

use article2notion::error::AppError;
use article2notion::input::read_rows;
use article2notion::ContentType;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn rows_are_read_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "Title,URLs,Categories\n\
         Spring,https://www.example.org/voice/2023/index.php?id=42,\"interview, spring\"\n\
         ,,\n\
         Autumn,https://www.example.org/voice/2023/autumn,\n"
    )
    .unwrap();

    let rows = read_rows(file.path(), ContentType::Voice).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].source_url.as_str(),
        "https://www.example.org/voice/2023/index.php?id=42"
    );
    assert_eq!(rows[0].categories, vec!["interview", "spring"]);
    assert!(rows.iter().all(|r| r.content_type == ContentType::Voice));
}

#[test]
fn missing_files_are_input_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");

    match read_rows(&path, ContentType::News) {
        Err(AppError::Input { path: reported, .. }) => {
            assert_eq!(reported, path.display().to_string())
        }
        other => panic!("expected an input error, got {:?}", other.map(|rows| rows.len())),
    }
}

#[test]
fn files_without_a_url_column_are_input_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Link,Categories\nhttps://www.example.org/news/a/b,").unwrap();

    let err = read_rows(file.path(), ContentType::News).unwrap_err();
    assert!(err.to_string().contains("URLs"), "{}", err);
}
