use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Writes `bytes` to `path` through a temporary file in the same directory.
///
/// The existing file is only replaced once the new contents are fully written
/// and synced. The temporary file is removed on every failure path.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|error| error.error)?;
    Ok(())
}

pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    write_bytes_atomic(path, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_behind() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("saves").join("game.tqsave");
        write_text_atomic(&path, "first").expect("first write");
        write_text_atomic(&path, "second").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        let entries = fs::read_dir(path.parent().expect("parent"))
            .expect("list")
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn failed_persist_keeps_original_and_cleans_up() {
        let temp = TempDir::new().expect("temp");
        let target = temp.path().join("occupied");
        fs::create_dir_all(target.join("inner")).expect("dir");

        assert!(write_text_atomic(&target, "data").is_err());
        assert!(target.is_dir());
        let entries = fs::read_dir(temp.path()).expect("list").count();
        assert_eq!(entries, 1);
    }
}
