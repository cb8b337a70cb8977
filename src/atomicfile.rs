//! Save files that are either completely written or not there at all.

use tempfile::TempDir;

use std::fs::{rename, File};
use std::io::{Error, ErrorKind, Result, Write};
use std::path::{Path, PathBuf};

/// A file that is written next to its final location and only moved
/// into place once it is complete.  This is only useful for creating
/// files, and will overwrite an existing file with the same name.
///
/// Call `commit` to find out whether the file made it.  Dropping the
/// file without committing still moves it into place, ignoring errors.
pub struct AtomicFile {
    path: PathBuf,
    dir: TempDir,
    file: File,
    committed: bool,
}

impl AtomicFile {
    /// Start writing a file that will end up at `p`.
    pub fn create<P: AsRef<Path>>(p: P) -> Result<AtomicFile> {
        let path = p.as_ref();
        if path.file_name().is_none() {
            return Err(Error::new(
                ErrorKind::Other,
                format!("Cannot create a file named {:?}", path),
            ));
        }
        let parent = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let dir = TempDir::new_in(parent)?;
        let file = File::create(dir.path().join("temp"))?;
        Ok(AtomicFile {
            path: path.to_path_buf(),
            dir,
            file,
            committed: false,
        })
    }

    /// Flush everything to disk and move the file into place.
    pub fn commit(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        self.committed = true;
        self.file.sync_data()?;
        rename(self.dir.path().join("temp"), &self.path)
    }
}

impl<'a> Write for &'a AtomicFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (&self.file).write(buf)
    }
    fn flush(&mut self) -> Result<()> {
        (&self.file).flush()
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.file.write(buf)
    }
    fn flush(&mut self) -> Result<()> {
        self.file.flush()
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if !self.committed {
            // There is no nice way to report an error from drop.
            self.finish().ok();
        }
    }
}

#[test]
fn file_appears_only_when_committed() {
    use std::io::Read;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.yaml");
    let mut f = AtomicFile::create(&path).unwrap();
    f.write_all(b"moves: 1\n").unwrap();
    assert!(!path.exists());
    f.commit().unwrap();
    let mut contents = String::new();
    File::open(&path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "moves: 1\n");
}

#[test]
fn overwrites_on_drop() {
    use std::io::Read;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    for &text in &["first", "second"] {
        let f = AtomicFile::create(&path).unwrap();
        (&f).write_all(text.as_bytes()).unwrap();
    }
    let mut contents = String::new();
    File::open(&path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "second");
}

#[test]
fn refuses_a_directory_name() {
    assert!(AtomicFile::create("/").is_err());
    assert!(AtomicFile::create("").is_err());
}
