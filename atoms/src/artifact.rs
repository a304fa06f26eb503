use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Write `dest` through a private sibling temp file that is renamed into
/// place only once `write` succeeded. The temp file is removed on failure.
pub fn write_atomically<F>(dest: &Path, write: F) -> CoreResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> CoreResult<()>,
{
    let dir = parent_dir(dest);
    fs::create_dir_all(dir)?;

    let name = dest
        .file_name()
        .ok_or_else(|| CoreError::InvalidInput(format!("no file name in {}", dest.display())))?;
    let tmp = dir.join(format!(".{}.{}.part", name.to_string_lossy(), uuid::Uuid::new_v4()));

    let result = (|| -> CoreResult<()> {
        let mut writer = BufWriter::new(open_private(&tmp)?);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        publish(&tmp, dest)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

pub fn write_bytes(dest: &Path, bytes: &[u8]) -> CoreResult<()> {
    write_atomically(dest, |w| Ok(w.write_all(bytes)?))
}

/// Duplicate `src` unchanged.
pub fn copy_file(src: &Path, dest: &Path) -> CoreResult<()> {
    let mut reader = File::open(src)?;
    write_atomically(dest, |w| {
        io::copy(&mut reader, w)?;
        Ok(())
    })
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new().write(true).create_new(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

fn publish(tmp: &Path, dest: &Path) -> CoreResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp, fs::Permissions::from_mode(0o644))?;
    }
    fs::rename(tmp, dest)?;
    Ok(())
}

/// Directory pair the handlers read originals from and write artifacts to.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Workspace {
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.upload_dir)?;
        fs::create_dir_all(&self.processed_dir)?;
        Ok(())
    }

    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.upload_dir.join(filename)
    }

    pub fn processed_path(&self, filename: &str) -> PathBuf {
        self.processed_dir.join(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("corrode-artifact-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_bytes_publishes_only_the_destination() {
        let dir = scratch_dir();
        let dest = dir.join("out.bin");

        write_bytes(&dest, b"rust").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"rust");
        assert_eq!(entries(&dir), vec!["out.bin".to_string()]);
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = scratch_dir();
        let dest = dir.join("out.bin");

        let err = write_atomically(&dest, |w| {
            w.write_all(b"partial")?;
            Err(CoreError::InvalidInput("boom".into()))
        })
        .unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(entries(&dir).is_empty());
    }

    #[test]
    fn copy_file_duplicates_contents() {
        let dir = scratch_dir();
        let src = dir.join("src.jpg");
        fs::write(&src, [1u8, 2, 3, 4]).unwrap();

        copy_file(&src, &dir.join("nested").join("copy.jpg")).unwrap();

        assert_eq!(fs::read(dir.join("nested").join("copy.jpg")).unwrap(), vec![1, 2, 3, 4]);
    }

    #[cfg(unix)]
    #[test]
    fn published_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = scratch_dir();
        let dest = dir.join("out.bin");

        write_bytes(&dest, b"x").unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
