//! Capability-scoped file helpers shared by file-backed adapters.
//!
//! Direct `std::fs` calls are avoided; every access opens the parent
//! directory through `cap_std` and works relative to it.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use uuid::Uuid;

/// Read a UTF-8 file, returning `None` when it or its directory is absent.
pub(crate) fn read_optional(path: &Path) -> io::Result<Option<String>> {
    let (parent, file_name) = parent_and_file_name(path)?;
    let directory = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(directory) => directory,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };
    match directory.read_to_string(file_name) {
        Ok(contents) => Ok(Some(contents)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

/// Write `contents` to a staging file beside `path`, then rename it over
/// `path`, creating parent directories as needed.
pub(crate) fn write_replacing(path: &Path, contents: &[u8]) -> io::Result<()> {
    let (parent, file_name) = parent_and_file_name(path)?;
    Dir::create_ambient_dir_all(parent, ambient_authority())?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;

    let staging = PathBuf::from(format!(".tmp-{}", Uuid::new_v4().simple()));
    directory.write(&staging, contents)?;
    if let Err(error) = directory.rename(&staging, &directory, file_name) {
        let _cleanup = directory.remove_file(&staging);
        return Err(error);
    }
    Ok(())
}

fn parent_and_file_name(path: &Path) -> io::Result<(&Path, &Path)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path {} has no file name", path.display()),
        )
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((parent, Path::new(file_name)))
}
