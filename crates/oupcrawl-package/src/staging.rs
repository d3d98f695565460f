//! Files are written next to their destination under a `.part` name and
//! renamed once complete. A destination that exists is always whole, which the
//! new-file check and the unpack skip both depend on.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub fn partial_path(dest: &Path) -> PathBuf {
    let mut partial = dest.as_os_str().to_os_string();
    partial.push(".part");
    PathBuf::from(partial)
}

/// Stream `reader` into `dest`. On failure the partial file is removed and
/// `dest` is left untouched.
pub fn write_staged(reader: &mut dyn Read, dest: &Path) -> io::Result<u64> {
    let partial = partial_path(dest);
    let written = copy_into(reader, &partial);
    match written {
        Ok(bytes) => {
            std::fs::rename(&partial, dest)?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn copy_into(reader: &mut dyn Read, path: &Path) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let bytes = io::copy(reader, &mut out)?;
    out.flush()?;
    Ok(bytes)
}
