//! Builds the zip bundle that seeds the pipeline's S3 source action.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ProvisionError, Result};

/// Zips the contents of `source_dir` (paths relative to it) into `dest`.
pub fn write_bundle(source_dir: &Path, dest: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        return Err(ProvisionError::MissingAsset(source_dir.to_path_buf()));
    }

    let file = File::create(dest)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    add_directory(&mut zip, source_dir, source_dir, options)?;
    zip.finish()?;
    tracing::debug!(source = %source_dir.display(), dest = %dest.display(), "wrote source bundle");
    Ok(())
}

fn add_directory(
    zip: &mut ZipWriter<File>,
    base: &Path,
    dir: &Path,
    options: SimpleFileOptions,
) -> Result<()> {
    // Sorted walk so the bundle layout is stable between runs.
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let relative = path
            .strip_prefix(base)
            .map_err(|_| ProvisionError::MissingAsset(path.clone()))?;
        let name = relative.to_string_lossy().replace('\\', "/");

        if path.is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
            add_directory(zip, base, &path, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut reader = File::open(&path)?;
            io::copy(&mut reader, zip)?;
        }
    }
    Ok(())
}
