//! Downloaded package artifacts.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::requirement::PackageName;
use crate::version::Version;

/// One downloaded installable package file plus its metadata.
///
/// Owned by the fetch stage until handed to the transaction stage for
/// upload; the staging directory it came from may be gone by then, so the
/// binary payload is held in memory.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: PackageName,
    pub version: Option<Version>,
    /// Raw bytes of the package file.
    pub payload: Vec<u8>,
    /// Where the file was staged. Diagnostic only; not read after fetch.
    pub source_file: PathBuf,
}

impl Artifact {
    /// Build an artifact from a staged package file, deriving name and
    /// version from its filename.
    pub fn from_file(path: &Path) -> Result<Self> {
        let payload = std::fs::read(path)
            .with_context(|| format!("failed to read staged artifact {}", path.display()))?;
        let (name, version) = name_and_version_from_file(path);
        Ok(Artifact {
            name,
            version,
            payload,
            source_file: path.to_path_buf(),
        })
    }

    /// Wrap the package file into a single-entry zip, the container format
    /// the remote library-creation command expects.
    pub fn prezip(&self) -> Result<Vec<u8>> {
        let basename = self
            .source_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.bin", self.name.normalized()));

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer
            .start_file(&basename, options)
            .with_context(|| format!("failed to package artifact {}", self.name))?;
        writer
            .write_all(&self.payload)
            .with_context(|| format!("failed to package artifact {}", self.name))?;
        let cursor = writer
            .finish()
            .with_context(|| format!("failed to package artifact {}", self.name))?;
        Ok(cursor.into_inner())
    }

    pub fn version_text(&self) -> &str {
        self.version.as_ref().map(|v| v.as_str()).unwrap_or("")
    }
}

/// Derive a package name and version from an artifact filename.
///
/// Wheel filenames are `{name}-{version}-{python}-{abi}-{platform}.whl`;
/// source archives are `{name}-{version}.{ext}`. Falls back to treating the
/// whole stem as the name with everything from the first `-<digit>` boundary
/// as the version.
pub fn name_and_version_from_file(path: &Path) -> (PackageName, Option<Version>) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = strip_archive_extension(&file_name);

    if file_name.ends_with(".whl") {
        let mut parts = stem.split('-');
        if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
            return (PackageName::new(name), Some(Version::parse(version)));
        }
    }

    for (idx, _) in stem.match_indices('-') {
        if stem[idx + 1..].starts_with(|c: char| c.is_ascii_digit()) {
            let name = &stem[..idx];
            let version = &stem[idx + 1..];
            return (PackageName::new(name), Some(Version::parse(version)));
        }
    }

    (PackageName::new(stem), None)
}

fn strip_archive_extension(file_name: &str) -> &str {
    const EXTENSIONS: [&str; 6] = [".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".zip", ".whl"];
    for ext in EXTENSIONS {
        if let Some(stem) = file_name.strip_suffix(ext) {
            return stem;
        }
    }
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_wheel_filename() {
        let (name, version) =
            name_and_version_from_file(Path::new("astor-0.8.1-py2.py3-none-any.whl"));
        assert_eq!(name, PackageName::new("astor"));
        assert_eq!(version, Some(Version::parse("0.8.1")));
    }

    #[test]
    fn test_sdist_filename() {
        let (name, version) = name_and_version_from_file(Path::new("python-dateutil-2.8.2.tar.gz"));
        assert_eq!(name, PackageName::new("python-dateutil"));
        assert_eq!(version, Some(Version::parse("2.8.2")));
    }

    #[test]
    fn test_zip_sdist_filename() {
        let (name, version) = name_and_version_from_file(Path::new("simplejson-3.17.0.zip"));
        assert_eq!(name, PackageName::new("simplejson"));
        assert_eq!(version, Some(Version::parse("3.17.0")));
    }

    #[test]
    fn test_filename_without_version() {
        let (name, version) = name_and_version_from_file(Path::new("mypackage.tar.gz"));
        assert_eq!(name, PackageName::new("mypackage"));
        assert!(version.is_none());
    }

    #[test]
    fn test_prezip_contains_single_entry_with_basename() {
        let artifact = Artifact {
            name: PackageName::new("astor"),
            version: Some(Version::parse("0.8.1")),
            payload: b"wheel bytes".to_vec(),
            source_file: PathBuf::from("/staging/astor-0.8.1-py2.py3-none-any.whl"),
        };

        let zipped = artifact.prezip().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(zipped)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "astor-0.8.1-py2.py3-none-any.whl");
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"wheel bytes");
    }
}
