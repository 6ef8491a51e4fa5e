//! Tarball manifest and gzipped tar bundling
//!
//! Archive members are always the basenames of their source paths, so the
//! directory layout of the run never leaks into the bundle.

use crate::error::{Result, WrapperError};
use crate::file_name;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "tar_content.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    One(String),
    Many(Vec<String>),
}

/// Logical name to bundled file name(s), kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TarManifest {
    entries: Vec<(String, ManifestEntry)>,
}

impl TarManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, path: &Path) -> Self {
        self.entries
            .push((name.to_string(), ManifestEntry::One(file_name(path))));
        self
    }

    pub fn files(mut self, name: &str, paths: &[PathBuf]) -> Self {
        let names = paths.iter().map(|p| file_name(p)).collect();
        self.entries
            .push((name.to_string(), ManifestEntry::Many(names)));
        self
    }

    pub fn entries(&self) -> &[(String, ManifestEntry)] {
        &self.entries
    }
}

impl Serialize for TarManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            match entry {
                ManifestEntry::One(file) => map.serialize_entry(name, file)?,
                ManifestEntry::Many(files) => map.serialize_entry(name, files)?,
            }
        }
        map.end()
    }
}

/// Write `tar_content.json` into `out_dir`
pub fn write_manifest(out_dir: &Path, manifest: &TarManifest) -> Result<PathBuf> {
    let path = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&path, json).map_err(|e| WrapperError::io(&path, e))?;
    Ok(path)
}

/// Bundle `files` into a gzipped tar at `tarball`
///
/// Every source must exist and basenames must be unique; both are checked
/// before the archive file is created. Directories are added recursively
/// under their basename.
pub fn bundle(tarball: &Path, files: &[PathBuf]) -> Result<PathBuf> {
    let mut seen = HashSet::new();
    for path in files {
        if !path.exists() {
            return Err(WrapperError::MissingInput {
                label: "file to archive",
                path: path.clone(),
            });
        }
        let name = file_name(path);
        if !seen.insert(name.clone()) {
            return Err(WrapperError::DuplicateMember(name));
        }
    }

    let file = File::create(tarball).map_err(|e| WrapperError::io(tarball, e))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for path in files {
        let name = file_name(path);
        let appended = if path.is_dir() {
            builder.append_dir_all(&name, path)
        } else {
            builder.append_path_with_name(path, &name)
        };
        appended.map_err(|e| WrapperError::io(path, e))?;
    }

    let encoder = builder.into_inner().map_err(|e| WrapperError::io(tarball, e))?;
    encoder.finish().map_err(|e| WrapperError::io(tarball, e))?;

    info!("Bundled {} file(s) into {}", files.len(), tarball.display());
    Ok(tarball.to_path_buf())
}

#[cfg(test)]
pub(crate) fn archive_members(tarball: &Path) -> Vec<String> {
    let file = File::open(tarball).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            path.trim_end_matches('/').to_string()
        })
        .collect()
}
