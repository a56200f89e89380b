use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::defaults::DefaultAttributes;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsCheck {
    pub root: PathBuf,
    pub files: Vec<FileCheck>,
}

impl DefaultsCheck {
    pub fn failures(&self) -> impl Iterator<Item = &FileCheck> {
        self.files.iter().filter(|f| f.error.is_some())
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCheck {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Validates every `*.toml` defaults file below `root`.
pub fn check_defaults_dir(root: &Path) -> Result<DefaultsCheck> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e.file_name()))
    {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "toml") {
            continue;
        }
        let error = DefaultAttributes::from_path(path)
            .err()
            .map(|err| format!("{err:#}"));
        debug!(target: "attribute_core.check", path = %path.display(), ok = error.is_none(), "checked defaults");
        files.push(FileCheck {
            path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
            error,
        });
    }
    Ok(DefaultsCheck {
        root: root.to_path_buf(),
        files,
    })
}

fn is_ignored(name: &OsStr) -> bool {
    let ignored = ["target", ".git"];
    name.to_str().is_some_and(|name| ignored.contains(&name))
}
