use crate::core_sandbox::SandboxError;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A path as the client sees it: absolute, `/`-separated, with no `.` or
/// `..` segments and no trailing slash (except the root itself).
///
/// Only [`PathSandbox`] hands these out, so holding one means the path was
/// already checked against the served root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPath(String);

impl VirtualPath {
    pub fn root() -> Self {
        VirtualPath(String::from("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps client paths onto the served root directory.
///
/// The root is canonicalized once at construction. Every path returned by
/// [`PathSandbox::resolve`] is the root itself or nested under it.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|source| SandboxError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(SandboxError::InvalidRoot(format!(
                "{:?} is not a directory",
                canonical
            )));
        }

        info!("Serving root directory: {:?}", canonical);
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Real directory backing a virtual working directory.
    fn base_for(&self, cwd: &VirtualPath) -> PathBuf {
        if cwd.is_root() {
            self.root.clone()
        } else {
            self.root.join(cwd.as_str().trim_start_matches('/'))
        }
    }

    /// Resolves `input` (absolute or relative to `cwd`) to a real path under
    /// the root.
    ///
    /// Normalization is purely lexical. The containment check runs on the
    /// normalized result, then once more on the canonical form when the
    /// target exists so a symlink cannot point outside the root.
    pub fn resolve(&self, cwd: &VirtualPath, input: &str) -> Result<PathBuf, SandboxError> {
        let input = input.trim();

        let (base, relative) = if input.starts_with('/') {
            (self.root.clone(), input.trim_start_matches('/'))
        } else {
            (self.base_for(cwd), input)
        };

        let joined = if relative.is_empty() || relative == "." {
            base
        } else {
            base.join(relative)
        };

        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.root) {
            warn!(
                "Rejected path outside root: cwd={} input={:?} -> {:?}",
                cwd, input, normalized
            );
            return Err(SandboxError::Escape(normalized));
        }

        self.check_links(&normalized)?;
        debug!("Resolved {:?} in {} to {:?}", input, cwd, normalized);
        Ok(normalized)
    }

    fn check_links(&self, path: &Path) -> Result<(), SandboxError> {
        // A missing target is probed through its parent, so a file about to
        // be created cannot land behind a linked directory either.
        let probe = if fs::symlink_metadata(path).is_ok() {
            path
        } else {
            match path.parent() {
                Some(parent) if fs::symlink_metadata(parent).is_ok() => parent,
                _ => return Ok(()),
            }
        };

        let real = probe.canonicalize().map_err(|source| SandboxError::Io {
            path: probe.to_path_buf(),
            source,
        })?;

        if real.starts_with(&self.root) {
            Ok(())
        } else {
            warn!("Rejected link {:?} resolving to {:?}", probe, real);
            Err(SandboxError::Escape(real))
        }
    }

    /// Converts a real path under the root back to its virtual form.
    pub fn to_virtual(&self, real: &Path) -> Result<VirtualPath, SandboxError> {
        let normalized = normalize(real);
        let relative = normalized
            .strip_prefix(&self.root)
            .map_err(|_| SandboxError::Escape(normalized.clone()))?;

        let segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Ok(VirtualPath(format!("/{}", segments.join("/"))))
    }
}

/// Collapses `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub async fn is_directory(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

pub async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
