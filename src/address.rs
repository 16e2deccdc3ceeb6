//! Canonical addressing of catalog items.
//!
//! An address is `base ⊕ kind segment ⊕ item path`. The address built when an
//! item is listed is the exact string a client sends back to read it, and the
//! backend resolves that string with the inverse of the same scheme.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};

use crate::catalog::ItemKind;
use crate::config::GithubConfig;
use crate::error::{Error, Result};

/// Name of the manifest file at the catalog root.
pub const MANIFEST_FILE: &str = "index.json";

/// Characters escaped in address paths. `/` is kept as the separator.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

/// Lexically normalise a path: drop `.`, fold `..`, keep case, never touch
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Normalise an item path relative to its kind directory, folding `.` and
/// `..`. Fails when the result would leave that directory or names nothing.
fn item_path(path: &str) -> Result<String> {
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(Error::InvalidParams(format!(
            "item path '{}' must be relative",
            path
        )));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::InvalidParams(format!(
                        "item path '{}' escapes its directory",
                        path
                    )));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(Error::InvalidParams(format!(
            "item path '{}' names no file",
            path
        )));
    }
    Ok(segments.join("/"))
}

/// Addresses for a catalog rooted in a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAddresses {
    root: PathBuf,
}

impl LocalAddresses {
    /// Anchor addresses at `root`, made absolute against the working directory.
    pub fn new(root: &Path) -> Result<Self> {
        let absolute = std::path::absolute(root)?;
        Ok(Self {
            root: normalize(&absolute),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// `file://` address of an item.
    pub fn address(&self, kind: ItemKind, path: &str) -> Result<String> {
        let location = self.root.join(kind.segment()).join(item_path(path)?);
        Ok(format!("file://{}", encode_path(&location.to_string_lossy())))
    }

    /// Filesystem path named by an address produced by [`Self::address`].
    pub fn resolve(&self, address: &str) -> Option<PathBuf> {
        address.strip_prefix("file://").map(|encoded| {
            let decoded = percent_decode_str(encoded).decode_utf8_lossy();
            PathBuf::from(decoded.as_ref())
        })
    }
}

/// Addresses for a catalog held in a remote versioned tree:
/// `<host>/<owner>/<repository>/refs/<ref>[/<path>]/<kind>/<item path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddresses {
    base_url: String,
}

impl RemoteAddresses {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let owner = config.owner().ok_or_else(|| {
            Error::Config("a user or organisation is required for the github repository".to_string())
        })?;
        if config.repository.is_empty() {
            return Err(Error::Config(
                "a repository name is required for the github repository".to_string(),
            ));
        }

        let git_ref = config.git_ref.trim_matches('/');
        let git_ref = if git_ref.is_empty() {
            crate::config::DEFAULT_REF
        } else {
            git_ref
        };
        let sub_path = config
            .path
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty());

        let base_url = [
            Some(config.host.trim_end_matches('/')),
            Some(owner),
            Some(config.repository.as_str()),
            Some("refs"),
            Some(git_ref),
            sub_path,
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("/");

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the manifest file.
    pub fn manifest_url(&self) -> String {
        format!("{}/{}", self.base_url, MANIFEST_FILE)
    }

    /// URL of an item.
    pub fn address(&self, kind: ItemKind, path: &str) -> Result<String> {
        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            kind.segment(),
            encode_path(&item_path(path)?)
        ))
    }
}
