//! Resources tracked inside groups.
//!
//! A resource is a URI reference to a file or folder. Two resources are the
//! same when they denote the same normalized path, so `file:///a/b/` and
//! `file:///a/./b` collapse to one entry.

use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GroveError, Result};

#[derive(Debug, Clone)]
pub struct Resource {
    url: Url,
    key: String,
}

impl Resource {
    /// Parse a resource from a URI string.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|err| GroveError::InvalidResource(format!("{uri}: {err}")))?;
        Ok(Self::from_url(url))
    }

    /// Build a `file:` resource from an absolute filesystem path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let normalized = normalize_path(path);
        let url = Url::from_file_path(&normalized).map_err(|()| {
            GroveError::InvalidResource(format!("not an absolute path: {}", path.display()))
        })?;
        Ok(Self::from_url(url))
    }

    /// Build a `file:` resource, resolving relative paths against `base`.
    pub fn from_path_in(base: &Path, path: &Path) -> Result<Self> {
        if path.is_absolute() {
            Self::from_path(path)
        } else {
            Self::from_path(&base.join(path))
        }
    }

    #[must_use]
    pub fn from_url(url: Url) -> Self {
        let key = normalized_key(&url);
        Self { url, key }
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Normalized comparison key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.url.scheme() == "file"
    }

    /// Filesystem path for `file:` resources.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.is_file() {
            self.url.to_file_path().ok()
        } else {
            None
        }
    }

    /// Last path segment, used for base-name ordering and display.
    #[must_use]
    pub fn base_name(&self) -> String {
        self.key
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Display form: the filesystem path for files, the URI otherwise.
    #[must_use]
    pub fn display(&self) -> String {
        self.file_path()
            .map_or_else(|| self.url.to_string(), |path| path.display().to_string())
    }

    #[must_use]
    pub fn to_record(&self) -> ResourceRecord {
        let mut authority = String::new();
        if !self.url.username().is_empty() || self.url.password().is_some() {
            authority.push_str(self.url.username());
            if let Some(password) = self.url.password() {
                authority.push(':');
                authority.push_str(password);
            }
            authority.push('@');
        }
        if let Some(host) = self.url.host_str() {
            authority.push_str(host);
            if let Some(port) = self.url.port() {
                authority.push_str(&format!(":{port}"));
            }
        }
        ResourceRecord {
            scheme: self.url.scheme().to_string(),
            authority,
            path: self.url.path().to_string(),
            query: self.url.query().map(str::to_string),
            fragment: self.url.fragment().map(str::to_string),
        }
    }

    pub fn from_record(record: &ResourceRecord) -> Result<Self> {
        let mut uri = if record.authority.is_empty() && record.scheme != "file" {
            format!("{}:{}", record.scheme, record.path)
        } else {
            format!("{}://{}{}", record.scheme, record.authority, record.path)
        };
        if let Some(query) = &record.query {
            uri.push('?');
            uri.push_str(query);
        }
        if let Some(fragment) = &record.fragment {
            uri.push('#');
            uri.push_str(fragment);
        }
        Self::parse(&uri)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Structured resource descriptor stored by record-based providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub scheme: String,
    #[serde(default)]
    pub authority: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

/// Existence check consulted by the boundary layer before a resource is added.
pub trait ExistenceCheck {
    fn exists(&self, resource: &Resource) -> bool;
}

/// Existence check backed by the local filesystem. Non-file URIs are accepted as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsExistenceCheck;

impl ExistenceCheck for FsExistenceCheck {
    fn exists(&self, resource: &Resource) -> bool {
        resource.file_path().is_none_or(|path| path.exists())
    }
}

fn normalized_key(url: &Url) -> String {
    if url.scheme() == "file" {
        if let Ok(path) = url.to_file_path() {
            let normalized = normalize_path(&path);
            let text = normalized.to_string_lossy();
            return strip_trailing_separator(&text).to_string();
        }
    }
    strip_trailing_separator(url.as_str()).to_string()
}

fn strip_trailing_separator(text: &str) -> &str {
    let trimmed = text.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() || trimmed.ends_with(':') {
        text
    } else {
        trimmed
    }
}

/// Lexical normalization: resolves `.` and `..` without touching the disk.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
