//! Request line parsing and URI to file resolution

use std::path::{Component, Path, PathBuf};

/// Errors raised while reading a request
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    /// The request line is not `METHOD TARGET VERSION`
    #[error("malformed request line: {0:?}")]
    Malformed(String),

    /// Anything other than HTTP/1.0 or HTTP/1.1
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// The target escapes the document root
    #[error("forbidden path: {0}")]
    Forbidden(String),
}

/// Request method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// Any other token; answered with 405
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            other => Method::Other(other.to_string()),
        }
    }
}

/// Protocol version of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    Http11,
}

impl Version {
    /// The version token as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

/// The first line of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method
    pub method: Method,
    /// Request target as sent, query included
    pub target: String,
    /// Protocol version
    pub version: Version,
}

impl RequestLine {
    /// Parses `METHOD TARGET VERSION`, trailing CRLF allowed.
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let mut parts = line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(RequestError::Malformed(line.trim_end().to_string()));
        };

        let version = match version {
            "HTTP/1.0" => Version::Http10,
            "HTTP/1.1" => Version::Http11,
            other => return Err(RequestError::UnsupportedVersion(other.to_string())),
        };

        Ok(Self {
            method: Method::parse(method),
            target: target.to_string(),
            version,
        })
    }
}

/// Maps a request target onto a file below `root`.
///
/// The query string is ignored and a trailing `/` serves `index.html`.
/// Targets that are not absolute paths or that climb out of `root` are
/// rejected.
pub fn resolve_path(root: &Path, target: &str) -> Result<PathBuf, RequestError> {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    if !path.starts_with('/') {
        return Err(RequestError::Forbidden(target.to_string()));
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(path).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir | Component::Prefix(_) => {
                return Err(RequestError::Forbidden(target.to_string()));
            }
        }
    }

    if path.ends_with('/') {
        resolved.push("index.html");
    }
    Ok(resolved)
}
