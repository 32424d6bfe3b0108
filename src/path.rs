/// Request path parsing for gist URLs
///
/// Accepted forms:
/// - `/{gist_id}` (non-canonical, redirect to `/{gist_id}/`)
/// - `/{gist_id}/` and `/{gist_id}/{filename}`
/// - `/{owner}/{gist_id}` (non-canonical, redirect to `/{owner}/{gist_id}/`)
/// - `/{owner}/{gist_id}/` and `/{owner}/{gist_id}/{filename}`
///
/// The owner segment is decorative and never checked.
use crate::error::{GistError, GistResult};

/// First path segment reserved for internal routes
pub const RESERVED_PREFIX: &str = "_";

/// Whether a parsed path can be served as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    Ok,
    /// Caller must redirect to the same path with a trailing slash
    NonCanonical,
}

/// Gist reference extracted from a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistPath {
    pub gist_id: String,
    /// Empty when the gist root was requested
    pub filename: String,
    pub outcome: PathOutcome,
}

impl GistPath {
    fn new(gist_id: String, filename: String, outcome: PathOutcome) -> Self {
        Self {
            gist_id,
            filename,
            outcome,
        }
    }
}

/// Extract the gist id and filename from a URL path.
///
/// The number of segments decides the form before any segment content is
/// looked at. Unroutable paths yield `GistError::InvalidPath`.
pub fn parse_path(path: &str) -> GistResult<GistPath> {
    let invalid = || GistError::InvalidPath(path.to_string());

    let mut segments: Vec<&str> = path.split('/').collect();
    if segments.first() == Some(&"") {
        segments.remove(0);
    }

    if segments.first() == Some(&RESERVED_PREFIX) {
        return Err(invalid());
    }

    let decode = |s: &str| -> GistResult<String> {
        urlencoding::decode(s)
            .map(|s| s.into_owned())
            .map_err(|_| invalid())
    };

    match segments.as_slice() {
        [gist_id] => {
            if gist_id.is_empty() {
                return Err(invalid());
            }
            Ok(GistPath::new(
                decode(gist_id)?,
                String::new(),
                PathOutcome::NonCanonical,
            ))
        }
        // An empty leading segment would make the redirect target `//host/`
        [first, _] if first.is_empty() => Err(invalid()),
        [first, second] => {
            if second.is_empty() || second.contains('.') {
                Ok(GistPath::new(decode(first)?, decode(second)?, PathOutcome::Ok))
            } else {
                Ok(GistPath::new(
                    decode(second)?,
                    String::new(),
                    PathOutcome::NonCanonical,
                ))
            }
        }
        [owner, gist_id, _] if owner.is_empty() || gist_id.is_empty() => Err(invalid()),
        [_owner, gist_id, filename] => Ok(GistPath::new(
            decode(gist_id)?,
            decode(filename)?,
            PathOutcome::Ok,
        )),
        _ => Err(invalid()),
    }
}
