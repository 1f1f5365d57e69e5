//! Derives the canonical URL path ([`Slug`]) for a post from its source
//! identifier. A slug always has exactly one leading `/` and never a trailing
//! slash, e.g. `posts/2024-01-01-hello-world/index.md` becomes
//! `/2024-01-01-hello-world`.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::Url;

const BUNDLE_FILE_NAME: &str = "index.md";
const MARKDOWN_EXTENSION: &str = "md";

/// The length of a `YYYY-MM-DD-` prefix.
const DATE_PREFIX_LEN: usize = 11;

/// The canonical URL path for a post.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The slug without its leading `/`, suitable for joining onto a base
    /// URL or output directory.
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Options which modify slug derivation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Remove a `YYYY-MM-DD-` prefix from the last path segment. When set,
    /// every identifier's last segment must carry such a prefix.
    pub strip_date_prefix: bool,
}

/// Derives the [`Slug`] for the post identified by `identifier`, a path
/// relative to the project root which must live under `base_path`.
///
/// Directory-style posts (`{base_path}/foo/index.md`) and leaf posts
/// (`{base_path}/foo.md`) both resolve to `/foo`.
pub fn derive_slug(
    identifier: &Path,
    base_path: &Path,
    options: Options,
) -> Result<Slug> {
    let relative = identifier.strip_prefix(base_path).map_err(|_| {
        Error::PrefixMismatch {
            identifier: identifier.to_owned(),
            base_path: base_path.to_owned(),
        }
    })?;

    let mut segments: Vec<&str> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(
                segment
                    .to_str()
                    .ok_or_else(|| Error::InvalidUnicode(identifier.to_owned()))?,
            ),
            _ => return Err(Error::NotRelative(identifier.to_owned())),
        }
    }

    match segments.pop() {
        Some(BUNDLE_FILE_NAME) => {}
        Some(leaf) => {
            let stem = leaf
                .strip_suffix(MARKDOWN_EXTENSION)
                .and_then(|s| s.strip_suffix('.'))
                .ok_or_else(|| Error::NotMarkdown(identifier.to_owned()))?;
            segments.push(stem);
        }
        None => return Err(Error::Empty(identifier.to_owned())),
    }

    if options.strip_date_prefix {
        match segments.last_mut() {
            Some(last) => *last = strip_date_prefix(last).ok_or_else(|| {
                Error::MissingDatePrefix(identifier.to_owned())
            })?,
            None => return Err(Error::Empty(identifier.to_owned())),
        }
    }

    if segments.iter().any(|s| s.is_empty()) || segments.is_empty() {
        return Err(Error::Empty(identifier.to_owned()));
    }

    Ok(Slug(format!("/{}", segments.join("/"))))
}

/// Returns the path at which `route` is served when the site lives at
/// `site_root`. Under `https://example.org/blog/` the route `/page/2` is
/// served at `/blog/page/2` and `/` at `/blog/`.
pub fn site_path(site_root: &Url, route: &str) -> String {
    format!("{}{}", site_root.path().trim_end_matches('/'), route)
}

fn strip_date_prefix(segment: &str) -> Option<&str> {
    let prefix = segment.get(..DATE_PREFIX_LEN)?;
    let date = prefix.strip_suffix('-')?;
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(&segment[DATE_PREFIX_LEN..])
}

/// The result of a slug derivation.
pub type Result<T> = std::result::Result<T, Error>;

/// A slug that can't be derived. All variants indicate a mismatch between the
/// configured `base_path` and the content on disk, and so are treated as
/// configuration errors.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// The identifier doesn't live under the configured base path.
    PrefixMismatch { identifier: PathBuf, base_path: PathBuf },

    /// The identifier contains `..`, `.`, or a root component.
    NotRelative(PathBuf),

    /// The identifier isn't valid UTF-8.
    InvalidUnicode(PathBuf),

    /// The identifier doesn't name a markdown file.
    NotMarkdown(PathBuf),

    /// Nothing is left after stripping the prefix and file name.
    Empty(PathBuf),

    /// Date-prefix stripping is enabled but the identifier has no
    /// `YYYY-MM-DD-` prefix.
    MissingDatePrefix(PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::PrefixMismatch {
                identifier,
                base_path,
            } => write!(
                f,
                "'{}' is not under the base path '{}'",
                identifier.display(),
                base_path.display()
            ),
            Error::NotRelative(path) => {
                write!(f, "'{}' is not a plain relative path", path.display())
            }
            Error::InvalidUnicode(path) => {
                write!(f, "'{}' is not valid UTF-8", path.display())
            }
            Error::NotMarkdown(path) => {
                write!(f, "'{}' is not a markdown file", path.display())
            }
            Error::Empty(path) => {
                write!(f, "'{}' resolves to an empty slug", path.display())
            }
            Error::MissingDatePrefix(path) => write!(
                f,
                "'{}' has no `YYYY-MM-DD-` prefix to strip",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {}
