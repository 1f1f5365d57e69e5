//! Defines the [`Parser`] type, which reads [`Post`]s from the content
//! directory. Posts come in two shapes:
//!
//! * a single markdown file, `{base_path}/hello.md`;
//! * a bundle directory, `{base_path}/hello/index.md`, whose other files are
//!   assets published next to the post.
//!
//! Entries are visited in file-name order so the resulting list is the same on
//! every machine; the [`crate::index::PostIndex`] relies on that order to
//! break date ties.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use url::Url;
use walkdir::WalkDir;

use crate::config::{Config, DateFormat};
use crate::markdown;
use crate::permalink::{self, derive_slug, site_path};
use crate::post::Post;

const BUNDLE_FILE_NAME: &str = "index.md";
const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// Post identifiers are source paths relative to this directory.
    project_root: &'a Path,

    /// The content directory relative to `project_root`, also stripped from
    /// identifiers to derive slugs.
    base_path: &'a Path,

    slug_options: permalink::Options,

    date_format: &'a DateFormat,

    /// The root URL of the site. Post URLs are `{site_root}{slug}/`.
    site_root: &'a Url,

    /// The directory in which post pages (and bundle assets) are written.
    output_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(config: &'a Config) -> Parser<'a> {
        Parser {
            project_root: &config.project_root,
            base_path: &config.base_path,
            slug_options: config.slug_options,
            date_format: &config.date_format,
            site_root: &config.site.home_page,
            output_directory: &config.output_directory,
        }
    }

    /// Walks the content directory and returns every post in enumeration
    /// order (not yet sorted by date) along with the bundle assets to copy.
    pub fn parse_posts(&self) -> Result<Posts> {
        let source_directory = self.project_root.join(self.base_path);
        let mut posts = Vec::new();
        let mut static_files = Vec::new();

        let mut entries = WalkDir::new(&source_directory)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter();
        while let Some(result) = entries.next() {
            let entry = result?;
            if entry.file_type().is_dir() {
                if entry.depth() > 0 && entry.path().join(BUNDLE_FILE_NAME).is_file() {
                    posts.push(self.parse_post_bundle(entry.path(), &mut static_files)?);
                    entries.skip_current_dir();
                }
            } else if entry
                .path()
                .extension()
                .map_or(false, |ext| ext == MARKDOWN_EXTENSION)
            {
                posts.push(self.parse_post(entry.path())?);
            }
        }

        log::debug!(
            "parsed {} posts and {} bundle assets from '{}'",
            posts.len(),
            static_files.len(),
            source_directory.display()
        );
        Ok((posts, static_files))
    }

    fn parse_post_bundle(
        &self,
        bundle_directory: &Path,
        static_files: &mut Vec<StaticFile>,
    ) -> Result<Post> {
        // Parse the post before touching `static_files` so a failed bundle
        // contributes nothing.
        let post = self.parse_post(&bundle_directory.join(BUNDLE_FILE_NAME))?;

        let destination = self.output_directory.join(post.slug.relative());
        let entries = WalkDir::new(bundle_directory)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in entries {
            let entry = result?;
            if entry.file_type().is_file() && entry.depth() > 0 {
                if entry.depth() == 1 && entry.file_name() == BUNDLE_FILE_NAME {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(bundle_directory) {
                    static_files
                        .push((entry.path().to_owned(), destination.join(relative)));
                }
            }
        }

        Ok(post)
    }

    /// Reads and parses the post at `path`, annotating any error with the
    /// path.
    fn parse_post(&self, path: &Path) -> Result<Post> {
        let identifier = path.strip_prefix(self.project_root).unwrap_or(path);
        let annotate = |e: Error| {
            Error::Annotated(
                format!("parsing post `{}`", identifier.display()),
                Box::new(e),
            )
        };
        let mut contents = String::new();
        {
            use std::io::Read;
            File::open(path)
                .and_then(|mut f| f.read_to_string(&mut contents))
                .map_err(|e| annotate(e.into()))?;
        }
        self.post_from_str(identifier, &contents).map_err(annotate)
    }

    /// Parses a single [`Post`] from its `identifier` (source path relative
    /// to the project root) and file contents. Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with at least `title` and `date`
    /// 3. Terminal frontmatter fence (`---`) on its own line
    /// 4. Post body (markdown)
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// description: The first post
    /// date: 2021-04-16 10:00:00
    /// category: misc
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn post_from_str(&self, identifier: &Path, input: &str) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            const CLOSING_FENCE: &str = "\n---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find(CLOSING_FENCE) {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                                // yaml_start
                    FENCE.len() + offset,                       // yaml_stop
                    FENCE.len() + offset + CLOSING_FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = match input[yaml_start..yaml_stop].trim() {
            "" => Frontmatter::default(),
            yaml => serde_yaml::from_str(yaml)?,
        };

        let title = required(frontmatter.title, "title")?;
        let date = parse_date(&required(frontmatter.date, "date")?)?;
        let slug = derive_slug(identifier, self.base_path, self.slug_options)?;

        let page_url = self.site_root.join(&format!("{}/", slug.relative()))?;
        let rendered = markdown::to_html(&input[body_start..], &page_url)?;
        let image = frontmatter
            .image
            .map(|image| markdown::resolve_relative(&page_url, &image).unwrap_or(image));

        Ok(Post {
            source: identifier.to_owned(),
            url: site_path(self.site_root, slug.as_str()),
            slug,
            title,
            description: frontmatter.description,
            display_date: self.date_format.format(&date),
            date,
            category: frontmatter.category,
            background: frontmatter.background,
            image,
            read_minutes: rendered.read_minutes(),
            body: rendered.html,
        })
    }
}

/// The front-matter keys we understand. Other keys (e.g. those added by a
/// CMS) are ignored.
#[derive(Deserialize, Default)]
struct Frontmatter {
    title: Option<String>,

    /// Either `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, or RFC 3339.
    date: Option<String>,

    #[serde(default)]
    description: String,

    #[serde(default)]
    category: String,

    background: Option<String>,

    image: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}

fn parse_date(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| Error::InvalidDate {
        value: value.to_owned(),
        err,
    })?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::InvalidTime(value.to_owned()))
}

/// Posts in enumeration order and the bundle assets to copy.
pub type Posts = (Vec<Post>, Vec<StaticFile>);

/// A `(source, destination)` pair of paths.
pub type StaticFile = (PathBuf, PathBuf);

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a required frontmatter field (`title` or `date`) is
    /// missing or blank.
    MissingField(&'static str),

    /// Returned when the `date` field isn't in a recognized format.
    InvalidDate {
        value: String,
        err: chrono::ParseError,
    },

    /// Returned when a parsed date can't be placed at midnight.
    InvalidTime(String),

    /// Returned when a post's slug can't be derived from its path.
    Slug(permalink::Error),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl Error {
    /// Returns the innermost error, skipping annotations.
    pub fn root(&self) -> &Error {
        match self {
            Error::Annotated(_, err) => err.root(),
            _ => self,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::MissingField(field) => {
                write!(f, "missing required frontmatter field `{}`", field)
            }
            Error::InvalidDate { value, err } => {
                write!(f, "invalid date '{}': {}", value, err)
            }
            Error::InvalidTime(value) => write!(f, "invalid time in date '{}'", value),
            Error::Slug(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::MissingField(_) => None,
            Error::InvalidDate { err, .. } => Some(err),
            Error::InvalidTime(_) => None,
            Error::Slug(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<permalink::Error> for Error {
    fn from(err: permalink::Error) -> Error {
        Error::Slug(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
