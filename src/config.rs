//! Loads the project (`folio.yaml`) and theme (`theme/theme.yaml`)
//! configuration into a [`Config`]. Both files are closed: unknown keys are
//! rejected rather than ignored.

use crate::paginate::PageSize;
use crate::permalink;
use chrono::format::{Item, StrftimeItems};
use chrono::{Locale, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::convert::TryFrom;
use std::fmt;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use url::Url;

const PROJECT_FILE_NAME: &str = "folio.yaml";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    title: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    author: String,

    site_root: Url,

    #[serde(default)]
    posts_per_page: PageSize,

    #[serde(default = "default_base_path")]
    base_path: PathBuf,

    #[serde(default)]
    strip_date_prefix: bool,

    #[serde(default = "default_date_format")]
    date_format: String,

    #[serde(default = "default_date_locale")]
    date_locale: String,

    #[serde(default)]
    search: SearchConfig,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("posts")
}

fn default_date_format() -> String {
    String::from("%d de %B de %Y")
}

fn default_date_locale() -> String {
    String::from("pt_BR")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Theme {
    list_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
}

/// Configuration for the search-index export.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Whether to write the search index at all.
    #[serde(default = "default_search_enabled")]
    pub enabled: bool,

    /// The file name of the index, relative to the output directory.
    #[serde(default = "default_search_file_name")]
    pub file_name: String,
}

fn default_search_enabled() -> bool {
    true
}

fn default_search_file_name() -> String {
    String::from("search.json")
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            enabled: default_search_enabled(),
            file_name: default_search_file_name(),
        }
    }
}

/// Site-wide metadata available to every template.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    pub title: String,
    pub description: String,
    pub author: String,

    /// The absolute URL of the site's home page.
    pub home_page: Url,
}

/// A validated strftime format paired with the locale used for month and
/// weekday names.
#[derive(Clone, Debug)]
pub struct DateFormat {
    format: String,
    locale: Locale,
}

impl DateFormat {
    pub fn new(format: &str, locale: &str) -> Result<DateFormat> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidDateFormat(format.to_owned()));
        }
        let locale = Locale::try_from(locale)
            .map_err(|_| Error::UnknownLocale(locale.to_owned()))?;
        Ok(DateFormat {
            format: format.to_owned(),
            locale,
        })
    }

    pub fn format(&self, date: &NaiveDateTime) -> String {
        Utc.from_utc_datetime(date)
            .format_localized(&self.format, self.locale)
            .to_string()
    }
}

/// The configuration for a single build. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: Site,

    /// The project root; post identifiers are relative to it.
    pub project_root: PathBuf,

    /// The content directory, relative to [`Config::project_root`]. Also the
    /// prefix stripped from post identifiers when deriving slugs.
    pub base_path: PathBuf,

    pub slug_options: permalink::Options,
    pub posts_per_page: PageSize,
    pub date_format: DateFormat,

    /// The template files for listing pages, concatenated in order.
    pub list_template: Vec<PathBuf>,

    /// The template files for post pages, concatenated in order.
    pub post_template: Vec<PathBuf>,

    /// Static directories to copy, as `(source, destination)` pairs. Sources
    /// that don't exist are skipped.
    pub static_directories: Vec<(PathBuf, PathBuf)>,

    pub output_directory: PathBuf,
    pub search: SearchConfig,
}

impl Config {
    /// Searches `dir` and its ancestors for `folio.yaml` and loads it.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE_NAME);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::ProjectFileNotFound(dir.to_owned()))
    }

    /// Loads the project file at `path` and the theme next to it.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = read_yaml(path)?;
        let project_root = match path.parent() {
            Some(p) => p.to_owned(),
            None => return Err(Error::ProjectFileNotFound(path.to_owned())),
        };
        let theme_dir = project_root.join("theme");
        let theme: Theme = read_yaml(&theme_dir.join("theme.yaml"))?;
        log::debug!("loaded project file '{}'", path.display());

        let mut site_root = project.site_root;
        if site_root.cannot_be_a_base() {
            return Err(Error::InvalidSiteRoot(site_root));
        }
        // pages are joined onto the root, so it must name a directory
        if !site_root.path().ends_with('/') {
            let path = format!("{}/", site_root.path());
            site_root.set_path(&path);
        }
        let mut file_name = Path::new(&project.search.file_name).components();
        if !matches!(
            (file_name.next(), file_name.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::InvalidSearchFileName(project.search.file_name));
        }
        if project.base_path.as_os_str().is_empty()
            || !project
                .base_path
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::InvalidBasePath(project.base_path));
        }

        Ok(Config {
            site: Site {
                title: project.title,
                description: project.description,
                author: project.author,
                home_page: site_root,
            },
            base_path: project.base_path,
            slug_options: permalink::Options {
                strip_date_prefix: project.strip_date_prefix,
            },
            posts_per_page: project.posts_per_page,
            date_format: DateFormat::new(&project.date_format, &project.date_locale)?,
            list_template: theme
                .list_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            post_template: theme
                .post_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            static_directories: vec![
                (theme_dir.join("static"), output_directory.join("theme")),
                (project_root.join("static"), output_directory.to_owned()),
            ],
            output_directory: output_directory.to_owned(),
            search: project.search,
            project_root,
        })
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })?;
    serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
        path: path.to_owned(),
        err,
    })
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an invalid or missing configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `folio.yaml` exists in the directory or its ancestors.
    ProjectFileNotFound(PathBuf),

    /// Returned when a configuration file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when a configuration file isn't valid, including unknown
    /// keys and a non-positive `posts_per_page`.
    Yaml { path: PathBuf, err: serde_yaml::Error },

    /// Returned when `site_root` can't have paths joined onto it.
    InvalidSiteRoot(Url),

    /// Returned when `base_path` is empty or isn't a plain relative path.
    InvalidBasePath(PathBuf),

    /// Returned when `search.file_name` isn't a plain file name.
    InvalidSearchFileName(String),

    /// Returned when `date_format` contains an unknown specifier.
    InvalidDateFormat(String),

    /// Returned when `date_locale` isn't a known locale.
    UnknownLocale(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound(dir) => write!(
                f,
                "Could not find `{}` in '{}' or any parent directory",
                PROJECT_FILE_NAME,
                dir.display()
            ),
            Error::Open { path, err } => {
                write!(f, "Opening '{}': {}", path.display(), err)
            }
            Error::Yaml { path, err } => {
                write!(f, "Loading '{}': {}", path.display(), err)
            }
            Error::InvalidSiteRoot(url) => {
                write!(f, "site_root '{}' is not a base URL", url)
            }
            Error::InvalidBasePath(path) => write!(
                f,
                "base_path '{}' must be a relative path without `.` or `..`",
                path.display()
            ),
            Error::InvalidSearchFileName(name) => write!(
                f,
                "search.file_name '{}' must be a file name without directories",
                name
            ),
            Error::InvalidDateFormat(format) => {
                write!(f, "invalid date_format '{}'", format)
            }
            Error::UnknownLocale(locale) => {
                write!(f, "unknown date_locale '{}'", locale)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { err, .. } => Some(err),
            Error::Yaml { err, .. } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    const THEME: &str = "list_template: [base.html, list.html]\n\
                         post_template: [base.html, post.html]\n";

    fn project(project_yaml: &str) -> Result<(tempfile::TempDir, Config)> {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("theme")).unwrap();
        fs::write(dir.path().join("theme/theme.yaml"), THEME).unwrap();
        fs::write(dir.path().join(PROJECT_FILE_NAME), project_yaml).unwrap();
        let config = Config::from_directory(dir.path(), &dir.path().join("_site"))?;
        Ok((dir, config))
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let (dir, config) =
            project("title: Blog\nsite_root: https://example.org/\n")?;
        assert_eq!(6, config.posts_per_page.get());
        assert_eq!(PathBuf::from("posts"), config.base_path);
        assert_eq!(
            Url::parse("https://example.org/").unwrap(),
            config.site.home_page
        );
        assert!(!config.slug_options.strip_date_prefix);
        assert_eq!(SearchConfig::default(), config.search);
        assert_eq!(
            vec![
                dir.path().join("theme/base.html"),
                dir.path().join("theme/list.html")
            ],
            config.list_template
        );
        Ok(())
    }

    #[test]
    fn test_found_from_subdirectory() -> Result<()> {
        let (dir, _) = project("title: Blog\nsite_root: https://example.org/\n")?;
        let nested = dir.path().join("posts/deep");
        fs::create_dir_all(&nested).unwrap();
        let config = Config::from_directory(&nested, Path::new("/tmp/out"))?;
        assert_eq!(dir.path(), config.project_root);
        Ok(())
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            project("title: Blog\nsite_root: https://example.org/\nthreads: 4\n"),
            Err(Error::Yaml { .. })
        ));
        assert!(matches!(
            project(
                "title: Blog\nsite_root: https://example.org/\n\
                 search: {enabled: true, chunk_size: 10}\n"
            ),
            Err(Error::Yaml { .. })
        ));
    }

    #[test]
    fn test_non_positive_page_size_rejected() {
        for size in &["0", "-1"] {
            assert!(matches!(
                project(&format!(
                    "title: Blog\nsite_root: https://example.org/\nposts_per_page: {}\n",
                    size
                )),
                Err(Error::Yaml { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_base_path() {
        assert!(matches!(
            project("title: Blog\nsite_root: https://example.org/\nbase_path: ../posts\n"),
            Err(Error::InvalidBasePath(_))
        ));
    }

    #[test]
    fn test_site_root_path_gets_trailing_slash() -> Result<()> {
        let (_dir, config) = project("title: Blog\nsite_root: https://example.org/blog\n")?;
        assert_eq!("/blog/", config.site.home_page.path());
        Ok(())
    }

    #[test]
    fn test_invalid_search_file_name() {
        for name in &["../search.json", "data/search.json", "/search.json", "''", "."] {
            assert!(
                matches!(
                    project(&format!(
                        "title: Blog\nsite_root: https://example.org/\nsearch: {{file_name: {}}}\n",
                        name
                    )),
                    Err(Error::InvalidSearchFileName(_))
                ),
                "accepted '{}'",
                name
            );
        }
    }

    #[test]
    fn test_unknown_locale() {
        assert!(matches!(
            project("title: Blog\nsite_root: https://example.org/\ndate_locale: xx_YY\n"),
            Err(Error::UnknownLocale(_))
        ));
    }

    #[test]
    fn test_date_format() -> Result<()> {
        let date = NaiveDate::from_ymd_opt(2021, 3, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            "06 de março de 2021",
            DateFormat::new("%d de %B de %Y", "pt_BR")?.format(&date)
        );
        assert_eq!(
            "March 6, 2021",
            DateFormat::new("%B %-d, %Y", "en_US")?.format(&date)
        );
        assert!(matches!(
            DateFormat::new("%Q", "en_US"),
            Err(Error::InvalidDateFormat(_))
        ));
        Ok(())
    }
}
