//! Templates the pages of a [`SitePlan`] and writes them to disk.

use crate::config::Site;
use crate::plan::SitePlan;
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    /// The template for listing pages.
    pub list_template: &'a Template,

    /// The template for post pages.
    pub post_template: &'a Template,

    /// Site-wide metadata. This is made available to both templates as
    /// `site`, typically for the header and `<meta>` tags. `site.path` is the
    /// path of the home page (`/` or e.g. `/blog/`) for site-wide links.
    pub site: &'a Site,

    /// The directory in which pages are written. A page with route `/a/b` is
    /// written to `{output_directory}/a/b/index.html`.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Writes every page of `plan`.
    pub fn write_plan(&self, plan: &SitePlan) -> Result<()> {
        for page in &plan.list_pages {
            self.write_page(
                self.list_template,
                &page.route,
                page.to_value(&self.site.home_page),
            )?;
        }
        for page in &plan.post_pages {
            self.write_page(self.post_template, page.route, page.to_value())?;
        }
        log::info!(
            "wrote {} listing pages and {} post pages",
            plan.list_pages.len(),
            plan.post_pages.len()
        );
        Ok(())
    }

    /// Templates a single page and writes it to disk.
    fn write_page(&self, template: &Template, route: &str, value: Value) -> Result<()> {
        let mut value = value;
        if let Value::Object(obj) = &mut value {
            obj.insert("site".to_owned(), site_to_value(self.site));
        }

        let file_path = page_file_path(self.output_directory, route);
        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        log::debug!("writing '{}' to '{}'", route, file_path.display());
        template.execute(
            &mut std::fs::File::create(&file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        Ok(())
    }
}

/// Returns the output file for `route`: `/` maps to
/// `{output_directory}/index.html` and `/a/b` to
/// `{output_directory}/a/b/index.html`.
pub fn page_file_path(output_directory: &Path, route: &str) -> PathBuf {
    route
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(output_directory.to_owned(), |dir, segment| dir.join(segment))
        .join("index.html")
}

fn site_to_value(site: &Site) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(site.title.clone()));
    m.insert(
        "description".to_owned(),
        Value::String(site.description.clone()),
    );
    m.insert("author".to_owned(), Value::String(site.author.clone()));
    m.insert(
        "home_page".to_owned(),
        Value::String(site.home_page.to_string()),
    );
    m.insert(
        "path".to_owned(),
        Value::String(site.home_page.path().to_owned()),
    );
    Value::Object(m)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}
