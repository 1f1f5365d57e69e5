//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), ordering them ([`crate::index`]), planning every page
//! ([`crate::plan`]), rendering the pages ([`crate::write`]), copying static
//! assets, and writing the search index and sitemap.
//!
//! Every step that can reject the content runs before the output directory is
//! touched, so a failed build leaves the previous output in place.

use crate::config::{self, Config};
use crate::index::{self, PostIndex};
use crate::parser::{self, Parser as PostParser};
use crate::plan::{self, SitePlan};
use crate::search;
use crate::sitemap::{write_sitemap, SITEMAP_FILE_NAME};
use crate::write::{self, Writer};
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marks an output directory as created by folio, and so safe to wipe.
const WATERMARK_FILE_NAME: &str = ".folio";

/// Builds the site described by `config`.
pub fn build_site(config: &Config) -> Result<()> {
    log::info!("building '{}'", config.project_root.display());

    let (posts, static_files) = PostParser::new(config).parse_posts()?;
    let index = PostIndex::build(posts)?;
    let plan = plan_site(config, &index)?;
    log::info!(
        "planned {} posts across {} listing pages",
        index.len(),
        plan.list_pages.len()
    );

    // Parse the template files.
    let list_template = parse_template(config.list_template.iter())?;
    let post_template = parse_template(config.post_template.iter())?;

    prepare_output_directory(&config.output_directory)?;

    // copy static directories first so that rendered pages win any clash
    for (src, dst) in &config.static_directories {
        if src.is_dir() {
            copy_dir(src, dst)?;
        }
    }
    for (src, dst) in &static_files {
        copy_file(src, dst)?;
    }

    Writer {
        list_template: &list_template,
        post_template: &post_template,
        site: &config.site,
        output_directory: &config.output_directory,
    }
    .write_plan(&plan)?;

    if config.search.enabled {
        let path = config.output_directory.join(&config.search.file_name);
        search::write_records(File::create(&path)?, &search::records(&index))?;
        log::info!("wrote search index '{}'", path.display());
    }

    write_sitemap(
        File::create(config.output_directory.join(SITEMAP_FILE_NAME))?,
        &config.site.home_page,
        &plan,
    )?;

    log::info!("site built at '{}'", config.output_directory.display());
    Ok(())
}

/// Plans the site described by `config` and writes one line per route to `w`
/// without rendering anything.
pub fn describe_plan<W: Write>(config: &Config, mut w: W) -> Result<()> {
    let (posts, _) = PostParser::new(config).parse_posts()?;
    let index = PostIndex::build(posts)?;
    let plan = plan_site(config, &index)?;

    for page in &plan.list_pages {
        writeln!(
            w,
            "{}\tpage {} of {} ({} posts)",
            page.route,
            page.number,
            page.total_pages,
            page.posts.len()
        )?;
    }
    for page in &plan.post_pages {
        writeln!(
            w,
            "{}\t{} ({})\tnext: {}\tprevious: {}",
            page.route,
            page.post.title,
            page.post.date.format("%Y-%m-%d"),
            page.neighbors.next.as_ref().map_or("-", |n| n.slug.as_str()),
            page.neighbors
                .previous
                .as_ref()
                .map_or("-", |n| n.slug.as_str()),
        )?;
    }
    Ok(())
}

/// Plans the pages of `index` and reserves the other files written at the
/// root of the output directory, so any clash between them is found before
/// the output is touched.
fn plan_site<'a>(config: &Config, index: &'a PostIndex) -> Result<SitePlan<'a>> {
    let mut plan = SitePlan::new(index, config.posts_per_page)?;
    plan.reserve_file(SITEMAP_FILE_NAME)?;
    if config.search.enabled {
        plan.reserve_file(&config.search.file_name)?;
    }
    Ok(plan)
}

/// Empties `dir` for a fresh build. An existing, non-empty directory is only
/// wiped if a previous build left its watermark there.
fn prepare_output_directory(dir: &Path) -> Result<()> {
    if dir.exists() {
        let watermarked = dir.join(WATERMARK_FILE_NAME).is_file();
        let empty = std::fs::read_dir(dir)?.next().is_none();
        if !watermarked && !empty {
            return Err(Error::UnmanagedOutputDirectory(dir.to_owned()));
        }
        std::fs::remove_dir_all(dir).map_err(|err| Error::Clean {
            path: dir.to_owned(),
            err,
        })?;
    }
    std::fs::create_dir_all(dir)?;
    File::create(dir.join(WATERMARK_FILE_NAME))?;
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src) {
        let entry = result.map_err(parser::Error::from)?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(dst.join(relative))?;
        } else {
            copy_file(entry.path(), &dst.join(relative))?;
        }
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(dir) = dst.parent() {
        std::fs::create_dir_all(dir)?;
    }
    log::debug!("copying '{}' to '{}'", src.display(), dst.display());
    std::fs::copy(src, dst)?;
    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Configuration, content and route
/// errors are all fatal and are reported before any output is written.
#[derive(Debug)]
pub enum Error {
    /// Returned for invalid or missing configuration.
    Config(config::Error),

    /// Returned for errors reading or parsing posts.
    Parse(parser::Error),

    /// Returned when two posts share a slug.
    Index(index::Error),

    /// Returned when two planned pages share a route.
    Plan(plan::Error),

    /// Returned for errors rendering pages to disk.
    Write(write::Error),

    /// Returned when the output directory holds files folio didn't create.
    UnmanagedOutputDirectory(PathBuf),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors serializing the search index.
    Search(serde_json::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Index(err) => err.fmt(f),
            Error::Plan(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::UnmanagedOutputDirectory(path) => write!(
                f,
                "Refusing to overwrite '{}': it is not empty and was not created by folio",
                path.display()
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Search(err) => write!(f, "Writing search index: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Plan(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::UnmanagedOutputDirectory(_) => None,
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Search(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<config::Error> for Error {
    fn from(err: config::Error) -> Error {
        Error::Config(err)
    }
}

impl From<parser::Error> for Error {
    /// Converts [`parser::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: parser::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<index::Error> for Error {
    fn from(err: index::Error) -> Error {
        Error::Index(err)
    }
}

impl From<plan::Error> for Error {
    fn from(err: plan::Error) -> Error {
        Error::Plan(err)
    }
}

impl From<write::Error> for Error {
    /// Converts [`write::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Search(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn demo_project() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demo")
    }

    #[test]
    fn test_build_demo_site() -> Result<()> {
        let out = tempfile::tempdir()?;
        let out = out.path().join("site");
        let config = Config::from_directory(&demo_project(), &out)?;
        build_site(&config)?;

        for file in &[
            "index.html",
            "page/2/index.html",
            "hello-world/index.html",
            "hello-world/cover.svg",
            "search.json",
            "sitemap.xml",
            "theme/style.css",
            "robots.txt",
            WATERMARK_FILE_NAME,
        ] {
            assert!(out.join(file).is_file(), "missing '{}'", file);
        }

        let home = fs::read_to_string(out.join("index.html"))?;
        assert!(home.contains("href=\"/page/2\""));
        assert!(!home.contains("página anterior"));
        assert!(home.contains("style=\"background: #7AAB13\""));

        let hello = fs::read_to_string(out.join("hello-world/index.html"))?;
        assert!(hello.contains("class=\"hero\" src=\"/hello-world/cover.svg\""));

        let search: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("search.json"))?)?;
        assert_eq!(
            config.posts_per_page.get() + 1,
            search.as_array().map_or(0, |a| a.len())
        );

        // rebuilding over our own output is allowed
        build_site(&config)?;
        Ok(())
    }

    /// Copies the demo project into a temporary directory so a test can
    /// change it.
    fn demo_copy() -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        copy_dir(&demo_project(), dir.path())?;
        Ok(dir)
    }

    #[test]
    fn test_post_clashing_with_sitemap_keeps_previous_output() -> Result<()> {
        let project = demo_copy()?;
        let out = project.path().join("_site");
        let config = Config::from_directory(project.path(), &out)?;
        build_site(&config)?;

        fs::write(
            project.path().join("posts/sitemap.xml.md"),
            "---\ntitle: Sitemap\ndate: 2022-01-01\n---\nbody",
        )?;
        match build_site(&config) {
            Err(Error::Plan(plan::Error::RouteCollision { route, .. })) => {
                assert_eq!("/sitemap.xml", route)
            }
            other => panic!("wanted a route collision; found {:?}", other),
        }
        assert!(out.join(SITEMAP_FILE_NAME).is_file());
        assert!(out.join("index.html").is_file());
        Ok(())
    }

    #[test]
    fn test_search_file_clashing_with_home_page() -> Result<()> {
        let project = demo_copy()?;
        let project_file = project.path().join("folio.yaml");
        let yaml = fs::read_to_string(&project_file)?
            .replace("file_name: search.json", "file_name: index.html");
        fs::write(&project_file, yaml)?;

        let out = project.path().join("_site");
        let config = Config::from_directory(project.path(), &out)?;
        assert!(matches!(
            build_site(&config),
            Err(Error::Plan(plan::Error::RouteCollision { .. }))
        ));
        assert!(!out.exists());
        Ok(())
    }

    #[test]
    fn test_refuses_unmanaged_output_directory() -> Result<()> {
        let out = tempfile::tempdir()?;
        fs::write(out.path().join("precious.txt"), "keep me")?;
        let config = Config::from_directory(&demo_project(), out.path())?;
        assert!(matches!(
            build_site(&config),
            Err(Error::UnmanagedOutputDirectory(_))
        ));
        assert!(out.path().join("precious.txt").is_file());
        Ok(())
    }

    #[test]
    fn test_describe_plan() -> Result<()> {
        let config = Config::from_directory(&demo_project(), Path::new("unused"))?;
        let mut out = Vec::new();
        describe_plan(&config, &mut out)?;
        let out = String::from_utf8(out).unwrap_or_default();
        let first = out.lines().next().unwrap_or_default();
        assert_eq!("/\tpage 1 of 2 (6 posts)", first);
        assert!(out.contains("/page/2\tpage 2 of 2 (1 posts)"));
        Ok(())
    }
}
