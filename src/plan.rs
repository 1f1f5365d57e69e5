//! Plans every page of a build before anything is written: the listing pages
//! from [`crate::paginate`] and one [`PostPage`] per post with its
//! [`Neighbors`]. Planning fails if any two pages would share a route, or if
//! a page would clash with one of the files the build writes next to the
//! pages ([`SitePlan::reserve_file`]).

use crate::index::PostIndex;
use crate::neighbors::Neighbors;
use crate::paginate::{paginate, ListPage, PageSize};
use crate::post::Post;
use gtmpl::Value;
use std::collections::HashMap;
use std::fmt;

/// The page for a single post.
#[derive(Debug, PartialEq)]
pub struct PostPage<'a> {
    /// The route at which the page is published; the post's slug.
    pub route: &'a str,

    pub post: &'a Post,

    /// Links to the newer (`next`) and older (`previous`) posts.
    pub neighbors: Neighbors,
}

impl PostPage<'_> {
    /// Converts a [`PostPage`] into a template-renderable [`Value`] with
    /// fields `route`, `post`, `previous` and `next`.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("route".to_owned(), Value::String(self.route.to_owned()));
        m.insert("post".to_owned(), self.post.to_value());
        self.neighbors.insert_into(&mut m);
        Value::Object(m)
    }
}

/// Identifies what owns a route, for reporting collisions.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteOwner {
    /// A listing page, by 1-based number.
    ListPage(usize),

    /// A post, by source identifier.
    Post(String),

    /// A file written at the root of the output directory, by name.
    File(String),
}

impl fmt::Display for RouteOwner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouteOwner::ListPage(number) => write!(f, "listing page {}", number),
            RouteOwner::Post(source) => write!(f, "post '{}'", source),
            RouteOwner::File(name) => write!(f, "file '{}'", name),
        }
    }
}

/// Every page of a build.
#[derive(Debug)]
pub struct SitePlan<'a> {
    pub list_pages: Vec<ListPage<'a>>,
    pub post_pages: Vec<PostPage<'a>>,

    /// The names of the files reserved with [`SitePlan::reserve_file`].
    files: Vec<String>,
}

impl<'a> SitePlan<'a> {
    /// Plans the listing and post pages for `index`.
    pub fn new(index: &'a PostIndex, page_size: PageSize) -> Result<SitePlan<'a>> {
        let list_pages = paginate(index, page_size);
        let post_pages: Vec<PostPage<'a>> = index
            .posts()
            .iter()
            .enumerate()
            .map(|(i, post)| PostPage {
                route: post.slug.as_str(),
                post,
                neighbors: index.neighbors(i),
            })
            .collect();

        let plan = SitePlan {
            list_pages,
            post_pages,
            files: Vec::new(),
        };

        {
            let mut routes: HashMap<&str, RouteOwner> = HashMap::new();
            for (route, owner) in plan.owners() {
                if let Some(first) = routes.get(route) {
                    return Err(Error::RouteCollision {
                        route: route.to_owned(),
                        first: first.clone(),
                        second: owner,
                    });
                }
                routes.insert(route, owner);
            }
        }

        Ok(plan)
    }

    /// Reserves `name`, a file written at the root of the output directory
    /// alongside the pages (e.g. `sitemap.xml`). Fails if a page is written
    /// at that path or beneath it, or if the name is already reserved.
    pub fn reserve_file(&mut self, name: &str) -> Result<()> {
        let path = format!("/{}", name);
        let owner = RouteOwner::File(name.to_owned());
        if self.files.iter().any(|file| file == name) {
            return Err(Error::RouteCollision {
                route: path,
                first: RouteOwner::File(name.to_owned()),
                second: owner,
            });
        }

        let directory = format!("{}/", path);
        for (route, first) in self.owners() {
            // a page at `/a/b` is written to `/a/b/index.html`
            let page_file = format!("{}/index.html", route.trim_end_matches('/'));
            if page_file == path || page_file.starts_with(&directory) {
                return Err(Error::RouteCollision {
                    route: route.to_owned(),
                    first,
                    second: owner,
                });
            }
        }

        self.files.push(name.to_owned());
        Ok(())
    }

    /// The names of the reserved files, in reservation order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    fn owners(&self) -> impl Iterator<Item = (&str, RouteOwner)> {
        self.list_pages
            .iter()
            .map(|p| (p.route.as_str(), RouteOwner::ListPage(p.number)))
            .chain(self.post_pages.iter().map(|p| {
                (
                    p.route,
                    RouteOwner::Post(p.post.source.display().to_string()),
                )
            }))
    }

    /// Every planned route: listing pages first, then posts in index order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.list_pages
            .iter()
            .map(|p| p.route.as_str())
            .chain(self.post_pages.iter().map(|p| p.route))
    }
}

/// The result of planning a site.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error planning a site.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when two pages would be published at the same route.
    RouteCollision {
        route: String,
        first: RouteOwner,
        second: RouteOwner,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RouteCollision {
                route,
                first,
                second,
            } => write!(
                f,
                "route collision at '{}' between {} and {}",
                route, first, second
            ),
        }
    }
}

impl std::error::Error for Error {}
