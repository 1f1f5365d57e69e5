//! Partitions the [`PostIndex`] into fixed-size listing pages.

use crate::index::PostIndex;
use crate::permalink::site_path;
use crate::post::Post;
use gtmpl::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::num::NonZeroUsize;
use url::Url;

/// The number of posts per listing page. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    pub fn new(size: usize) -> Option<PageSize> {
        NonZeroUsize::new(size).map(PageSize)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(NonZeroUsize::new(6).unwrap())
    }
}

impl TryFrom<i64> for PageSize {
    type Error = InvalidPageSize;

    fn try_from(size: i64) -> Result<Self, Self::Error> {
        usize::try_from(size)
            .ok()
            .and_then(PageSize::new)
            .ok_or(InvalidPageSize(size))
    }
}

/// Returned when a configured page size is zero or negative.
#[derive(Debug, PartialEq)]
pub struct InvalidPageSize(pub i64);

impl fmt::Display for InvalidPageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "posts_per_page must be a positive integer; found {}",
            self.0
        )
    }
}

impl std::error::Error for InvalidPageSize {}

/// Returns the route for the 1-based listing page `number`: `/` for the first
/// page and `/page/{number}` otherwise.
pub fn list_route(number: usize) -> String {
    match number {
        0 | 1 => String::from("/"),
        n => format!("/page/{}", n),
    }
}

/// A single listing page.
#[derive(Debug, PartialEq)]
pub struct ListPage<'a> {
    /// The 1-based page number.
    pub number: usize,

    /// The total number of listing pages.
    pub total_pages: usize,

    /// The configured number of posts per page.
    pub posts_per_page: usize,

    /// The route at which the page is published.
    pub route: String,

    /// The posts listed on this page, in index order.
    pub posts: &'a [Post],
}

impl ListPage<'_> {
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total_pages
    }

    /// The route of the page before this one (towards newer posts).
    pub fn previous_route(&self) -> Option<String> {
        match self.is_first() {
            true => None,
            false => Some(list_route(self.number - 1)),
        }
    }

    /// The route of the page after this one (towards older posts).
    pub fn next_route(&self) -> Option<String> {
        match self.is_last() {
            true => None,
            false => Some(list_route(self.number + 1)),
        }
    }

    /// Converts a [`ListPage`] into a template-renderable [`Value`] with
    /// fields `route`, `posts`, `number`, `total_pages`, `is_first`,
    /// `is_last`, `previous_route` and `next_route`. The `url`,
    /// `previous_url` and `next_url` fields hold the same routes as served
    /// under `site_root`, for use in links.
    pub fn to_value(&self, site_root: &Url) -> Value {
        let option_to_value = |opt: Option<String>| match opt {
            Some(route) => Value::String(route),
            None => Value::Nil,
        };
        let url = |route: Option<String>| route.map(|r| site_path(site_root, &r));

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("route".to_owned(), Value::String(self.route.clone()));
        m.insert(
            "url".to_owned(),
            Value::String(site_path(site_root, &self.route)),
        );
        m.insert(
            "posts".to_owned(),
            Value::Array(self.posts.iter().map(Post::summarize).collect()),
        );
        m.insert("number".to_owned(), Value::from(self.number as i64));
        m.insert(
            "total_pages".to_owned(),
            Value::from(self.total_pages as i64),
        );
        m.insert("is_first".to_owned(), Value::Bool(self.is_first()));
        m.insert("is_last".to_owned(), Value::Bool(self.is_last()));
        m.insert(
            "previous_route".to_owned(),
            option_to_value(self.previous_route()),
        );
        m.insert("next_route".to_owned(), option_to_value(self.next_route()));
        m.insert(
            "previous_url".to_owned(),
            option_to_value(url(self.previous_route())),
        );
        m.insert(
            "next_url".to_owned(),
            option_to_value(url(self.next_route())),
        );
        Value::Object(m)
    }
}

/// Partitions `index` into listing pages of `page_size` posts. Page `k`
/// (1-based) holds the posts at offsets `[(k-1)*page_size, k*page_size)`.
///
/// An empty index still yields a single, empty first page so the site always
/// has a home page.
pub fn paginate(index: &PostIndex, page_size: PageSize) -> Vec<ListPage<'_>> {
    let posts = index.posts();
    let size = page_size.get();
    let total_pages = match posts.len() {
        0 => 1,
        n => (n + size - 1) / size,
    };

    if posts.is_empty() {
        return vec![ListPage {
            number: 1,
            total_pages,
            posts_per_page: size,
            route: list_route(1),
            posts,
        }];
    }

    posts
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| ListPage {
            number: i + 1,
            total_pages,
            posts_per_page: size,
            route: list_route(i + 1),
            posts: chunk,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture::post;

    fn index_of(count: usize) -> PostIndex {
        PostIndex::build(
            (0..count)
                .map(|i| {
                    // one post per day, counting back from 2021-12-31
                    let date = chrono::NaiveDate::from_ymd_opt(2021, 12, 31)
                        .unwrap()
                        - chrono::Duration::days(i as i64);
                    post(&format!("p{}", i), &date.format("%Y-%m-%d").to_string())
                })
                .collect(),
        )
        .unwrap()
    }

    fn size(n: usize) -> PageSize {
        PageSize::new(n).unwrap()
    }

    #[test]
    fn test_thirteen_posts_six_per_page() {
        let index = index_of(13);
        let pages = paginate(&index, size(6));
        assert_eq!(
            vec![6, 6, 1],
            pages.iter().map(|p| p.posts.len()).collect::<Vec<_>>()
        );
        assert_eq!(
            vec!["/", "/page/2", "/page/3"],
            pages.iter().map(|p| p.route.as_str()).collect::<Vec<_>>()
        );
        assert!(pages.iter().all(|p| p.total_pages == 3));
    }

    #[test]
    fn test_every_post_on_exactly_one_page() {
        for count in 1..=20 {
            for n in 1..=7 {
                let index = index_of(count);
                let pages = paginate(&index, size(n));
                assert_eq!((count + n - 1) / n, pages.len());
                let listed: Vec<&Post> =
                    pages.iter().flat_map(|p| p.posts.iter()).collect();
                let all: Vec<&Post> = index.posts().iter().collect();
                assert_eq!(all, listed);
                for (i, page) in pages.iter().enumerate() {
                    assert_eq!(i + 1, page.number);
                }
            }
        }
    }

    #[test]
    fn test_empty_index_has_one_empty_page() {
        let index = index_of(0);
        for _ in 0..2 {
            let pages = paginate(&index, size(6));
            assert_eq!(1, pages.len());
            assert_eq!("/", pages[0].route);
            assert_eq!(1, pages[0].total_pages);
            assert!(pages[0].posts.is_empty());
            assert!(pages[0].is_first() && pages[0].is_last());
        }
    }

    #[test]
    fn test_exact_multiple() {
        let index = index_of(12);
        let pages = paginate(&index, size(6));
        assert_eq!(2, pages.len());
        assert_eq!(6, pages[1].posts.len());
    }

    #[test]
    fn test_page_links() {
        let index = index_of(13);
        let pages = paginate(&index, size(6));
        assert_eq!(None, pages[0].previous_route());
        assert_eq!(Some(String::from("/page/2")), pages[0].next_route());
        assert_eq!(Some(String::from("/")), pages[1].previous_route());
        assert_eq!(Some(String::from("/page/3")), pages[1].next_route());
        assert_eq!(Some(String::from("/page/2")), pages[2].previous_route());
        assert_eq!(None, pages[2].next_route());
    }

    #[test]
    fn test_urls_under_site_path() {
        let index = index_of(13);
        let pages = paginate(&index, size(6));
        let site_root = Url::parse("https://example.org/blog/").unwrap();
        match pages[1].to_value(&site_root) {
            Value::Object(m) => {
                assert!(matches!(
                    m.get("url"),
                    Some(Value::String(s)) if s == "/blog/page/2"
                ));
                assert!(matches!(
                    m.get("previous_url"),
                    Some(Value::String(s)) if s == "/blog/"
                ));
                assert!(matches!(
                    m.get("next_url"),
                    Some(Value::String(s)) if s == "/blog/page/3"
                ));
                assert!(matches!(
                    m.get("route"),
                    Some(Value::String(s)) if s == "/page/2"
                ));
            }
            _ => panic!("wanted an object"),
        }
        match pages[2].to_value(&site_root) {
            Value::Object(m) => assert!(matches!(m.get("next_url"), Some(Value::Nil))),
            _ => panic!("wanted an object"),
        }
    }

    #[test]
    fn test_page_size_validation() {
        assert_eq!(Ok(size(6)), PageSize::try_from(6));
        assert_eq!(Err(InvalidPageSize(0)), PageSize::try_from(0));
        assert_eq!(Err(InvalidPageSize(-3)), PageSize::try_from(-3));
        assert_eq!(6, PageSize::default().get());
    }

    #[test]
    fn test_page_size_from_yaml() {
        let s: PageSize = serde_yaml::from_str("4").unwrap();
        assert_eq!(4, s.get());
        assert!(serde_yaml::from_str::<PageSize>("0").is_err());
        assert!(serde_yaml::from_str::<PageSize>("-1").is_err());
    }
}
