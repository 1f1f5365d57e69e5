//! Defines the [`Post`] type and its lightweight projections. Posts are
//! produced by [`crate::parser::Parser`] and are immutable for the rest of the
//! build.

use crate::permalink::Slug;
use chrono::NaiveDateTime;
use gtmpl::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Represents a blog post.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The path of the source file relative to the project root. Only used
    /// to derive [`Post::slug`] and to annotate errors.
    pub source: PathBuf,

    /// The canonical URL path of the post, e.g. `/hello-world`.
    pub slug: Slug,

    /// The path at which the post is served, which includes any path of the
    /// site root, e.g. `/blog/hello-world`. Templates link to this.
    pub url: String,

    /// The title of the post.
    pub title: String,

    /// A one-or-two sentence summary, shown on listing pages.
    pub description: String,

    /// The publication timestamp. Posts are ordered by this field.
    pub date: NaiveDateTime,

    /// [`Post::date`] formatted with the configured locale and format.
    pub display_date: String,

    /// The post's category tag.
    pub category: String,

    /// An optional CSS color for the category badge.
    pub background: Option<String>,

    /// An optional hero image. A relative path is resolved against the
    /// post's own URL, so bundle images work from listing pages too.
    pub image: Option<String>,

    /// The estimated reading time in minutes.
    pub read_minutes: u32,

    /// The rendered HTML body.
    pub body: String,
}

impl Post {
    /// Returns the minimal projection of the post used for recommended-post
    /// links.
    pub fn neighbor_ref(&self) -> NeighborRef {
        NeighborRef {
            slug: self.slug.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }

    /// Converts a [`Post`] into a template-renderable [`Value`] for its own
    /// page. The resulting value has fields `slug`, `title`, `description`,
    /// `date`, `category`, `background`, `image`, `read_minutes` and `body`.
    pub fn to_value(&self) -> Value {
        let mut m = self.summary_map();
        m.insert("image".to_owned(), option_to_value(&self.image));
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Converts a [`Post`] into a template-renderable [`Value`] for listing
    /// pages. Unlike [`Post::to_value`], the body is omitted.
    pub fn summarize(&self) -> Value {
        Value::Object(self.summary_map())
    }

    fn summary_map(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(self.slug.to_string()));
        m.insert("url".to_owned(), Value::String(self.url.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert(
            "description".to_owned(),
            Value::String(self.description.clone()),
        );
        m.insert(
            "date".to_owned(),
            Value::String(self.display_date.clone()),
        );
        m.insert("category".to_owned(), Value::String(self.category.clone()));
        m.insert("background".to_owned(), option_to_value(&self.background));
        m.insert(
            "read_minutes".to_owned(),
            Value::from(i64::from(self.read_minutes)),
        );
        m
    }
}

/// A reference to a neighboring post. It carries only what a recommended-post
/// link renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborRef {
    pub slug: Slug,
    pub url: String,
    pub title: String,
}

impl From<&NeighborRef> for Value {
    fn from(n: &NeighborRef) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(n.slug.to_string()));
        m.insert("url".to_owned(), Value::String(n.url.clone()));
        m.insert("title".to_owned(), Value::String(n.title.clone()));
        Value::Object(m)
    }
}

fn option_to_value(opt: &Option<String>) -> Value {
    match opt {
        Some(s) => Value::String(s.clone()),
        None => Value::Nil,
    }
}

/// Helpers for building posts in tests across the crate.
#[cfg(test)]
pub mod fixture {
    use super::*;
    use crate::permalink::{derive_slug, Options};
    use chrono::NaiveDate;
    use std::path::Path;

    /// Builds a post at `posts/{name}.md` dated `date` (`YYYY-MM-DD`).
    pub fn post(name: &str, date: &str) -> Post {
        let source = PathBuf::from(format!("posts/{}.md", name));
        let slug = derive_slug(&source, Path::new("posts"), Options::default()).unwrap();
        Post {
            url: slug.to_string(),
            slug,
            source,
            title: format!("Title {}", name),
            description: String::default(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            display_date: date.to_owned(),
            category: String::from("misc"),
            background: None,
            image: None,
            read_minutes: 1,
            body: String::default(),
        }
    }
}
