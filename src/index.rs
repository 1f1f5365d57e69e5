//! Builds the [`PostIndex`]: every post of a build, most recent first.

use crate::neighbors::{self, Neighbors};
use crate::permalink::Slug;
use crate::post::Post;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// The ordered sequence of all posts in a build.
///
/// Posts are sorted by date, most recent first. Posts with the same date keep
/// the order in which they were handed to [`PostIndex::build`], so the index
/// is a deterministic function of its input.
#[derive(Debug)]
pub struct PostIndex {
    posts: Vec<Post>,
}

impl PostIndex {
    /// Sorts `posts` into an index. Fails if two posts share a slug.
    pub fn build(mut posts: Vec<Post>) -> Result<PostIndex> {
        {
            let mut seen: HashMap<&Slug, &PathBuf> = HashMap::new();
            for post in &posts {
                if let Some(first) = seen.insert(&post.slug, &post.source) {
                    return Err(Error::DuplicateSlug {
                        slug: post.slug.clone(),
                        first: first.clone(),
                        second: post.source.clone(),
                    });
                }
            }
        }

        // `sort_by` is stable, which preserves enumeration order for ties.
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(PostIndex { posts })
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Returns the recommended-post links for the post at `position`. See
    /// [`neighbors::resolve`].
    pub fn neighbors(&self, position: usize) -> Neighbors {
        neighbors::resolve(&self.posts, position)
    }
}

/// The result of building a [`PostIndex`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building a [`PostIndex`].
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when two source files derive the same slug.
    DuplicateSlug {
        slug: Slug,
        first: PathBuf,
        second: PathBuf,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(
                f,
                "'{}' and '{}' both resolve to the route '{}'",
                first.display(),
                second.display(),
                slug
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture::post;

    fn slugs(index: &PostIndex) -> Vec<&str> {
        index.posts().iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_sorted_most_recent_first() -> Result<()> {
        let index = PostIndex::build(vec![
            post("b", "2021-02-01"),
            post("c", "2021-03-01"),
            post("a", "2021-01-01"),
        ])?;
        assert_eq!(vec!["/c", "/b", "/a"], slugs(&index));
        Ok(())
    }

    #[test]
    fn test_ties_keep_enumeration_order() -> Result<()> {
        for _ in 0..3 {
            let index = PostIndex::build(vec![
                post("second", "2021-01-01"),
                post("newest", "2021-05-01"),
                post("first", "2021-01-01"),
                post("third", "2021-01-01"),
            ])?;
            assert_eq!(
                vec!["/newest", "/second", "/first", "/third"],
                slugs(&index)
            );
        }
        Ok(())
    }

    #[test]
    fn test_rebuild_is_identical() -> Result<()> {
        let input = vec![
            post("x", "2020-06-01"),
            post("y", "2020-06-01"),
            post("z", "2019-06-01"),
        ];
        let first = PostIndex::build(input.clone())?;
        let second = PostIndex::build(input)?;
        assert_eq!(first.posts(), second.posts());
        Ok(())
    }

    #[test]
    fn test_duplicate_slug() {
        let mut dup = post("a", "2021-01-01");
        dup.source = PathBuf::from("posts/a/index.md");
        match PostIndex::build(vec![post("a", "2020-01-01"), dup]) {
            Err(Error::DuplicateSlug { slug, first, second }) => {
                assert_eq!("/a", slug.as_str());
                assert_eq!(PathBuf::from("posts/a.md"), first);
                assert_eq!(PathBuf::from("posts/a/index.md"), second);
            }
            other => panic!("wanted DuplicateSlug; found {:?}", other),
        }
    }
}
