//! Resolves the recommended-post links shown at the bottom of each post.
//!
//! The naming follows the site's navigation labels rather than chronology:
//! `next` points at the *newer* neighbor and `previous` at the *older* one.

use crate::post::{NeighborRef, Post};
use gtmpl::Value;

/// The recommended-post links for a single post.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    /// The post immediately older than this one, if any.
    pub previous: Option<NeighborRef>,

    /// The post immediately newer than this one, if any.
    pub next: Option<NeighborRef>,
}

/// Returns the [`Neighbors`] of the post at `position` in `posts`, which must
/// be sorted most recent first. The most recent post has no `next` and the
/// oldest has no `previous`. A `position` past the end has neither.
pub fn resolve(posts: &[Post], position: usize) -> Neighbors {
    if position >= posts.len() {
        return Neighbors::default();
    }
    Neighbors {
        previous: posts.get(position + 1).map(Post::neighbor_ref),
        next: position
            .checked_sub(1)
            .and_then(|i| posts.get(i))
            .map(Post::neighbor_ref),
    }
}

impl Neighbors {
    pub(crate) fn insert_into(
        &self,
        m: &mut std::collections::HashMap<String, Value>,
    ) {
        let to_value = |opt: &Option<NeighborRef>| match opt {
            Some(n) => Value::from(n),
            None => Value::Nil,
        };
        m.insert("previous".to_owned(), to_value(&self.previous));
        m.insert("next".to_owned(), to_value(&self.next));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture::post;

    fn sorted() -> Vec<Post> {
        vec![
            post("newest", "2021-03-01"),
            post("middle", "2021-02-01"),
            post("oldest", "2021-01-01"),
        ]
    }

    fn slug(n: &Option<NeighborRef>) -> Option<&str> {
        n.as_ref().map(|n| n.slug.as_str())
    }

    #[test]
    fn test_most_recent_has_no_next() {
        let posts = sorted();
        let n = resolve(&posts, 0);
        assert_eq!(None, slug(&n.next));
        assert_eq!(Some("/middle"), slug(&n.previous));
    }

    #[test]
    fn test_oldest_has_no_previous() {
        let posts = sorted();
        let n = resolve(&posts, 2);
        assert_eq!(Some("/middle"), slug(&n.next));
        assert_eq!(None, slug(&n.previous));
    }

    #[test]
    fn test_every_inner_post_links_both_ways() {
        let posts: Vec<Post> = (1..=9)
            .rev()
            .map(|d| post(&format!("p{}", d), &format!("2021-01-0{}", d)))
            .collect();
        for i in 0..posts.len() {
            let n = resolve(&posts, i);
            if i > 0 {
                assert_eq!(Some(posts[i - 1].neighbor_ref()), n.next);
            } else {
                assert_eq!(None, n.next);
            }
            if i + 1 < posts.len() {
                assert_eq!(Some(posts[i + 1].neighbor_ref()), n.previous);
            } else {
                assert_eq!(None, n.previous);
            }
        }
    }

    #[test]
    fn test_single_post_has_no_neighbors() {
        let posts = vec![post("only", "2021-01-01")];
        assert_eq!(Neighbors::default(), resolve(&posts, 0));
    }

    #[test]
    fn test_out_of_range() {
        let posts = sorted();
        assert_eq!(Neighbors::default(), resolve(&posts, 3));
        assert_eq!(Neighbors::default(), resolve(&[], 0));
    }

    #[test]
    fn test_carries_title() {
        let posts = sorted();
        let n = resolve(&posts, 1);
        assert_eq!(
            Some("Title newest"),
            n.next.as_ref().map(|n| n.title.as_str())
        );
    }
}
