//! The library code for the `folio` static blog generator. A build runs in
//! two phases:
//!
//! 1. Planning: parsing posts from source files on disk ([`crate::parser`]),
//!    ordering them most recent first ([`crate::index`]) and planning every
//!    page of the site ([`crate::plan`]).
//! 2. Emission: rendering the planned pages to disk ([`crate::write`]) along
//!    with the search index ([`crate::search`]) and sitemap
//!    ([`crate::sitemap`]).
//!
//! The first phase is the more involved, and it is entirely in-memory. A post
//! gets its route from its source path ([`crate::permalink`]), the listing is
//! split into fixed-size pages ([`crate::paginate`]) and each post is linked
//! to the posts published immediately before and after it
//! ([`crate::neighbors`]). Any conflict between routes is reported before a
//! single file is written.
//!
//! The second phase is pretty straight-forward: for each page, apply the
//! template (either the post template or the listing template) and write the
//! result to disk.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod index;
pub mod markdown;
pub mod neighbors;
pub mod paginate;
pub mod parser;
pub mod permalink;
pub mod plan;
pub mod post;
pub mod search;
pub mod sitemap;
pub mod write;
