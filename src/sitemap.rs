//! Writes `sitemap.xml` for every planned route.

use crate::plan::SitePlan;
use pulldown_cmark::escape::escape_html;
use std::io::{self, Write};
use url::Url;

/// The file name of the sitemap, relative to the output directory.
pub const SITEMAP_FILE_NAME: &str = "sitemap.xml";

/// Writes a sitemap listing every page in `plan`, with URLs made absolute
/// against `site_root`. Post entries carry their publication date as
/// `<lastmod>`.
pub fn write_sitemap<W: Write>(mut w: W, site_root: &Url, plan: &SitePlan) -> io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#
    )?;
    for page in &plan.list_pages {
        write_url(&mut w, site_root, &page.route, None)?;
    }
    for page in &plan.post_pages {
        let lastmod = page.post.date.format("%Y-%m-%d").to_string();
        write_url(&mut w, site_root, page.route, Some(&lastmod))?;
    }
    writeln!(w, "</urlset>")
}

fn write_url<W: Write>(
    w: &mut W,
    site_root: &Url,
    route: &str,
    lastmod: Option<&str>,
) -> io::Result<()> {
    let loc = site_root
        .join(route.trim_start_matches('/'))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut escaped = String::new();
    escape_html(&mut escaped, loc.as_str())?;

    write!(w, "  <url><loc>{}</loc>", escaped)?;
    if let Some(lastmod) = lastmod {
        write!(w, "<lastmod>{}</lastmod>", lastmod)?;
    }
    writeln!(w, "</url>")
}
