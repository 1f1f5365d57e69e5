//! Converts post markdown into HTML and estimates reading time.
//!
//! Rendering is delegated to [`pulldown_cmark::html::push_html`]; the events
//! are rewritten on the way through so that:
//!
//! * links to other sites open in a new tab,
//! * relative links and images (e.g. `cover.png` in a post bundle) are
//!   resolved against the post's own URL, since post routes have no trailing
//!   slash,
//! * images are lazy-loaded.

use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use std::io;
use url::{ParseError, Position, Url};

/// The reading speed used to estimate [`Rendered::read_minutes`].
const WORDS_PER_MINUTE: f64 = 265.0;

/// The output of [`to_html`].
#[derive(Debug, PartialEq)]
pub struct Rendered {
    pub html: String,

    /// The number of words of text in the document.
    pub words: usize,
}

impl Rendered {
    /// The estimated reading time in whole minutes, never less than one.
    pub fn read_minutes(&self) -> u32 {
        let minutes = (self.words as f64 / WORDS_PER_MINUTE).round() as u32;
        minutes.max(1)
    }
}

/// Converts `markdown` to HTML. `page_url` is the directory-style URL of the
/// page being rendered (e.g. `https://example.org/hello-world/`); it is used
/// to resolve relative links and to tell links to this site apart from
/// external ones.
pub fn to_html(markdown: &str, page_url: &Url) -> io::Result<Rendered> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut converter = EventConverter {
        page_url,
        links: Vec::new(),
        image: None,
        words: 0,
    };
    let mut events = Vec::new();
    for ev in Parser::new_ext(markdown, options) {
        if let Some(ev) = converter.convert(ev)? {
            events.push(ev);
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    Ok(Rendered {
        html: out,
        words: converter.words,
    })
}

/// Rewrites a relative destination (e.g. `cover.png` or `../other`) into a
/// root-relative one against `page_url`. Returns `None` for absolute URLs,
/// root-relative paths and fragments, which are left as written.
pub fn resolve_relative(page_url: &Url, dest: &str) -> Option<String> {
    if dest.starts_with('/') || dest.starts_with('#') {
        return None;
    }
    match Url::parse(dest) {
        Err(ParseError::RelativeUrlWithoutBase) => page_url
            .join(dest)
            .ok()
            .map(|url| url[Position::BeforePath..].to_owned()),
        _ => None,
    }
}

/// An image whose alt text is still being collected.
struct PendingImage<'a> {
    dest: CowStr<'a>,
    title: CowStr<'a>,
    alt: String,
}

struct EventConverter<'u, 'a> {
    page_url: &'u Url,

    /// One entry per open link; `true` if we rendered its opening tag
    /// ourselves and so must also render its closing tag.
    links: Vec<bool>,

    image: Option<PendingImage<'a>>,

    words: usize,
}

impl<'u, 'a> EventConverter<'u, 'a> {
    fn is_external(&self, dest: &str) -> bool {
        match Url::parse(dest) {
            Ok(url) => {
                matches!(url.scheme(), "http" | "https")
                    && url.host_str() != self.page_url.host_str()
            }
            Err(_) => false,
        }
    }

    fn resolve(&self, dest: CowStr<'a>) -> CowStr<'a> {
        match resolve_relative(self.page_url, &dest) {
            Some(resolved) => CowStr::from(resolved),
            None => dest,
        }
    }

    fn convert(&mut self, ev: Event<'a>) -> io::Result<Option<Event<'a>>> {
        if let Some(image) = &mut self.image {
            match ev {
                Event::End(Tag::Image(..)) => {}
                Event::Text(text) | Event::Code(text) => {
                    self.words += text.split_whitespace().count();
                    image.alt.push_str(&text);
                    return Ok(None);
                }
                _ => return Ok(None),
            }
        }

        Ok(Some(match ev {
            Event::Start(Tag::Link(link_type, dest, title))
                if link_type != LinkType::Email && self.is_external(&dest) =>
            {
                self.links.push(true);
                let mut tag = String::from(r#"<a href=""#);
                escape_href(&mut tag, &dest)?;
                if !title.is_empty() {
                    tag.push_str(r#"" title=""#);
                    escape_html(&mut tag, &title)?;
                }
                tag.push_str(r#"" target="_blank" rel="noopener noreferrer">"#);
                Event::Html(CowStr::from(tag))
            }
            Event::Start(Tag::Link(link_type, dest, title)) => {
                self.links.push(false);
                Event::Start(Tag::Link(link_type, self.resolve(dest), title))
            }
            Event::End(Tag::Link(..)) => match self.links.pop() {
                Some(true) => Event::Html(CowStr::Borrowed("</a>")),
                _ => ev,
            },
            Event::Start(Tag::Image(_, dest, title)) => {
                self.image = Some(PendingImage {
                    dest: self.resolve(dest),
                    title,
                    alt: String::new(),
                });
                return Ok(None);
            }
            Event::End(Tag::Image(..)) => match self.image.take() {
                Some(image) => Event::Html(CowStr::from(render_image(&image)?)),
                None => ev,
            },
            Event::Text(ref text) | Event::Code(ref text) => {
                self.words += text.split_whitespace().count();
                ev
            }
            _ => ev,
        }))
    }
}

fn render_image(image: &PendingImage) -> io::Result<String> {
    let mut tag = String::from(r#"<img src=""#);
    escape_href(&mut tag, &image.dest)?;
    tag.push_str(r#"" alt=""#);
    escape_html(&mut tag, &image.alt)?;
    if !image.title.is_empty() {
        tag.push_str(r#"" title=""#);
        escape_html(&mut tag, &image.title)?;
    }
    tag.push_str(r#"" loading="lazy" />"#);
    Ok(tag)
}
