//! Streaming `href` / `src` rewriting over HTML markup.
//!
//! The markup is read with `quick-xml` in lenient mode and written back
//! event by event. Only elements whose link attributes actually change are
//! rebuilt; everything else is copied through untouched.

use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event},
};
use std::borrow::Cow;
use std::io::Cursor;

use crate::utils::html::unescape;

/// Attributes that carry links.
const LINK_ATTRS: &[&[u8]] = &[b"href", b"src"];

/// Rewrite every link attribute in `markup` with `rewrite`.
///
/// Returns `None` when the markup cannot be tokenized; callers keep the
/// original markup in that case.
pub fn rewrite_html<F>(markup: &str, rewrite: F) -> Option<String>
where
    F: Fn(&str) -> Cow<'_, str>,
{
    match try_rewrite(markup, &rewrite) {
        Ok(html) => Some(html),
        Err(e) => {
            crate::debug!("link"; "markup not rewritten: {}", e);
            None
        }
    }
}

fn try_rewrite<F>(markup: &str, rewrite: &F) -> quick_xml::Result<String>
where
    F: Fn(&str) -> Cow<'_, str>,
{
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    config.check_comments = false;

    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(markup.len())));

    loop {
        match reader.read_event()? {
            Event::Start(elem) => match rewrite_element(&elem, rewrite) {
                Some(new) => writer.write_event(Event::Start(new))?,
                None => writer.write_event(Event::Start(elem))?,
            },
            Event::Empty(elem) => match rewrite_element(&elem, rewrite) {
                Some(new) => writer.write_event(Event::Empty(new))?,
                None => writer.write_event(Event::Empty(elem))?,
            },
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Rebuild `elem` with rewritten link attributes, or `None` if no link
/// attribute changed.
fn rewrite_element<F>(elem: &BytesStart<'_>, rewrite: &F) -> Option<BytesStart<'static>>
where
    F: Fn(&str) -> Cow<'_, str>,
{
    let mut changed = false;
    let mut attrs: Vec<(String, String)> = Vec::new();

    for attr in elem.html_attributes().with_checks(false) {
        let attr = attr.ok()?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();

        let is_link = LINK_ATTRS
            .iter()
            .any(|name| attr.key.as_ref().eq_ignore_ascii_case(name));
        if is_link {
            let value = unescape(&raw);
            let new = rewrite(&value);
            if new != value {
                changed = true;
                attrs.push((key, new.into_owned()));
                continue;
            }
        }
        attrs.push((key, unescape(&raw).into_owned()));
    }

    if !changed {
        return None;
    }

    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut new = BytesStart::new(name);
    for (key, value) in &attrs {
        new.push_attribute((key.as_str(), value.as_str()));
    }
    Some(new)
}
