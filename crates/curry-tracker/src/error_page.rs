//! Extracts the rejection message from an upload page re-rendered with errors.

use std::borrow::Cow;

use tl::{HTMLTag, Node, NodeHandle, Parser, ParserOptions};

const CONTENT_TAG: &str = "div";
const CONTENT_CLASS: &str = "thin";
const ERROR_STYLE: &str = "color:red";

/// Text of the first red-styled `<p>` directly inside a `div.thin` block.
///
/// Markup inside the paragraph is dropped and entities are decoded. Returns
/// `None` when the page carries no such paragraph.
#[must_use]
pub fn first_error_message(html: &str) -> Option<String> {
    let dom = tl::parse(html, ParserOptions::new()).ok()?;
    find_in(dom.children(), dom.parser())
}

fn find_in(handles: &[NodeHandle], parser: &Parser<'_>) -> Option<String> {
    handles
        .iter()
        .filter_map(|handle| handle.get(parser))
        .filter_map(Node::as_tag)
        .find_map(|tag| {
            if is_content_block(tag)
                && let Some(message) = red_paragraph(tag, parser)
            {
                return Some(message);
            }
            let children = tag.children();
            find_in(&children.top().to_vec(), parser)
        })
}

fn is_content_block(tag: &HTMLTag<'_>) -> bool {
    tag.name().as_utf8_str().eq_ignore_ascii_case(CONTENT_TAG)
        && attribute(tag, "class")
            .is_some_and(|class| class.split_whitespace().any(|name| name == CONTENT_CLASS))
}

fn red_paragraph(block: &HTMLTag<'_>, parser: &Parser<'_>) -> Option<String> {
    let children = block.children();
    children
        .top()
        .to_vec()
        .iter()
        .filter_map(|handle| handle.get(parser))
        .find_map(|node| {
            let tag = node.as_tag()?;
            if !tag.name().as_utf8_str().eq_ignore_ascii_case("p") {
                return None;
            }
            let style: String = attribute(tag, "style")?
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .collect();
            if !style.to_ascii_lowercase().starts_with(ERROR_STYLE) {
                return None;
            }
            let text = node.inner_text(parser);
            let text = html_escape::decode_html_entities(text.trim()).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
}

fn attribute(tag: &HTMLTag<'_>, name: &str) -> Option<String> {
    tag.attributes()
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.map(Cow::into_owned))
}
