//! Tolerant start-tag scanner over HTML documents.
//!
//! Only html5ever's tokenizer runs here, never its tree builder, so tags are
//! reported exactly in source order: nothing is foster-parented out of a
//! table and no start tag is discarded because of where it appears.
//! Malformed markup (unclosed tags, stray quotes, broken attributes) only
//! affects the tag it occurs in.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Attribute map of one start tag (names are lowercase).
pub type TagAttributes = HashMap<String, String>;

#[derive(Debug)]
struct StartTag {
    name: String,
    attrs: TagAttributes,
}

impl From<Tag> for StartTag {
    fn from(tag: Tag) -> Self {
        let attrs = tag
            .attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        Self {
            name: tag.name.to_string(),
            attrs,
        }
    }
}

/// Collects start tags in the order the tokenizer emits them.
#[derive(Default)]
struct StartTagSink {
    tags: RefCell<Vec<StartTag>>,
    errors: Cell<usize>,
}

impl TokenSink for StartTagSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) if tag.kind == TagKind::StartTag => {
                let raw = raw_text_kind(&tag);
                self.tags.borrow_mut().push(StartTag::from(tag));
                if let Some(kind) = raw {
                    return TokenSinkResult::RawData(kind);
                }
            }
            Token::ParseError(_) => self.errors.set(self.errors.get() + 1),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Script and style bodies are opaque text; markup inside them is not a tag.
fn raw_text_kind(tag: &Tag) -> Option<RawKind> {
    if tag.self_closing {
        return None;
    }
    match &*tag.name {
        "script" => Some(RawKind::ScriptData),
        "style" => Some(RawKind::Rawtext),
        _ => None,
    }
}

/// A tokenized document that can be scanned for start tags.
#[derive(Debug)]
pub struct TagScanner {
    tags: Vec<StartTag>,
    errors: usize,
}

impl TagScanner {
    /// Tokenizes `html` with error recovery. Never fails.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let tokenizer = Tokenizer::new(StartTagSink::default(), TokenizerOpts::default());
        let input = BufferQueue::default();
        input.push_back(StrTendril::from_slice(html));
        let _ = tokenizer.feed(&input);
        tokenizer.end();

        let sink = tokenizer.sink;
        Self {
            tags: sink.tags.into_inner(),
            errors: sink.errors.get(),
        }
    }

    /// Number of recoverable tokenizer errors encountered.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Lazily yields the attributes of every `tag` start tag, in source order.
    pub fn start_tags<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = TagAttributes> + 'a {
        self.tags
            .iter()
            .filter(move |start| start.name.eq_ignore_ascii_case(tag))
            .map(|start| start.attrs.clone())
    }

    /// Lazily yields non-empty `href` values of `<a>` tags, in source order.
    pub fn hrefs(&self) -> impl Iterator<Item = String> + '_ {
        self.start_tags("a").filter_map(|mut attrs| {
            attrs
                .remove("href")
                .filter(|href| !href.trim().is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_tags_yields_attributes_in_order() {
        let scanner = TagScanner::parse(
            r#"<p><a href="one.ia.mp4" title="first">1</a><a href="two.ia.mp4">2</a></p>"#,
        );
        let tags: Vec<_> = scanner.start_tags("a").collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].get("href").map(String::as_str), Some("one.ia.mp4"));
        assert_eq!(tags[0].get("title").map(String::as_str), Some("first"));
        assert_eq!(tags[1].get("href").map(String::as_str), Some("two.ia.mp4"));
    }

    #[test]
    fn test_tag_name_match_is_case_insensitive() {
        let scanner = TagScanner::parse(r#"<A HREF="upper.ia.mp4">x</A>"#);
        let hrefs: Vec<_> = scanner.hrefs().collect();
        assert_eq!(hrefs, vec!["upper.ia.mp4"]);
    }

    #[test]
    fn test_malformed_tags_do_not_abort_scan() {
        let html = r#"
            <table><tr><td><a href="first.ia.mp4">first
            <a href="broken.ia.mp4 <<<>
            <div <a href=>"
            </td><td><a href='last.ia.mp4'>last</a>
        "#;
        let scanner = TagScanner::parse(html);
        let hrefs: Vec<_> = scanner.hrefs().collect();
        assert_eq!(hrefs.first().map(String::as_str), Some("first.ia.mp4"));
        assert_eq!(hrefs.last().map(String::as_str), Some("last.ia.mp4"));
        assert!(scanner.error_count() > 0);
    }

    #[test]
    fn test_stray_anchor_in_table_keeps_source_order() {
        let html = r#"<table><tr><td><a href="first.ia.mp4">1</a></td></tr><a href="second.ia.mp4">2</a></table>"#;
        let hrefs: Vec<_> = TagScanner::parse(html).hrefs().collect();
        assert_eq!(hrefs, vec!["first.ia.mp4", "second.ia.mp4"]);
    }

    #[test]
    fn test_anchor_inside_select_is_reported() {
        let html = r#"<select><option>x</option><a href="inselect.ia.mp4">1</a></select><a href="after.ia.mp4">2</a>"#;
        let hrefs: Vec<_> = TagScanner::parse(html).hrefs().collect();
        assert_eq!(hrefs, vec!["inselect.ia.mp4", "after.ia.mp4"]);
    }

    #[test]
    fn test_markup_inside_script_is_not_a_tag() {
        let html = r#"<script>var s = '<a href="fake.ia.mp4">';</script><a href="real.ia.mp4">r</a>"#;
        let hrefs: Vec<_> = TagScanner::parse(html).hrefs().collect();
        assert_eq!(hrefs, vec!["real.ia.mp4"]);
    }

    #[test]
    fn test_anchor_without_href_or_empty_href_is_skipped() {
        let scanner =
            TagScanner::parse(r#"<a name="top">t</a><a href="">e</a><a href="k.ia.mp4">k</a>"#);
        let hrefs: Vec<_> = scanner.hrefs().collect();
        assert_eq!(hrefs, vec!["k.ia.mp4"]);
    }

    #[test]
    fn test_clean_document_has_no_errors() {
        let scanner = TagScanner::parse(r#"<!DOCTYPE html><p><a href="x">x</a></p>"#);
        assert_eq!(scanner.error_count(), 0);
    }
}
