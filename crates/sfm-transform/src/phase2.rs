//! Phase 2: in-field markers and whitespace.
//!
//! Inline markers such as `|bd{bold}` become
//! `<span type="bold" style="Strong">bold</span>` children of the field.

use sfm_model::InFieldMarker;
use sfm_schema::xml::{XmlElement, XmlNode};

use crate::context::ImportContext;
use crate::phase1::FIELD;

pub const SPAN: &str = "span";

/// Rewrite every field of the document in place.
pub fn apply(root: &mut XmlElement, ctx: &ImportContext<'_>) {
    let mut markers: Vec<&InFieldMarker> = ctx
        .descriptor
        .in_field_markers
        .iter()
        .filter(|ifm| !ifm.begin.is_empty())
        .collect();
    // Longest begin token wins when one is a prefix of another.
    markers.sort_by_key(|ifm| std::cmp::Reverse(ifm.begin.len()));
    let mut spans = 0;
    rewrite(root, &markers, &mut spans);
    tracing::info!(spans, "phase 2 expanded in-field markers");
}

fn rewrite(element: &mut XmlElement, markers: &[&InFieldMarker], spans: &mut usize) {
    if element.name == FIELD {
        let text = normalize_whitespace(&element.text());
        element.children = split_spans(&text, markers, spans);
        return;
    }
    for child in element.elements_mut() {
        rewrite(child, markers, spans);
    }
}

/// Collapse runs of whitespace, including continuation line breaks, to a
/// single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_spans(text: &str, markers: &[&InFieldMarker], spans: &mut usize) -> Vec<XmlNode> {
    let mut holder = XmlElement::new(FIELD);
    let mut rest = text;
    let mut plain = String::new();

    while !rest.is_empty() {
        let found = markers
            .iter()
            .find(|ifm| rest.starts_with(ifm.begin.as_str()))
            .and_then(|ifm| close_span(&rest[ifm.begin.len()..], ifm).map(|end| (*ifm, end)));
        let Some((ifm, (content_len, consumed))) = found else {
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                plain.push(ch);
            }
            rest = chars.as_str();
            continue;
        };

        let after_begin = &rest[ifm.begin.len()..];
        let content = &after_begin[..content_len];
        if ifm.ignore {
            plain.push_str(content);
        } else {
            holder.push_text(std::mem::take(&mut plain));
            let mut span = XmlElement::new(SPAN).with_attr("type", ifm.element.as_str());
            if let Some(lang) = &ifm.language {
                span.set_attr("lang", lang.as_str());
            }
            if let Some(style) = &ifm.style {
                span.set_attr("style", style.as_str());
            }
            span.push_text(content);
            holder.push(span);
            *spans += 1;
        }
        rest = &after_begin[consumed..];
    }
    holder.push_text(plain);
    holder.children
}

/// Locate the end of a span starting at `text`.
///
/// Returns the content length and the number of bytes consumed including
/// any end token, or `None` when the span never closes.
fn close_span(text: &str, ifm: &InFieldMarker) -> Option<(usize, usize)> {
    let mut candidates: Vec<(usize, usize)> = ifm
        .end
        .iter()
        .filter(|end| !end.is_empty())
        .filter_map(|end| text.find(end.as_str()).map(|pos| (pos, pos + end.len())))
        .collect();
    if ifm.end_with_word {
        let pos = text.find(char::is_whitespace).unwrap_or(text.len());
        candidates.push((pos, pos));
    }
    if let Some(nearest) = candidates.into_iter().min_by_key(|(pos, _)| *pos) {
        return Some(nearest);
    }
    (ifm.end_with_field || ifm.end.is_empty()).then_some((text.len(), text.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ifm(begin: &str, end: &[&str]) -> InFieldMarker {
        InFieldMarker {
            element: "bold".to_string(),
            begin: begin.to_string(),
            end: end.iter().map(|e| e.to_string()).collect(),
            end_with_word: false,
            end_with_field: false,
            language: None,
            style: Some("Strong".to_string()),
            ignore: false,
        }
    }

    fn render(nodes: &[XmlNode]) -> String {
        nodes
            .iter()
            .map(|node| match node {
                XmlNode::Text(text) => text.clone(),
                XmlNode::Element(span) => format!("[{}]", span.text()),
            })
            .collect()
    }

    #[test]
    fn explicit_end_tokens_close_spans() {
        let bold = ifm("|bd{", &["}"]);
        let nodes = split_spans("a |bd{big} fish", &[&bold], &mut 0);
        assert_eq!(render(&nodes), "a [big] fish");
    }

    #[test]
    fn word_end_and_field_end() {
        let mut word = ifm("*", &[]);
        word.end_with_word = true;
        assert_eq!(render(&split_spans("a *big fish", &[&word], &mut 0)), "a [big] fish");

        let mut field = ifm("|i{", &["}"]);
        field.end_with_field = true;
        assert_eq!(render(&split_spans("a |i{open", &[&field], &mut 0)), "a [open]");
    }

    #[test]
    fn unclosed_begin_stays_literal() {
        let bold = ifm("|bd{", &["}"]);
        assert_eq!(render(&split_spans("a |bd{b", &[&bold], &mut 0)), "a |bd{b");
    }

    #[test]
    fn ignored_markers_are_stripped() {
        let mut fv = ifm("|fv{", &["}"]);
        fv.ignore = true;
        let nodes = split_spans("see |fv{kala} here", &[&fv], &mut 0);
        assert_eq!(nodes, vec![XmlNode::Text("see kala here".to_string())]);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_whitespace("  big\n  fish\t too "), "big fish too");
    }
}
