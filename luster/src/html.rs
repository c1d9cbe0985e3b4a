//! Serializes the parsed page back to HTML, applying planned edits on the
//! way out. The tree itself is never mutated.

use std::io::Write;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

use crate::dom::PageEdits;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

// Set union over class tokens, so re-running on already-annotated output
// adds nothing. A multi-token addition like "brush: clojure" is kept as a
// unit: appended whole unless that exact token sequence is already there.
fn merge_classes(existing: &str, added: &[String]) -> String {
    let mut tokens: Vec<String> = existing.split_whitespace().map(str::to_string).collect();
    for class in added {
        let new: Vec<&str> = class.split_whitespace().collect();
        if new.is_empty() {
            continue;
        }
        let present = tokens.len() >= new.len()
            && tokens
                .windows(new.len())
                .any(|w| w.iter().map(String::as_str).eq(new.iter().copied()));
        if !present {
            tokens.extend(new.into_iter().map(str::to_string));
        }
    }
    tokens.join(" ")
}

pub fn write_document(doc: &Html, edits: &PageEdits, out: &mut impl Write) -> std::io::Result<()> {
    for child in doc.tree.root().children() {
        write_node(child, edits, false, out)?;
    }
    Ok(())
}

fn write_node(
    node: NodeRef<Node>,
    edits: &PageEdits,
    raw_text: bool,
    out: &mut impl Write,
) -> std::io::Result<()> {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(child, edits, raw_text, out)?;
            }
        }
        Node::Doctype(doctype) => write!(out, "<!DOCTYPE {}>", doctype.name())?,
        Node::Comment(comment) => write!(out, "<!--{}-->", &*comment.comment)?,
        Node::Text(text) => {
            if raw_text {
                write!(out, "{}", &*text.text)?;
            } else {
                write!(out, "{}", html_escape::encode_text(&*text.text))?;
            }
        }
        Node::ProcessingInstruction(pi) => write!(out, "<?{} {}>", pi.target, pi.data)?,
        Node::Element(element) => {
            let id = node.id();
            let tag = element.name();
            let added = edits.added_classes(id);
            write!(out, "<{tag}")?;
            let mut wrote_class = false;
            for (name, value) in element.attrs() {
                if name == "class" && !added.is_empty() {
                    let merged = merge_classes(value, added);
                    write!(out, " class=\"{}\"", html_escape::encode_quoted_attribute(&merged))?;
                    wrote_class = true;
                } else if value.is_empty() {
                    write!(out, " {name}")?;
                } else {
                    write!(out, " {name}=\"{}\"", html_escape::encode_quoted_attribute(value))?;
                }
            }
            if !added.is_empty() && !wrote_class {
                write!(
                    out,
                    " class=\"{}\"",
                    html_escape::encode_quoted_attribute(&merge_classes("", added))
                )?;
            }
            write!(out, ">")?;
            if VOID_ELEMENTS.contains(&tag) {
                return Ok(());
            }
            if let Some(text) = edits.text_for(id) {
                write!(out, "{}", html_escape::encode_text(text))?;
            } else if let Some(inner) = edits.inner_for(id) {
                write!(out, "{inner}")?;
            } else {
                let raw = RAW_TEXT_ELEMENTS.contains(&tag);
                for child in node.children() {
                    write_node(child, edits, raw, out)?;
                }
            }
            write!(out, "</{tag}>")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::merge_classes;

    #[test]
    fn merge_is_a_union() {
        let added = vec!["brush: clojure".to_string(), "light".to_string()];
        assert_eq!(merge_classes("code", &added), "code brush: clojure light");
        assert_eq!(
            merge_classes("code brush: clojure light", &added),
            "code brush: clojure light"
        );
        assert_eq!(merge_classes("", &added), "brush: clojure light");
    }
}
