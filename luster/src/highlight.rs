//! The highlighting subsystem: a small capability trait the enhancer drives,
//! plus the built-in tree-sitter engine behind it.
//!
//! Activation is three steps with a fixed order: `configure` once per run,
//! `annotate` every targeted block with a brush marker, then `render_all` to
//! process every marked block on the page (including blocks that arrived
//! already marked).

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use ego_tree::NodeId;
use scraper::{Html, Selector};
use tree_sitter_highlight::{HighlightConfiguration, Highlighter as TsHighlighter, HtmlRenderer};

use crate::dom::{self, PageEdits};
use crate::EnhanceError;

lazy_static! {
    static ref PRE_SELECTOR: Selector = Selector::parse("pre").unwrap();
    static ref RE_BRUSH: Regex = Regex::new(r"brush:\s*([A-Za-z0-9_#+-]+)").unwrap();
    // the renderer callback supplies the whole attribute text of each span
    static ref HL_ATTRS: Vec<String> = HL_CLASSES
        .iter()
        .map(|class| format!("class=\"{class}\""))
        .collect();
}

/// Display options, set once per run before any block is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Number the lines of each rendered block.
    pub gutter: bool,
    /// Emit a toolbar placeholder above each rendered block.
    pub toolbar: bool,
    /// Tag rendered blocks with the light theme class.
    pub light: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            gutter: false,
            toolbar: false,
            light: true,
        }
    }
}

pub trait Highlighter {
    /// One-time display configuration, valid for the rest of the run.
    fn configure(&mut self, options: &HighlightOptions);

    /// Mark one element for highlighting without disturbing its classes.
    fn annotate(&self, edits: &mut PageEdits, element: NodeId, language: &str) {
        edits.add_class(element, format!("brush: {language}"));
    }

    /// Render every marked block on the page. Returns how many were rendered.
    fn render_all(&mut self, doc: &Html, edits: &mut PageEdits) -> Result<usize, EnhanceError>;
}

const HL_NAMES: &[&str] = &[
    "attribute",
    "constant",
    "function.builtin",
    "function",
    "keyword",
    "operator",
    "property",
    "punctuation",
    "punctuation.bracket",
    "punctuation.delimiter",
    "string",
    "string.special",
    "tag",
    "type",
    "type.builtin",
    "variable",
    "variable.builtin",
    "variable.parameter",
    "number",
    "comment",
];

const HL_CLASSES: &[&str] = &[
    "attribute",
    "constant",
    "function-builtin",
    "function",
    "keyword",
    "operator",
    "property",
    "punctuation",
    "punctuation-bracket",
    "punctuation-delimiter",
    "string",
    "string-special",
    "tag",
    "type",
    "type-builtin",
    "variable",
    "variable-builtin",
    "variable-parameter",
    "number",
    "comment",
];

/// Built-in engine rendering token spans with tree-sitter grammars.
///
/// Languages without a bundled grammar still render, as escaped plain text
/// inside the usual line spans.
pub struct TreeSitterHighlighter {
    options: HighlightOptions,
    configs: HashMap<&'static str, HighlightConfiguration>,
    aliases: HashMap<&'static str, &'static str>,
}

impl TreeSitterHighlighter {
    pub fn new() -> Result<Self, EnhanceError> {
        let grammars: [(&'static str, tree_sitter::Language, &str); 3] = [
            ("rust", tree_sitter_rust::language(), tree_sitter_rust::HIGHLIGHT_QUERY),
            (
                "javascript",
                tree_sitter_javascript::language(),
                tree_sitter_javascript::HIGHLIGHT_QUERY,
            ),
            ("python", tree_sitter_python::language(), tree_sitter_python::HIGHLIGHT_QUERY),
        ];
        let mut configs = HashMap::new();
        for (name, language, query) in grammars {
            let mut config = HighlightConfiguration::new(language, query, "", "")
                .map_err(|e| EnhanceError::HighlighterSetup(name, format!("{e:?}")))?;
            config.configure(HL_NAMES);
            configs.insert(name, config);
        }
        let aliases = [("js", "javascript"), ("py", "python"), ("rs", "rust")]
            .iter()
            .cloned()
            .collect();
        Ok(Self {
            options: HighlightOptions::default(),
            configs,
            aliases,
        })
    }

    fn highlight_block(&self, code: &str, language: &str) -> Result<String, EnhanceError> {
        let name = self.aliases.get(language).copied().unwrap_or(language);
        let html = match self.configs.get(name) {
            Some(config) => {
                let mut highlighter = TsHighlighter::new();
                let events = highlighter.highlight(config, code.as_bytes(), None, |_| None)?;
                let mut renderer = HtmlRenderer::new();
                renderer.render(events, code.as_bytes(), &|hl| HL_ATTRS[hl.0].as_bytes())?;
                String::from_utf8_lossy(&renderer.html).into_owned()
            }
            None => {
                log::debug!("no grammar for brush {:?}, rendering plain", language);
                html_escape::encode_text(code).to_string()
            }
        };
        Ok(self.wrap_lines(&html))
    }

    fn wrap_lines(&self, html: &str) -> String {
        let mut out = String::new();
        if self.options.toolbar {
            out.push_str("<div class=\"toolbar\"></div>");
        }
        for (number, line) in html.trim_end().split('\n').enumerate() {
            if number > 0 {
                out.push('\n');
            }
            if self.options.gutter {
                out.push_str(&format!("<span class=\"line-number\">{}</span>", number + 1));
            }
            out.push_str("<span class=\"code-line\">");
            out.push_str(line);
            out.push_str("</span>");
        }
        out
    }
}

impl Highlighter for TreeSitterHighlighter {
    fn configure(&mut self, options: &HighlightOptions) {
        self.options = *options;
    }

    fn render_all(&mut self, doc: &Html, edits: &mut PageEdits) -> Result<usize, EnhanceError> {
        let mut rendered = 0;
        for id in dom::select_ids(doc, &PRE_SELECTOR) {
            // brush markers may come from this run's annotations or from the page itself
            let mut effective = dom::class_attr(doc, id).unwrap_or_default().to_string();
            for class in edits.added_classes(id) {
                effective.push(' ');
                effective.push_str(class);
            }
            let Some(caps) = RE_BRUSH.captures(&effective) else {
                continue;
            };
            let language = caps[1].to_string();
            let code = dom::element_text(doc, id);
            let html = self.highlight_block(code.trim_matches('\n'), &language)?;
            if self.options.light {
                edits.add_class(id, "light");
            }
            edits.replace_inner(id, html);
            rendered += 1;
        }
        Ok(rendered)
    }
}
