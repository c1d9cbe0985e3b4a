//! luster polishes an HTML page the way a page-load script would have:
//! elements carrying the `timestamp` class get their text rewritten as a
//! readable local date, and `pre.code` blocks are annotated with a brush
//! marker and syntax-highlighted. One linear pass per document, timestamps
//! strictly before highlighting.

use std::io::Write;

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;

pub mod dom;
pub mod highlight;
pub mod html;
pub mod timestamp;

pub use highlight::{HighlightOptions, Highlighter, TreeSitterHighlighter};

lazy_static! {
    static ref CODE_SELECTOR: Selector = Selector::parse("pre.code").unwrap();
}

#[derive(Debug, Error)]
pub enum EnhanceError {
    /// A bundled highlight query failed to load. Fatal: the engine is a
    /// startup dependency, there is nothing to fall back to.
    #[error("highlight queries for {0} failed to load: {1}")]
    HighlighterSetup(&'static str, String),
    #[error("highlighting failed: {0}")]
    Highlight(#[from] tree_sitter_highlight::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    /// Language written into the brush annotation on `pre.code` blocks.
    pub brush: String,
    pub highlight: HighlightOptions,
}

impl EnhanceOptions {
    pub fn new(brush: impl Into<String>, highlight: HighlightOptions) -> Self {
        Self {
            brush: brush.into(),
            highlight,
        }
    }
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            brush: "clojure".into(),
            highlight: HighlightOptions::default(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct EnhanceStats {
    pub timestamps_formatted: usize,
    pub timestamps_skipped: usize,
    pub blocks_annotated: usize,
    pub blocks_highlighted: usize,
}

pub struct Enhancer<H> {
    options: EnhanceOptions,
    highlighter: H,
}

impl Enhancer<TreeSitterHighlighter> {
    pub fn new(options: EnhanceOptions) -> Result<Self, EnhanceError> {
        Ok(Self::with_highlighter(options, TreeSitterHighlighter::new()?))
    }
}

impl<H: Highlighter> Enhancer<H> {
    /// Run with an injected highlighting engine.
    pub fn with_highlighter(options: EnhanceOptions, highlighter: H) -> Self {
        Self {
            options,
            highlighter,
        }
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    /// Enhance one page: format timestamps, then configure, annotate and
    /// render code blocks, then serialize. A page matching neither selector
    /// comes out unchanged.
    pub fn enhance(&mut self, page: &str, out: &mut impl Write) -> Result<EnhanceStats, EnhanceError> {
        let doc = Html::parse_document(page);
        let mut edits = dom::PageEdits::new();
        let mut stats = EnhanceStats::default();

        let (formatted, skipped) = timestamp::format_timestamps(&doc, &mut edits);
        stats.timestamps_formatted = formatted;
        stats.timestamps_skipped = skipped;

        self.highlighter.configure(&self.options.highlight);
        let code_ids = dom::select_ids(&doc, &CODE_SELECTOR);
        for &id in &code_ids {
            self.highlighter.annotate(&mut edits, id, &self.options.brush);
        }
        stats.blocks_annotated = code_ids.len();
        stats.blocks_highlighted = self.highlighter.render_all(&doc, &mut edits)?;

        log::debug!(
            "enhanced page: {} timestamps formatted, {} skipped, {} blocks highlighted",
            stats.timestamps_formatted,
            stats.timestamps_skipped,
            stats.blocks_highlighted
        );

        html::write_document(&doc, &edits, out)?;
        Ok(stats)
    }
}

/// One-shot enhancement with the built-in engine.
pub fn enhance_page(
    page: &str,
    out: &mut impl Write,
    options: EnhanceOptions,
) -> Result<EnhanceStats, EnhanceError> {
    Enhancer::new(options)?.enhance(page, out)
}
