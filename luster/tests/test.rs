use std::io::BufWriter;

use regex::Regex;
use scraper::Html;

use luster::dom::PageEdits;
use luster::{
    enhance_page, EnhanceError, EnhanceOptions, EnhanceStats, Enhancer, HighlightOptions,
    Highlighter,
};

fn enhance_default(input: &str) -> (String, EnhanceStats) {
    enhance_with(input, EnhanceOptions::default())
}

fn enhance_with(input: &str, options: EnhanceOptions) -> (String, EnhanceStats) {
    let mut output = BufWriter::new(vec![]);
    let stats = enhance_page(input, &mut output, options).unwrap();
    let html = String::from_utf8(output.into_inner().unwrap()).unwrap();
    (html, stats)
}

#[test]
fn fixture_page() {
    let input = include_str!("../../test.html");
    let (output, stats) = enhance_default(input);

    assert_eq!(stats.timestamps_formatted, 2);
    assert_eq!(stats.timestamps_skipped, 0);
    assert_eq!(stats.blocks_annotated, 2);
    assert_eq!(stats.blocks_highlighted, 2);

    // long date, comma, localized time; exact wall clock depends on the host zone
    let shape = Regex::new(r"\w{3} \w{3} \d{2} \d{4}, \d{1,2}:\d{2}:\d{2} [AP]M").unwrap();
    assert_eq!(shape.find_iter(&output).count(), 2);

    assert!(output.contains(r#"class="code brush: clojure light""#));
    // no bundled clojure grammar: rendered as plain line spans
    assert!(output.contains(r#"<span class="code-line">(defn greet [name]</span>"#));
    assert!(output.contains("notes &amp; observations"));
}

#[test]
fn timestamp_scenario() {
    let input = r#"<span class="timestamp">2023-01-15T10:30:00Z</span>"#;
    let (output, stats) = enhance_default(input);
    assert_eq!(stats.timestamps_formatted, 1);
    let shape =
        Regex::new(r#"<span class="timestamp">\w{3} \w{3} \d{2} \d{4}, \d{1,2}:\d{2}:\d{2} [AP]M</span>"#)
            .unwrap();
    assert!(shape.is_match(&output), "unexpected output: {output}");
}

#[test]
fn unparseable_timestamp_left_alone() {
    let input = r#"<span class="timestamp">soon enough</span><p>soon enough</p>"#;
    let (output, stats) = enhance_default(input);
    assert_eq!(stats.timestamps_formatted, 0);
    assert_eq!(stats.timestamps_skipped, 1);
    assert!(output.contains(r#"<span class="timestamp">soon enough</span>"#));
    assert!(output.contains("<p>soon enough</p>"));
}

#[test]
fn no_targets_is_a_noop() {
    let input = "<!DOCTYPE html><html><head></head><body><p>hi &amp; bye</p></body></html>";
    let (output, stats) = enhance_default(input);
    assert_eq!(stats.timestamps_formatted, 0);
    assert_eq!(stats.timestamps_skipped, 0);
    assert_eq!(stats.blocks_annotated, 0);
    assert_eq!(stats.blocks_highlighted, 0);
    assert_eq!(output, input);
}

#[test]
fn second_run_is_stable() {
    // formatted text does not re-parse, markers are unioned: output settles
    let input = include_str!("../../test.html");
    let (first, _) = enhance_default(input);
    let (second, stats) = enhance_default(&first);
    assert_eq!(stats.timestamps_formatted, 0);
    assert_eq!(stats.timestamps_skipped, 2);
    assert_eq!(first, second);
}

#[test]
fn annotation_is_set_union() {
    let input = r#"<pre class="code important">x</pre>"#;
    let (output, _) = enhance_default(input);
    assert!(output.contains(r#"class="code important brush: clojure light""#));
}

#[test]
fn premarked_block_is_rendered() {
    let input = r#"<pre class="brush: rust">fn main() {}</pre>"#;
    let (output, stats) = enhance_default(input);
    assert_eq!(stats.blocks_annotated, 0);
    assert_eq!(stats.blocks_highlighted, 1);
    assert!(output.contains(r#"class="keyword""#), "no token spans in: {output}");
}

#[test]
fn rust_brush_produces_token_spans() {
    let input = r#"<pre class="code">fn main() {}</pre>"#;
    let options = EnhanceOptions::new("rust", HighlightOptions::default());
    let (output, stats) = enhance_with(input, options);
    assert_eq!(stats.blocks_highlighted, 1);
    // whole span pinned: the renderer must emit a well-formed class attribute
    assert!(
        output.contains(r#"<span class="keyword">fn</span>"#),
        "no token spans in: {output}"
    );
}

#[test]
fn gutter_and_toolbar_options() {
    let input = "<pre class=\"code\">one\ntwo</pre>";
    let options = EnhanceOptions::new(
        "clojure",
        HighlightOptions {
            gutter: true,
            toolbar: true,
            light: false,
        },
    );
    let (output, _) = enhance_with(input, options);
    assert!(output.contains(r#"<div class="toolbar"></div>"#));
    assert!(output.contains(r#"<span class="line-number">1</span>"#));
    assert!(output.contains(r#"<span class="line-number">2</span>"#));
    assert!(!output.contains("light"));
}

#[derive(Default)]
struct CountingHighlighter {
    configured: Vec<HighlightOptions>,
}

impl Highlighter for CountingHighlighter {
    fn configure(&mut self, options: &HighlightOptions) {
        self.configured.push(*options);
    }

    fn render_all(&mut self, _doc: &Html, _edits: &mut PageEdits) -> Result<usize, EnhanceError> {
        Ok(0)
    }
}

#[test]
fn configure_runs_once_per_page() {
    let mut enhancer =
        Enhancer::with_highlighter(EnhanceOptions::default(), CountingHighlighter::default());

    let pages = [
        "<body><p>no blocks</p></body>".to_string(),
        "<body><pre class=\"code\">one</pre></body>".to_string(),
        format!("<body>{}</body>", "<pre class=\"code\">x</pre>".repeat(5)),
    ];
    for (runs, page) in pages.iter().enumerate() {
        let mut output = BufWriter::new(vec![]);
        enhancer.enhance(page, &mut output).unwrap();
        assert_eq!(enhancer.highlighter().configured.len(), runs + 1);
    }
    for options in &enhancer.highlighter().configured {
        assert_eq!(
            *options,
            HighlightOptions {
                gutter: false,
                toolbar: false,
                light: true,
            }
        );
    }
}
