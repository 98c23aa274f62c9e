//! Result extraction from workflow-engine run data.
//!
//! The engine reports per-node output as
//! `{ "<node>": [ { "data": { "main": [ [ { "json": .., "binary": .. } ] ] } } ] }`.
//! None of that shape is guaranteed: every level is probed optionally and
//! anything unexpected is skipped. Extraction never fails; the worst case is
//! `None` or a partially populated [`ExtractionResult`].

use serde::Serialize;
use serde_json::{Map, Value};

/// MIME type identifying the rendered book artifact among binary attachments.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Nodes whose name contains this marker win the book artifact tie-break.
pub const PREFERRED_PDF_NODE: &str = "TOC Service";

const POEM_FIELDS: [&str; 3] = ["title", "poem", "url"];

/// A single generated poem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoemEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Any other fields the workflow attached to the poem, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PoemEntry {
    /// Build an entry from an element of a node's `poems` list, keeping every
    /// field. A bare string is taken as the poem text.
    fn from_listed(value: &Value) -> Self {
        if let Some(text) = value.as_str() {
            return Self {
                poem: Some(text.to_owned()),
                ..Self::default()
            };
        }
        let mut entry = Self::synthesized(value);
        if let Some(object) = value.as_object() {
            entry.extra = object
                .iter()
                .filter(|(key, _)| !POEM_FIELDS.contains(&key.as_str()))
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect();
        }
        entry
    }

    /// Build an entry from a bare output item; only the poem fields survive.
    fn synthesized(value: &Value) -> Self {
        Self {
            title: text_field(value, "title"),
            poem: text_field(value, "poem"),
            url: text_field(value, "url"),
            extra: Map::new(),
        }
    }
}

/// Content located in a workflow run. Computed fresh on every status query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub poems: Vec<PoemEntry>,
    pub chapters: Option<Vec<Value>>,
    pub book_html: Option<String>,
    /// Base64 payload exactly as the engine delivered it.
    pub book_pdf: Option<String>,
    /// Node the result was last attributed to (diagnostic only).
    pub source_node: String,
}

impl ExtractionResult {
    fn new(source_node: &str) -> Self {
        Self {
            poems: Vec::new(),
            chapters: None,
            book_html: None,
            book_pdf: None,
            source_node: source_node.to_owned(),
        }
    }
}

/// Return the `runData` tree of an engine execution object, if present.
pub fn run_data(execution: &Value) -> Option<&Value> {
    execution.pointer("/data/resultData/runData")
}

/// Walk `run_data` and collect poems, chapters and the rendered book.
///
/// Nodes are visited in the order the engine reported them, runs and items
/// in sequence order. Within an item the probes fire in a fixed order:
/// PDF attachments, `bookHtml`/`html`, `chapters`, `poems`, and finally the
/// bare `title`/`poem` fallback, which only fires while no poems have been
/// recorded.
pub fn extract_poems(run_data: Option<&Value>) -> Option<ExtractionResult> {
    let nodes = run_data?.as_object()?;
    let mut result: Option<ExtractionResult> = None;

    for (node_name, runs) in nodes {
        let Some(runs) = runs.as_array() else {
            continue;
        };
        for run in runs {
            let Some(main) = run.pointer("/data/main").and_then(Value::as_array) else {
                continue;
            };
            for output in main {
                let Some(items) = output.as_array() else {
                    continue;
                };
                for item in items {
                    scan_item(node_name, item, items, &mut result);
                }
            }
        }
    }

    result
}

fn scan_item(
    node_name: &str,
    item: &Value,
    group: &[Value],
    result: &mut Option<ExtractionResult>,
) {
    if let Some(binary) = item.get("binary").and_then(Value::as_object) {
        for attachment in binary.values() {
            let Some(data) = pdf_data(attachment) else {
                continue;
            };
            let acc = result.get_or_insert_with(|| ExtractionResult::new(node_name));
            if acc.book_pdf.is_none() || node_name.contains(PREFERRED_PDF_NODE) {
                acc.book_pdf = Some(data.to_owned());
                acc.source_node = node_name.to_owned();
            }
        }
    }

    let Some(json) = item.get("json").filter(|j| j.is_object()) else {
        return;
    };

    if let Some(html) = non_empty_str(json, "bookHtml").or_else(|| non_empty_str(json, "html")) {
        let acc = result.get_or_insert_with(|| ExtractionResult::new(node_name));
        acc.book_html = Some(html.to_owned());
    }

    if let Some(chapters) = json.get("chapters").and_then(Value::as_array) {
        let acc = result.get_or_insert_with(|| ExtractionResult::new(node_name));
        acc.chapters = Some(chapters.clone());
    }

    if let Some(poems) = json.get("poems").and_then(Value::as_array) {
        let acc = result.get_or_insert_with(|| ExtractionResult::new(node_name));
        acc.poems = poems.iter().map(PoemEntry::from_listed).collect();
        acc.source_node = node_name.to_owned();
    }

    let has_poems = result.as_ref().is_some_and(|r| !r.poems.is_empty());
    if !has_poems && (is_truthy(json.get("title")) || is_truthy(json.get("poem"))) {
        let acc = result.get_or_insert_with(|| ExtractionResult::new(node_name));
        acc.poems = group
            .iter()
            .filter_map(|it| it.get("json"))
            .filter(|j| j.is_object())
            .map(PoemEntry::synthesized)
            .collect();
        acc.source_node = node_name.to_owned();
    }
}

/// Find the URL that resumes a paused execution.
///
/// A top-level `resumeUrl` on the execution short-circuits. Otherwise every
/// run of every node is checked, in order, for `executionData.resumeUrl`,
/// `executionData.waitUrl` and `data.wait.url`; the first hit wins.
pub fn find_resume_url(execution: &Value) -> Option<String> {
    if let Some(url) = non_empty_str(execution, "resumeUrl") {
        return Some(url.to_owned());
    }

    let nodes = run_data(execution)?.as_object()?;
    nodes
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .find_map(|run| {
            ["/executionData/resumeUrl", "/executionData/waitUrl", "/data/wait/url"]
                .into_iter()
                .find_map(|path| {
                    run.pointer(path)
                        .and_then(Value::as_str)
                        .filter(|url| !url.is_empty())
                })
        })
        .map(str::to_owned)
}

// ---- private helpers ----

/// Inline data of an attachment declared as a PDF.
fn pdf_data(attachment: &Value) -> Option<&str> {
    if attachment.get("mimeType").and_then(Value::as_str) != Some(PDF_MIME_TYPE) {
        return None;
    }
    attachment
        .get("data")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Scalar field rendered as text; objects, arrays and null are dropped.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Wrap items as the single output group of a single run.
    fn node(items: Value) -> Value {
        json!([{ "data": { "main": [items] } }])
    }

    fn pdf_item(data: &str) -> Value {
        json!({ "binary": { "file": { "mimeType": "application/pdf", "data": data } } })
    }

    #[test]
    fn test_absent_run_data_returns_none() {
        assert_eq!(extract_poems(None), None);
        assert_eq!(extract_poems(Some(&json!(null))), None);
        assert_eq!(extract_poems(Some(&json!([1, 2]))), None);
    }

    #[test]
    fn test_runs_without_main_sequence_return_none() {
        let run_data = json!({
            "A": [{ "data": {} }],
            "B": [{ "data": { "main": "not a list" } }],
            "C": [{ "startTime": 1 }],
            "D": "not a list",
            "E": [null, 3]
        });
        assert_eq!(extract_poems(Some(&run_data)), None);
    }

    #[test]
    fn test_poems_list_is_extracted() {
        let run_data = json!({
            "NodeA": [{ "data": { "main": [[{ "json": { "poems": [{ "title": "T1", "poem": "P1" }] } }]] } }]
        });

        let result = extract_poems(Some(&run_data)).expect("result expected");
        assert_eq!(
            result.poems,
            vec![PoemEntry {
                title: Some("T1".into()),
                poem: Some("P1".into()),
                ..PoemEntry::default()
            }]
        );
        assert_eq!(result.source_node, "NodeA");
        assert_eq!(result.chapters, None);
        assert_eq!(result.book_html, None);
        assert_eq!(result.book_pdf, None);

        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized["poems"], json!([{ "title": "T1", "poem": "P1" }]));
        assert_eq!(serialized["sourceNode"], "NodeA");
    }

    #[test]
    fn test_listed_poems_keep_extra_fields() {
        let run_data = json!({
            "NodeA": [{ "data": { "main": [[{ "json": { "poems": [
                { "title": "T1", "poem": "P1", "mood": "wistful", "lines": 4 }
            ] } }]] } }]
        });

        let result = extract_poems(Some(&run_data)).expect("result expected");
        assert_eq!(result.poems[0].title.as_deref(), Some("T1"));
        assert_eq!(result.poems[0].extra["mood"], "wistful");

        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(
            serialized["poems"],
            json!([{ "title": "T1", "poem": "P1", "mood": "wistful", "lines": 4 }])
        );
    }

    #[test]
    fn test_bare_items_fall_back_to_synthesized_poems() {
        let run_data = json!({
            "Writer": node(json!([
                { "json": { "title": "X", "poem": "Y" } },
                { "json": { "title": "Z", "url": "https://example.com/z" } },
                { "binary": {} }
            ]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.poems.len(), 2);
        assert_eq!(result.poems[0].title.as_deref(), Some("X"));
        assert_eq!(result.poems[0].poem.as_deref(), Some("Y"));
        assert_eq!(result.poems[0].url, None);
        assert_eq!(result.poems[1].url.as_deref(), Some("https://example.com/z"));
        assert_eq!(result.source_node, "Writer");
    }

    #[test]
    fn test_fallback_never_overrides_poems_list() {
        let run_data = json!({
            "Collector": node(json!([{ "json": { "poems": [{ "title": "Real" }] } }])),
            "Formatter": node(json!([{ "json": { "title": "Stray", "poem": "Line" } }]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.poems.len(), 1);
        assert_eq!(result.poems[0].title.as_deref(), Some("Real"));
        assert_eq!(result.source_node, "Collector");
    }

    #[test]
    fn test_poems_list_replaces_earlier_fallback() {
        let run_data = json!({
            "Draft": node(json!([{ "json": { "title": "Draft", "poem": "..." } }])),
            "Final": node(json!([{ "json": { "poems": [{ "title": "A" }, { "title": "B" }] } }]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.poems.len(), 2);
        assert_eq!(result.source_node, "Final");
    }

    #[test]
    fn test_first_fallback_wins_over_later_bare_items() {
        let run_data = json!({
            "First": node(json!([{ "json": { "title": "One" } }])),
            "Second": node(json!([{ "json": { "title": "Two" } }]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.poems[0].title.as_deref(), Some("One"));
        assert_eq!(result.source_node, "First");
    }

    #[test]
    fn test_toc_service_pdf_wins_when_scanned_first() {
        let run_data = json!({
            "TOC Service": node(json!([pdf_item("toc-pdf")])),
            "Renderer": node(json!([pdf_item("plain-pdf")]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.book_pdf.as_deref(), Some("toc-pdf"));
        assert_eq!(result.source_node, "TOC Service");
    }

    #[test]
    fn test_toc_service_pdf_wins_when_scanned_last() {
        let run_data = json!({
            "Renderer": node(json!([pdf_item("plain-pdf")])),
            "Build TOC Service v2": node(json!([pdf_item("toc-pdf")]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.book_pdf.as_deref(), Some("toc-pdf"));
        assert_eq!(result.source_node, "Build TOC Service v2");
    }

    #[test]
    fn test_first_pdf_wins_without_toc_node() {
        let run_data = json!({
            "Renderer A": node(json!([pdf_item("a")])),
            "Renderer B": node(json!([pdf_item("b")]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.book_pdf.as_deref(), Some("a"));
        assert_eq!(result.source_node, "Renderer A");
    }

    #[test]
    fn test_non_pdf_and_empty_attachments_are_ignored() {
        let run_data = json!({
            "Images": node(json!([
                { "binary": { "img": { "mimeType": "image/png", "data": "abc" } } },
                { "binary": { "doc": { "mimeType": "application/pdf", "data": "" } } },
                { "binary": { "doc": { "mimeType": "application/pdf" } } },
                { "binary": { "odd": null } }
            ]))
        });

        assert_eq!(extract_poems(Some(&run_data)), None);
    }

    #[test]
    fn test_book_html_and_chapters_last_writer_wins() {
        let run_data = json!({
            "Layout": node(json!([{ "json": { "html": "<p>first</p>", "chapters": [{ "n": 1 }] } }])),
            "Book": node(json!([{ "json": { "bookHtml": "<p>second</p>", "chapters": [{ "n": 2 }, { "n": 3 }] } }]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.book_html.as_deref(), Some("<p>second</p>"));
        assert_eq!(result.chapters, Some(vec![json!({ "n": 2 }), json!({ "n": 3 })]));
        assert!(result.poems.is_empty());
        // Allocation attributes the result to the first matching node.
        assert_eq!(result.source_node, "Layout");
    }

    #[test]
    fn test_book_html_preferred_over_html_in_same_item() {
        let run_data = json!({
            "Book": node(json!([{ "json": { "bookHtml": "<main/>", "html": "<div/>" } }]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.book_html.as_deref(), Some("<main/>"));
    }

    #[test]
    fn test_non_sequence_fields_are_skipped() {
        let run_data = json!({
            "Weird": node(json!([
                { "json": { "poems": "nope", "chapters": { "a": 1 } } },
                { "json": null },
                "string item",
                7
            ]))
        });

        assert_eq!(extract_poems(Some(&run_data)), None);
    }

    #[test]
    fn test_binary_and_json_accumulate_into_one_result() {
        let run_data = json!({
            "Poet": node(json!([{ "json": { "poems": [{ "title": "A" }] } }])),
            "TOC Service": node(json!([{
                "json": { "bookHtml": "<h1>Book</h1>" },
                "binary": { "data": { "mimeType": "application/pdf", "data": "JVBERi0x" } }
            }]))
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.poems.len(), 1);
        assert_eq!(result.book_html.as_deref(), Some("<h1>Book</h1>"));
        assert_eq!(result.book_pdf.as_deref(), Some("JVBERi0x"));
        assert_eq!(result.source_node, "TOC Service");
    }

    #[test]
    fn test_multiple_outputs_and_runs_are_scanned() {
        let run_data = json!({
            "Split": [
                { "data": { "main": [[], "skip", [{ "json": { "chapters": [1] } }]] } },
                { "data": { "main": [[{ "json": { "poems": ["plain text poem"] } }]] } }
            ]
        });

        let result = extract_poems(Some(&run_data)).unwrap();
        assert_eq!(result.chapters, Some(vec![json!(1)]));
        assert_eq!(result.poems[0].poem.as_deref(), Some("plain text poem"));
    }

    #[test]
    fn test_resume_url_direct_field_short_circuits() {
        let execution = json!({
            "resumeUrl": "https://engine/direct",
            "data": { "resultData": { "runData": {
                "Wait": [{ "executionData": { "resumeUrl": "https://engine/nested" } }]
            } } }
        });

        assert_eq!(
            find_resume_url(&execution).as_deref(),
            Some("https://engine/direct")
        );
    }

    #[test]
    fn test_resume_url_probes_in_order_per_run() {
        let execution = json!({
            "data": { "resultData": { "runData": {
                "Start": [{ "data": { "main": [] } }],
                "Wait": [{
                    "data": { "wait": { "url": "https://engine/wait-object" } },
                    "executionData": { "waitUrl": "https://engine/wait-url" }
                }],
                "Later": [{ "executionData": { "resumeUrl": "https://engine/later" } }]
            } } }
        });

        assert_eq!(
            find_resume_url(&execution).as_deref(),
            Some("https://engine/wait-url")
        );
    }

    #[test]
    fn test_resume_url_from_wait_object() {
        let execution = json!({
            "resumeUrl": "",
            "data": { "resultData": { "runData": {
                "Wait": [{ "data": { "wait": { "url": "https://engine/w" } } }]
            } } }
        });

        assert_eq!(find_resume_url(&execution).as_deref(), Some("https://engine/w"));
    }

    #[test]
    fn test_empty_resume_url_falls_through_to_wait_url() {
        let execution = json!({
            "data": { "resultData": { "runData": {
                "Wait": [{ "executionData": { "resumeUrl": "", "waitUrl": "https://engine/wu" } }]
            } } }
        });

        assert_eq!(find_resume_url(&execution).as_deref(), Some("https://engine/wu"));
    }

    #[test]
    fn test_resume_url_absent() {
        assert_eq!(find_resume_url(&json!({})), None);
        assert_eq!(find_resume_url(&json!({ "data": { "resultData": {} } })), None);
        assert_eq!(
            find_resume_url(&json!({ "data": { "resultData": { "runData": { "A": "x" } } } })),
            None
        );
    }
}
