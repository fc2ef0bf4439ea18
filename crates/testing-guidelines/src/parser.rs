/// Parser for the unit-testing guide markdown.
///
/// The markdown is strictly hierarchical:
/// - Document title: `# Title`
/// - Categories: `## Name` ("Table of contents" and "Translations" are skipped,
///   "References"/"Resources" and "Contributors" hold link lists)
/// - Sections: `### Title`, optionally decorated with a leading emoji
/// - Examples: a bold label line (`**Bad**`, `**Good**`, `**Better**` or the guide's
///   `**:(**`, `**:)**`, `**:D**`) followed by a fenced block
///
/// Parser approach: single line-by-line pass, fences consumed whole so their
/// contents are never read as headings or labels. Any structural problem aborts the
/// load; there is no partial corpus.
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::AppError;
use crate::model::{Category, Contributor, Corpus, Example, GuidelineSection, Label, Reference};

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\*\*\s*(bad|good|better|:\(|:\)|:d)\s*:?\s*\*\*\s*:?\s*$")
        .expect("valid regex")
});
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+\.)\s+(.*)$").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));

/// Parse the guide into a [`Corpus`].
pub fn load(source: &str) -> Result<Corpus, AppError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut parser = Parser::new(&lines);
    parser.run()?;

    let digest = format!("{:x}", Sha256::digest(source.as_bytes()));
    debug!(
        sections = parser.sections.len(),
        categories = parser.categories.len(),
        references = parser.references.len(),
        contributors = parser.contributors.len(),
        "parsed guide"
    );

    Ok(Corpus::new(
        parser.title,
        parser.sections,
        parser.categories,
        parser.references,
        parser.contributors,
        digest,
    ))
}

/// Read and parse a guide from disk.
pub fn load_file(path: &Path) -> Result<Corpus, AppError> {
    let content = mcp_common::error::read_source(path)?;
    load(&content)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Before the first `##`, or after a later `#`
    Preamble,
    Skipped,
    Guidelines,
    References,
    Contributors,
}

struct OpenSection {
    title: String,
    line: usize,
    paragraphs: Vec<String>,
    examples: Vec<Example>,
}

struct PendingLabel<'a> {
    label: Label,
    raw: &'a str,
}

struct Fence {
    info: Option<String>,
    /// Index of the closing delimiter line
    close: usize,
}

struct Parser<'a> {
    lines: &'a [&'a str],
    region: Region,
    title: Option<String>,
    sections: Vec<GuidelineSection>,
    categories: Vec<Category>,
    references: Vec<Reference>,
    contributors: Vec<Contributor>,
    /// Index into `categories` for sections opened now
    category: Option<usize>,
    open: Option<OpenSection>,
    paragraph: Vec<&'a str>,
    pending: Option<PendingLabel<'a>>,
}

impl<'a> Parser<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            region: Region::Preamble,
            title: None,
            sections: Vec::new(),
            categories: Vec::new(),
            references: Vec::new(),
            contributors: Vec::new(),
            category: None,
            open: None,
            paragraph: Vec::new(),
            pending: None,
        }
    }

    fn run(&mut self) -> Result<(), AppError> {
        let mut i = 0;
        while i < self.lines.len() {
            let line = self.lines[i];

            if let Some(fence) = self.scan_fence(i)? {
                self.on_fence(i, fence.close, fence.info);
                i = fence.close + 1;
                continue;
            }

            if let Some((level, title)) = parse_heading(line, i + 1)? {
                self.on_heading(level, title, i)?;
            } else if line.trim().is_empty() {
                self.flush_paragraph();
            } else if let Some(label) = parse_label(line) {
                self.on_label(label, line);
            } else {
                self.on_text(line, i + 1)?;
            }
            i += 1;
        }
        self.close_section(self.lines.len())
    }

    /// Detect a fence opening at `start` and find its closing delimiter.
    fn scan_fence(&self, start: usize) -> Result<Option<Fence>, AppError> {
        let Some((marker, width, info)) = fence_opening(self.lines[start]) else {
            return Ok(None);
        };
        let close = self.lines[start + 1..]
            .iter()
            .position(|l| is_fence_close(l, marker, width))
            .map(|offset| start + 1 + offset)
            .ok_or_else(|| AppError::Parse {
                start_line: start + 1,
                end_line: self.lines.len(),
                message: if self.pending.is_some() {
                    "example block has no closing delimiter".to_string()
                } else {
                    "fenced block has no closing delimiter".to_string()
                },
            })?;
        Ok(Some(Fence { info, close }))
    }

    fn on_fence(&mut self, start: usize, close: usize, info: Option<String>) {
        let pending = self.pending.take();
        if self.region != Region::Guidelines || self.open.is_none() {
            return;
        }
        self.flush_paragraph();
        let lines = self.lines;
        let Some(open) = self.open.as_mut() else {
            return;
        };
        match pending {
            Some(p) => open.examples.push(Example {
                label: p.label,
                language: info,
                snippet: lines[start + 1..close].join("\n"),
            }),
            // Unlabeled blocks are kept verbatim as supplementary prose.
            None => open.paragraphs.push(lines[start..=close].join("\n")),
        }
    }

    fn on_heading(&mut self, level: usize, title: String, index: usize) -> Result<(), AppError> {
        self.flush_pending();
        match level {
            1 => {
                self.close_section(index)?;
                if self.title.is_none() {
                    self.title = Some(title);
                }
                self.region = Region::Preamble;
                self.category = None;
            }
            2 => {
                self.close_section(index)?;
                self.category = None;
                self.region = match title.to_lowercase().as_str() {
                    "table of contents" | "translations" => Region::Skipped,
                    "references" | "resources" => Region::References,
                    "contributors" => Region::Contributors,
                    _ => {
                        self.categories.push(Category {
                            anchor: slugify(&title),
                            name: title,
                            section_titles: Vec::new(),
                        });
                        self.category = Some(self.categories.len() - 1);
                        Region::Guidelines
                    }
                };
            }
            3 if matches!(self.region, Region::Guidelines | Region::Preamble) => {
                self.close_section(index)?;
                if self.sections.iter().any(|s| s.title == title) {
                    return Err(AppError::Parse {
                        start_line: index + 1,
                        end_line: index + 1,
                        message: format!("duplicate section title '{title}'"),
                    });
                }
                self.region = Region::Guidelines;
                self.open = Some(OpenSection {
                    title,
                    line: index + 1,
                    paragraphs: Vec::new(),
                    examples: Vec::new(),
                });
            }
            _ if self.open.is_some() => {
                self.flush_paragraph();
                if let Some(open) = self.open.as_mut() {
                    open.paragraphs.push(self.lines[index].trim().to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_label(&mut self, label: Label, raw: &'a str) {
        if self.open.is_none() {
            return;
        }
        self.flush_pending();
        self.flush_paragraph();
        self.pending = Some(PendingLabel { label, raw });
    }

    fn on_text(&mut self, line: &'a str, line_number: usize) -> Result<(), AppError> {
        match self.region {
            Region::Guidelines if self.open.is_some() => {
                if let Some(p) = self.pending.take() {
                    // A label not followed by a fence is ordinary prose.
                    self.paragraph.push(p.raw);
                }
                self.paragraph.push(line.trim_end());
            }
            Region::References => {
                if let Some(item) = list_item(line) {
                    let (title, url, author) = parse_link_item(item, line_number)?;
                    self.references.push(Reference { author, title, url });
                }
            }
            Region::Contributors => {
                if let Some(item) = list_item(line) {
                    let (name, url, _) = parse_link_item(item, line_number)?;
                    self.contributors.push(Contributor { name, url });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n").trim().to_string();
        self.paragraph.clear();
        if let Some(open) = self.open.as_mut() {
            if !text.is_empty() {
                open.paragraphs.push(text);
            }
        }
    }

    fn flush_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.flush_paragraph();
            if let Some(open) = self.open.as_mut() {
                open.paragraphs.push(p.raw.trim().to_string());
            }
        }
    }

    /// Finish the open section. `end` is the 0-based index of the line that ends it.
    fn close_section(&mut self, end: usize) -> Result<(), AppError> {
        self.flush_pending();
        self.flush_paragraph();
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        if open.paragraphs.is_empty() {
            return Err(AppError::Parse {
                start_line: open.line,
                end_line: end.max(open.line),
                message: format!("section '{}' has no rationale", open.title),
            });
        }

        let category = self.category.and_then(|i| self.categories.get_mut(i)).map(|c| {
            c.section_titles.push(open.title.clone());
            c.name.clone()
        });
        self.sections.push(GuidelineSection {
            anchor: slugify(&open.title),
            title: open.title,
            category,
            rationale: open.paragraphs,
            examples: open.examples,
            line: open.line,
        });
        Ok(())
    }
}

/// Returns `(level, title)` for an ATX heading line, `None` for any other line.
fn parse_heading(line: &str, line_number: usize) -> Result<Option<(usize, String)>, AppError> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 {
        return Ok(None);
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        // `#hashtag` is prose, not a heading
        return Ok(None);
    }
    if level > 6 {
        return Err(AppError::Parse {
            start_line: line_number,
            end_line: line_number,
            message: format!("heading level {level} exceeds 6"),
        });
    }
    let title = heading_title(rest);
    if title.is_empty() {
        return Err(AppError::Parse {
            start_line: line_number,
            end_line: line_number,
            message: "heading has no title".to_string(),
        });
    }
    Ok(Some((level, title)))
}

/// Strip the optional closing `#` run and a leading decoration token such as an emoji.
fn heading_title(raw: &str) -> String {
    let mut text = raw.trim();
    let unclosed = text.trim_end_matches('#');
    if unclosed.len() != text.len() && (unclosed.is_empty() || unclosed.ends_with(char::is_whitespace)) {
        text = unclosed.trim_end();
    }
    match text.split_once(char::is_whitespace) {
        Some((first, rest)) if is_decoration(first) => rest.trim_start().to_string(),
        None if is_decoration(text) => String::new(),
        _ => text.to_string(),
    }
}

fn is_decoration(token: &str) -> bool {
    !token
        .chars()
        .any(|c| c.is_alphanumeric() || c.is_ascii_punctuation())
}

fn parse_label(line: &str) -> Option<Label> {
    let caps = LABEL_RE.captures(line)?;
    match caps[1].to_lowercase().as_str() {
        "bad" | ":(" => Some(Label::Bad),
        "good" | ":)" => Some(Label::Good),
        "better" | ":d" => Some(Label::Better),
        _ => None,
    }
}

/// Returns `(marker, width, info)` when `line` opens a fenced block.
fn fence_opening(line: &str) -> Option<(char, usize, Option<String>)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let body = &line[indent..];
    let marker = body.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let width = body.chars().take_while(|c| *c == marker).count();
    if width < 3 {
        return None;
    }
    let info = body[width..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    let info = info.split_whitespace().next().map(str::to_string);
    Some((marker, width, info))
}

fn is_fence_close(line: &str, marker: char, width: usize) -> bool {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        return false;
    }
    let run = body.chars().take_while(|c| *c == marker).count();
    run >= width && body[run * marker.len_utf8()..].trim().is_empty()
}

fn list_item(line: &str) -> Option<&str> {
    LIST_ITEM_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Split a `[text](url)` list item into `(text, url, attribution)`.
fn parse_link_item(
    item: &str,
    line_number: usize,
) -> Result<(String, String, Option<String>), AppError> {
    let caps = LINK_RE.captures(item).ok_or_else(|| AppError::Parse {
        start_line: line_number,
        end_line: line_number,
        message: "list item has no [text](url) link".to_string(),
    })?;
    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let text = caps[1].trim().to_string();
    let url = caps[2].trim().to_string();
    Ok((text, url, attribution(&item[..whole.start], &item[whole.end..])))
}

fn attribution(before: &str, after: &str) -> Option<String> {
    let clean = |s: &str| {
        s.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | ':' | ',' | '*' | '_' | '(' | ')' | '–' | '—')
        })
        .to_string()
    };
    let before = clean(before);
    if !before.is_empty() {
        return Some(before);
    }
    let after = clean(after);
    let author = match after.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => after[3..].trim(),
        _ => after.as_str(),
    };
    (!author.is_empty()).then(|| author.to_string())
}

/// GitHub-style heading anchor.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.trim().chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() {
            out.push('-');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str = include_str!("../fixtures/guide.md");

    #[test]
    fn test_parse_single_section() {
        let content = r#"# Guide

## Guidelines

### Name your tests properly

Tests names should be concise and explicit.

**Bad:**

```js
it('works', () => {});
```

**Good:**

```js
it('returns the sum of two numbers', () => {});
```
"#;
        let corpus = load(content).expect("parses");
        assert_eq!(corpus.title(), Some("Guide"));
        assert_eq!(corpus.len(), 1);

        let s = corpus.find_section("Name your tests properly").expect("present");
        assert_eq!(s.anchor, "name-your-tests-properly");
        assert_eq!(s.category.as_deref(), Some("Guidelines"));
        assert_eq!(s.line, 5);
        assert_eq!(s.rationale, vec!["Tests names should be concise and explicit."]);
        assert_eq!(s.examples.len(), 2);
        assert_eq!(s.examples[0].label, Label::Bad);
        assert_eq!(s.examples[0].language.as_deref(), Some("js"));
        assert_eq!(s.examples[0].snippet, "it('works', () => {});");
        assert_eq!(s.examples[1].label, Label::Good);
    }

    #[test]
    fn test_emoticon_labels_and_decorated_titles() {
        let content = r#"## Guidelines

### ✨ Whenever possible, use TDD

Write the test first.

**:(**

```js
a();
```

**:)**
```js
b();
```

**:D**

~~~
c();
~~~
"#;
        let corpus = load(content).expect("parses");
        let s = corpus
            .find_section("Whenever possible, use TDD")
            .expect("decoration stripped");
        assert_eq!(s.anchor, "whenever-possible-use-tdd");
        let labels: Vec<Label> = s.examples.iter().map(|e| e.label).collect();
        assert_eq!(labels, vec![Label::Bad, Label::Good, Label::Better]);
        assert_eq!(s.examples[2].language, None);
        assert_eq!(s.examples[2].snippet, "c();");
    }

    #[test]
    fn test_unlabeled_block_is_prose() {
        let content = r#"### Use factories

Factories keep tests small.

```js
function createUser() {}
```
"#;
        let corpus = load(content).expect("parses");
        let s = corpus.find_section("Use factories").expect("present");
        assert!(s.examples.is_empty());
        assert_eq!(s.rationale.len(), 2);
        assert_eq!(s.rationale[1], "```js\nfunction createUser() {}\n```");
        assert_eq!(s.category, None);
    }

    #[test]
    fn test_fence_content_is_opaque() {
        let content = r#"### Keep it simple

Shell helpers.

**Good**

```sh
# not a heading
**Bad**
```
"#;
        let corpus = load(content).expect("parses");
        let s = corpus.find_section("Keep it simple").expect("present");
        assert_eq!(s.examples.len(), 1);
        assert_eq!(s.examples[0].snippet, "# not a heading\n**Bad**");
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_label_without_fence_is_prose() {
        let content = r#"### Be explicit

**Good**

Prefer explicit setup.
"#;
        let corpus = load(content).expect("parses");
        let s = corpus.find_section("Be explicit").expect("present");
        assert!(s.examples.is_empty());
        assert_eq!(s.rationale, vec!["**Good**\nPrefer explicit setup."]);
    }

    #[test]
    fn test_unclosed_example_fails() {
        let content = "### Broken\n\nSome text.\n\n**Bad**\n\n```js\nfoo();\n";
        match load(content) {
            Err(AppError::Parse {
                start_line,
                end_line,
                message,
            }) => {
                assert_eq!(start_line, 7);
                assert_eq!(end_line, 8);
                assert!(message.contains("example block"), "got: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_headings_fail() {
        for content in ["### \n\ntext\n", "##\n", "####### Too deep\n", "### ✨\n\ntext\n"] {
            assert!(
                matches!(load(content), Err(AppError::Parse { .. })),
                "expected parse error for {content:?}"
            );
        }
        // `#tag` is prose, not a heading
        assert!(load("#tag\n").is_ok());
    }

    #[test]
    fn test_section_without_rationale_fails() {
        let content = "### Only code\n\n**Bad**\n```js\nx();\n```\n\n### Next\n\ntext\n";
        match load(content) {
            Err(AppError::Parse {
                start_line,
                end_line,
                ..
            }) => {
                assert_eq!(start_line, 1);
                assert_eq!(end_line, 7);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_title_fails() {
        let content = "### Same\n\na\n\n### Same\n\nb\n";
        assert!(matches!(
            load(content),
            Err(AppError::Parse { start_line: 5, .. })
        ));
    }

    #[test]
    fn test_references_and_contributors() {
        let content = r#"## Resources

- [Test Driven Development: By Example](https://example.com/tdd) by Kent Beck
- Martin Fowler: [Mocks Aren't Stubs](https://martinfowler.com/articles/mocksArentStubs.html)
- [Unit Testing](https://example.com/unit)

## Contributors

- [Jane Doe](https://github.com/jane)
"#;
        let corpus = load(content).expect("parses");
        assert!(corpus.is_empty());
        let refs = corpus.references();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].title, "Test Driven Development: By Example");
        assert_eq!(refs[0].author.as_deref(), Some("Kent Beck"));
        assert_eq!(refs[1].author.as_deref(), Some("Martin Fowler"));
        assert_eq!(refs[1].title, "Mocks Aren't Stubs");
        assert_eq!(refs[2].author, None);
        assert_eq!(
            corpus.contributors(),
            &[Contributor {
                name: "Jane Doe".to_string(),
                url: "https://github.com/jane".to_string(),
            }]
        );
    }

    #[test]
    fn test_reference_without_link_fails() {
        let content = "## References\n\n- Some book, no link\n";
        assert!(matches!(
            load(content),
            Err(AppError::Parse { start_line: 3, end_line: 3, .. })
        ));
    }

    #[test]
    fn test_subheadings_stay_in_rationale() {
        let content = "### Parent\n\nIntro.\n\n#### Details\n\nMore.\n";
        let corpus = load(content).expect("parses");
        let s = corpus.find_section("Parent").expect("present");
        assert_eq!(s.rationale, vec!["Intro.", "#### Details", "More."]);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Don't comment out tests"), "dont-comment-out-tests");
        assert_eq!(
            slugify("Whenever possible, use TDD"),
            "whenever-possible-use-tdd"
        );
        assert_eq!(slugify("Test the behaviour, not the internal implementation"), "test-the-behaviour-not-the-internal-implementation");
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let a = load(GUIDE).expect("fixture parses");
        let b = load(GUIDE).expect("fixture parses");
        assert_eq!(a, b);
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_fixture_structure() {
        let corpus = load(GUIDE).expect("fixture parses");
        let names: Vec<&str> = corpus.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["General principles", "Guidelines"]);
        assert!(corpus.len() >= 8);
        assert!(!corpus.references().is_empty());
        assert!(!corpus.contributors().is_empty());
        for section in corpus.list_sections() {
            assert!(!section.rationale.is_empty(), "{} has no rationale", section.title);
        }
    }

    /// Parses the full guide when `TESTING_GUIDELINES_PATH` points at it.
    #[test]
    fn test_parse_real_guide() {
        let config = match crate::config::Config::from_env() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("skipping test_parse_real_guide: {e}");
                return;
            }
        };
        let file = config.guidelines_file_path();

        let corpus = load_file(&file).expect("guide parses");
        assert!(corpus.len() > 20, "expected >20 sections, got {}", corpus.len());
        assert!(corpus.find_section("Avoid logic in your tests").is_ok());
        assert!(corpus.sections_by_label_presence(Label::Bad).count() > 0);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_file(&dir.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, AppError::Common(_)));
    }
}
