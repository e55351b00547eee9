//! Body markup rendering
//!
//! Markdown goes through pulldown-cmark with GFM extensions. Both Markdown
//! and HTML bodies understand Liquid-style block tags written on their own
//! line:
//!
//! ```text
//! {% highlight clojure %}
//! (deftest adds (is (= 2 (+ 1 1))))
//! {% endhighlight %}
//!
//! {% raw %}
//! literal {% text %}
//! {% endraw %}
//! ```
//!
//! Highlight blocks are extracted before markdown parsing and restored
//! afterwards as `<pre><code>` so their contents are never reinterpreted.
//! Tags inside fenced or indented code are left alone, as is anything that
//! merely looks like a tag in the middle of a paragraph line.

use pulldown_cmark::{html::push_html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::error::{FolioError, FolioResult};
use crate::models::{Document, MarkupFormat};
use crate::permalink::slugify;

const PLACEHOLDER_PREFIX: &str = "<!-- FOLIO_BLOCK_";

/// Render a document body to HTML.
pub fn render_body(doc: &Document) -> FolioResult<String> {
    render_markup(&doc.body, doc.format, &doc.id)
}

/// Render markup text; `document` is used in error messages only.
pub fn render_markup(body: &str, format: MarkupFormat, document: &str) -> FolioResult<String> {
    let (processed, blocks) = extract_blocks(body, format, document)?;

    let mut html = match format {
        MarkupFormat::Markdown => render_markdown(&processed),
        MarkupFormat::Html => processed,
    };

    restore_blocks(&mut html, &blocks);
    Ok(html)
}

/// Render CommonMark + GFM to HTML with heading anchors.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES;

    let parser = Parser::new_ext(content, options);
    let events = inject_heading_ids(parser);

    let mut html = String::with_capacity(content.len() * 2);
    push_html(&mut html, events.into_iter());
    html
}

/// Render a code block exactly as a fenced block would be rendered.
fn render_code_block(lang: &str, code: &str) -> String {
    let fence = "`".repeat(longest_backtick_run(code).max(2) + 1);
    let markdown = format!("{fence}{lang}\n{code}\n{fence}\n");
    let mut html = String::new();
    push_html(&mut html, Parser::new(&markdown));
    format!("<figure class=\"highlight\">{}</figure>", html.trim_end())
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// A `{% name args %}` tag occupying a whole line.
#[derive(Debug, PartialEq)]
struct BlockTag<'a> {
    name: &'a str,
    args: Vec<&'a str>,
}

fn parse_tag_line(line: &str) -> Option<BlockTag<'_>> {
    // four spaces of indentation is an indented code block in markdown
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent >= 4 || line.starts_with('\t') {
        return None;
    }
    let inner = line
        .trim()
        .strip_prefix("{%")?
        .strip_suffix("%}")?
        .trim_start_matches('-')
        .trim_end_matches('-')
        .trim();
    // a second tag on the same line makes the whole line text
    if inner.contains("%}") || inner.contains("{%") {
        return None;
    }
    let mut words = inner.split_whitespace();
    let name = words.next()?;
    Some(BlockTag {
        name,
        args: words.collect(),
    })
}

fn is_fence(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() >= 4 {
        return None;
    }
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn valid_language(lang: &str) -> bool {
    !lang.is_empty()
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.' | '#'))
}

/// Replace block tags with placeholders, returning the rewritten text and
/// the rendered HTML for each placeholder.
fn extract_blocks(
    body: &str,
    format: MarkupFormat,
    document: &str,
) -> FolioResult<(String, Vec<String>)> {
    let error = |line: usize, message: String| FolioError::Markup {
        document: document.to_string(),
        line,
        message,
    };

    let mut out = String::with_capacity(body.len());
    let mut blocks: Vec<String> = Vec::new();
    let mut open_fence: Option<&'static str> = None;
    let mut lines = body.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((line_no, line)) = lines.next() {
        if format == MarkupFormat::Markdown && track_fence(&mut open_fence, line) {
            push_line(&mut out, line);
            continue;
        }

        let Some(tag) = parse_tag_line(line) else {
            push_line(&mut out, line);
            continue;
        };

        match tag.name {
            "highlight" => {
                let lang = tag.args.first().copied().unwrap_or_default();
                if lang.is_empty() {
                    return Err(error(line_no, "highlight tag requires a language".into()));
                }
                if !valid_language(lang) {
                    return Err(error(line_no, format!("invalid highlight language '{lang}'")));
                }
                let code = collect_until(&mut lines, "endhighlight")
                    .ok_or_else(|| error(line_no, "unterminated {% highlight %} block".into()))?;
                out.push_str(&placeholder(blocks.len()));
                blocks.push(render_code_block(lang, &code));
            }
            "raw" => {
                let raw = collect_until(&mut lines, "endraw")
                    .ok_or_else(|| error(line_no, "unterminated {% raw %} block".into()))?;
                if !raw.is_empty() {
                    if format == MarkupFormat::Markdown {
                        for raw_line in raw.lines() {
                            track_fence(&mut open_fence, raw_line);
                        }
                    }
                    push_line(&mut out, &raw);
                }
            }
            "endhighlight" | "endraw" => {
                return Err(error(line_no, format!("unexpected {{% {} %}}", tag.name)));
            }
            other => {
                return Err(error(line_no, format!("unknown tag '{other}'")));
            }
        }
    }

    if let Some(fence) = open_fence {
        // CommonMark closes an unterminated fence at end of document; keep
        // that behaviour but say so
        tracing::debug!(document, fence, "fenced code block runs to end of body");
    }

    Ok((out, blocks))
}

/// Update fence state for `line`; true when the line is fenced code or a
/// fence delimiter.
fn track_fence(open_fence: &mut Option<&'static str>, line: &str) -> bool {
    if let Some(fence) = *open_fence {
        if line.trim_start().starts_with(fence) {
            *open_fence = None;
        }
        return true;
    }
    if let Some(fence) = is_fence(line) {
        *open_fence = Some(fence);
        return true;
    }
    false
}

/// Consume lines up to the closing tag; `None` if the body ends first.
fn collect_until<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    closing: &str,
) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    for (_, line) in lines.by_ref() {
        if parse_tag_line(line).map(|t| t.name == closing).unwrap_or(false) {
            return Some(collected.join("\n"));
        }
        collected.push(line);
    }
    None
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Placeholder as its own HTML block (CommonMark type 2) so pulldown-cmark
/// passes it through untouched.
fn placeholder(index: usize) -> String {
    format!("\n{PLACEHOLDER_PREFIX}{index} -->\n\n")
}

fn restore_blocks(html: &mut String, blocks: &[String]) {
    for (i, block) in blocks.iter().enumerate() {
        let marker = format!("{PLACEHOLDER_PREFIX}{i} -->");
        match html.find(&marker) {
            Some(pos) => html.replace_range(pos..pos + marker.len(), block),
            None => tracing::warn!(block = i, "highlight block placeholder not found in output"),
        }
    }
}

/// Give every heading an `id` derived from its text, deduplicated per page.
fn inject_heading_ids<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events: Vec<Event<'a>> = Vec::new();
    let mut used: Vec<String> = Vec::new();
    let mut in_heading: Option<HeadingLevel> = None;
    let mut heading_text = String::new();
    let mut heading_events: Vec<Event<'a>> = Vec::new();

    for event in parser {
        match &event {
            Event::Start(Tag::Heading { level, id: None, .. }) => {
                in_heading = Some(*level);
                heading_text.clear();
                heading_events.clear();
                heading_events.push(event);
            }
            Event::End(TagEnd::Heading(level)) if in_heading == Some(*level) => {
                let mut slug = slugify(&heading_text);
                if !slug.is_empty() {
                    let base = slug.clone();
                    let mut n = 1;
                    while used.contains(&slug) {
                        slug = format!("{base}-{n}");
                        n += 1;
                    }
                    used.push(slug.clone());
                    if let Some(Event::Start(Tag::Heading { id, .. })) = heading_events.first_mut()
                    {
                        *id = Some(CowStr::from(slug));
                    }
                }
                events.append(&mut heading_events);
                events.push(event);
                in_heading = None;
            }
            Event::Text(text) | Event::Code(text) if in_heading.is_some() => {
                heading_text.push_str(text);
                heading_events.push(event);
            }
            _ if in_heading.is_some() => heading_events.push(event),
            _ => events.push(event),
        }
    }

    events
}
