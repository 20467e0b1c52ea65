//! The pulldown-cmark adapter: markdown source in, scan events out.
//!
//! The outline core only understands the flat [`ScanEvent`] shape, so this
//! module walks the pulldown-cmark offset iterator once and flattens it:
//! headings arrive with their titles fully assembled, block-level content
//! runs become single `Text` events carrying the raw source slice, code
//! fences become start/content/end triples, and links are surfaced with
//! their destinations. Nothing here interprets structure; that is the
//! builder's job.

use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel as CmarkLevel, Options, Parser, Tag, TagEnd,
};

use strata_core::events::{HeadingLevel, ScanEvent, SourceSpan};

/// Creates a parser with standard GFM options.
fn create_parser(content: &str) -> Parser<'_> {
    let opts = Options::ENABLE_GFM
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH;
    Parser::new_ext(content, opts)
}

/// Byte-offset to 1-indexed line lookup.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

fn to_level(level: CmarkLevel) -> HeadingLevel {
    match level {
        CmarkLevel::H1 => HeadingLevel::H1,
        CmarkLevel::H2 => HeadingLevel::H2,
        CmarkLevel::H3 => HeadingLevel::H3,
        CmarkLevel::H4 => HeadingLevel::H4,
        CmarkLevel::H5 => HeadingLevel::H5,
        CmarkLevel::H6 => HeadingLevel::H6,
    }
}

/// True for tags that open a block-level content run.
fn is_content_block(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::BlockQuote(_)
            | Tag::List(_)
            | Tag::Item
            | Tag::Table(_)
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell
            | Tag::HtmlBlock
            | Tag::FootnoteDefinition(_)
    )
}

fn is_content_block_end(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Paragraph
            | TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
            | TagEnd::HtmlBlock
            | TagEnd::FootnoteDefinition
    )
}

/// Scans a document body into the flat event sequence the outline builder
/// consumes. Total: any input produces a (possibly empty) event list.
pub fn scan(content: &str) -> Vec<ScanEvent> {
    let lines = LineIndex::new(content);
    let parser = create_parser(content);

    let mut events = Vec::new();
    let mut heading: Option<(HeadingLevel, String, std::ops::Range<usize>)> = None;
    let mut in_code = false;
    let mut link: Option<(String, String, std::ops::Range<usize>)> = None;
    let mut block_depth = 0usize;

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((to_level(level), String::new(), range));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title, span)) = heading.take() {
                    let line = lines.line_of(span.start);
                    events.push(ScanEvent::HeadingStart {
                        level,
                        title,
                        span: SourceSpan::new(span.start, span.end),
                        line,
                    });
                    events.push(ScanEvent::HeadingEnd);
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let (language, info) = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let info = info.to_string();
                        let language = info
                            .split_whitespace()
                            .next()
                            .filter(|s| !s.is_empty())
                            .map(ToOwned::to_owned);
                        (language, info)
                    }
                    CodeBlockKind::Indented => (None, String::new()),
                };
                in_code = true;
                events.push(ScanEvent::CodeFenceStart {
                    language,
                    info,
                    span: SourceSpan::new(range.start, range.end),
                    line: lines.line_of(range.start),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code = false;
                let last = range.end.saturating_sub(1).max(range.start);
                events.push(ScanEvent::CodeFenceEnd {
                    line: lines.line_of(last),
                });
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some((dest_url.to_string(), String::new(), range));
            }
            Event::End(TagEnd::Link) => {
                if let Some((target, text, span)) = link.take() {
                    events.push(ScanEvent::Link {
                        text,
                        target,
                        span: SourceSpan::new(span.start, span.end),
                        line: lines.line_of(span.start),
                    });
                }
            }
            Event::Start(tag) if is_content_block(&tag) => {
                if block_depth == 0 && heading.is_none() && !in_code {
                    let text = content.get(range.clone()).unwrap_or("").to_string();
                    events.push(ScanEvent::Text {
                        text,
                        span: SourceSpan::new(range.start, range.end),
                        line: lines.line_of(range.start),
                    });
                }
                block_depth += 1;
            }
            Event::End(ref tag_end) if is_content_block_end(tag_end) => {
                block_depth = block_depth.saturating_sub(1);
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, title, _)) = heading.as_mut() {
                    title.push_str(&text);
                } else if in_code {
                    events.push(ScanEvent::Text {
                        text: text.to_string(),
                        span: SourceSpan::new(range.start, range.end),
                        line: lines.line_of(range.start),
                    });
                }
                if let Some((_, link_text, _)) = link.as_mut() {
                    link_text.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, title, _)) = heading.as_mut() {
                    title.push(' ');
                }
                if let Some((_, link_text, _)) = link.as_mut() {
                    link_text.push(' ');
                }
            }
            _ => {}
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(events: &[ScanEvent]) -> Vec<(u8, String, usize)> {
        events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::HeadingStart {
                    level, title, line, ..
                } => Some((level.as_u8(), title.clone(), *line)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn scans_headings_with_levels_and_lines() {
        let events = scan("# One\n\ntext\n\n## Two\n\n### Three\n");
        assert_eq!(
            headings(&events),
            vec![
                (1, "One".to_string(), 1),
                (2, "Two".to_string(), 5),
                (3, "Three".to_string(), 7),
            ]
        );
    }

    #[test]
    fn heading_title_includes_inline_code() {
        let events = scan("## Using `cargo build` now\n");
        assert_eq!(headings(&events)[0].1, "Using cargo build now");
    }

    #[test]
    fn heading_spans_cover_the_marker() {
        let events = scan("text\n\n## Offset Heading\n");
        let ScanEvent::HeadingStart { span, .. } = &events[1] else {
            panic!("expected heading after the paragraph, got {:?}", events[1]);
        };
        assert_eq!(span.start, 6);
    }

    #[test]
    fn paragraphs_become_raw_slices() {
        let events = scan("# H\n\nFirst *styled* paragraph.\n\nSecond.\n");
        let texts: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        // Raw source slices, markup included.
        assert_eq!(texts[0].trim_end(), "First *styled* paragraph.");
        assert_eq!(texts[1].trim_end(), "Second.");
    }

    #[test]
    fn nested_blocks_emit_one_run() {
        let events = scan("- item one\n- item two\n  - nested\n");
        let texts: Vec<&ScanEvent> = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::Text { .. }))
            .collect();
        // The whole list is a single content run.
        assert_eq!(texts.len(), 1);
    }

    #[test]
    fn fenced_code_with_info_string() {
        let events = scan("```rust ignore\nfn main() {}\n```\n");

        let ScanEvent::CodeFenceStart {
            language,
            info,
            line,
            ..
        } = &events[0]
        else {
            panic!("expected fence start, got {:?}", events[0]);
        };
        assert_eq!(language.as_deref(), Some("rust"));
        assert_eq!(info, "rust ignore");
        assert_eq!(*line, 1);

        assert!(matches!(
            &events[1],
            ScanEvent::Text { text, .. } if text == "fn main() {}\n"
        ));
        assert!(matches!(&events[2], ScanEvent::CodeFenceEnd { .. }));
    }

    #[test]
    fn plain_fence_has_no_language() {
        let events = scan("```\nplain\n```\n");
        assert!(matches!(
            &events[0],
            ScanEvent::CodeFenceStart { language: None, .. }
        ));
    }

    #[test]
    fn links_carry_target_and_text() {
        let events = scan("# H\n\nSee [the setup](#setup) and [site](https://example.com).\n");
        let links: Vec<(&str, &str)> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Link { text, target, .. } => Some((text.as_str(), target.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            links,
            vec![("the setup", "#setup"), ("site", "https://example.com")]
        );
    }

    #[test]
    fn empty_input_scans_to_nothing() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn line_index_lookup() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 1);
        assert_eq!(index.line_of(3), 2);
        assert_eq!(index.line_of(6), 3);
        assert_eq!(index.line_of(7), 4);
    }
}
