//! Outline construction over real markdown sources.

use strata_core::events::{HeadingLevel, ScanEvent};
use strata_core::hashing::hash_fast_bytes;
use strata_core::outline::Section;

const GUIDE: &str = "# Intro\n\nWelcome.\n\n## Setup\n\nDo X.\n\n### Prereqs\n\nNeed Y.\n";

#[test]
fn guide_outline_shape() {
    let toc = strata_parser::outline(GUIDE);

    assert_eq!(toc.heading_count(), 3);
    assert_eq!(toc.root_level(), Some(HeadingLevel::H1));
    assert_eq!(toc.title.as_deref(), Some("Intro"));
    assert_eq!(toc.roots.len(), 1);

    let intro = &toc.roots[0];
    assert_eq!(intro.children.len(), 1);
    assert_eq!(intro.children[0].title, "Setup");
    assert_eq!(intro.children[0].children[0].title, "Prereqs");
}

#[test]
fn heading_count_matches_heading_start_events() {
    for source in [
        GUIDE,
        "plain text, no headings",
        "## A\n\n## B\n\n# C\n\n#### D\n",
        "",
    ] {
        let parsed = strata_parser::parse(source);
        let starts = parsed
            .events
            .iter()
            .filter(|e| matches!(e, ScanEvent::HeadingStart { .. }))
            .count();
        assert_eq!(parsed.outline().heading_count(), starts);
    }
}

#[test]
fn own_content_stops_at_first_child() {
    let toc = strata_parser::outline(GUIDE);
    let intro = &toc.roots[0];
    let setup = &intro.children[0];

    assert!(intro.own_content.contains("Welcome."));
    assert!(!intro.own_content.contains("Do X."));
    assert!(setup.own_content.contains("Do X."));
    assert!(!setup.own_content.contains("Need Y."));
}

#[test]
fn subtree_hashes_reconstruct_bottom_up() {
    // Recompute every node's fingerprint from scratch and compare.
    fn reconstruct(node: &Section) -> u64 {
        let mut buf = Vec::new();
        buf.extend_from_slice(&node.title_hash.to_le_bytes());
        buf.extend_from_slice(&node.own_content_hash.to_le_bytes());
        for child in &node.children {
            buf.extend_from_slice(&reconstruct(child).to_le_bytes());
        }
        hash_fast_bytes(&buf)
    }

    let toc = strata_parser::outline(GUIDE);
    for (_, node) in toc.walk() {
        assert_eq!(node.subtree_hash, reconstruct(node));
    }
}

#[test]
fn preamble_collects_content_before_first_heading() {
    let toc = strata_parser::outline("Some intro prose.\n\n# First\n\nBody.\n");
    assert!(toc.preamble.contains("Some intro prose."));
    assert!(!toc.preamble.contains("Body."));
}

#[test]
fn headingless_document_is_all_preamble() {
    let source = "Only prose here.\n\nAnd a second paragraph.\n";
    let toc = strata_parser::outline(source);

    assert!(toc.roots.is_empty());
    assert_eq!(toc.preamble, source);
    assert!(toc.title.is_none());
}

#[test]
fn document_starting_below_h1_is_valid() {
    let toc = strata_parser::outline("## Fragment\n\ntext\n\n### Detail\n\nmore\n");
    assert_eq!(toc.root_level(), Some(HeadingLevel::H2));
    assert_eq!(toc.title.as_deref(), Some("Fragment"));
    assert_eq!(toc.roots[0].children.len(), 1);
}

#[test]
fn duplicate_headings_disambiguate() {
    let toc = strata_parser::outline(
        "# API\n\n## Examples\n\na\n\n## Examples\n\nb\n\n## Examples\n\nc\n",
    );

    let slugs: Vec<&str> = toc.roots[0]
        .children
        .iter()
        .map(|c| c.slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["examples", "examples-1", "examples-2"]);
    for slug in slugs {
        assert_eq!(toc.slug_index[slug].len(), 1);
    }
}

#[test]
fn code_blocks_recorded_in_order_with_paths() {
    let source = "# Code\n\n```rust\nfn a() {}\n```\n\n## More\n\n```js\nconsole.log(1)\n```\n";
    let toc = strata_parser::outline(source);

    assert_eq!(toc.code_blocks.len(), 2);
    assert_eq!(toc.code_blocks[0].language.as_deref(), Some("rust"));
    assert_eq!(toc.code_blocks[0].section_path, vec!["code".to_string()]);
    assert_eq!(toc.code_blocks[1].language.as_deref(), Some("js"));
    assert_eq!(
        toc.code_blocks[1].section_path,
        vec!["code".to_string(), "more".to_string()]
    );
}

#[test]
fn internal_links_resolve() {
    let source = "# Intro\n\nSee [setup](#setup) and [gone](#nowhere).\n\n## Setup\n\nBody.\n";
    let toc = strata_parser::outline(source);

    assert_eq!(toc.links.len(), 2);
    assert!(toc.links[0].resolved);
    assert!(!toc.links[1].resolved);
    assert_eq!(toc.broken_links().len(), 1);
    assert_eq!(toc.broken_links()[0].target_slug, "nowhere");
}

#[test]
fn frontmatter_is_split_and_hashed() {
    let source = "---\ntitle: Doc\ntags:\n  - a\n  - b\n---\n# Heading\n\nBody.\n";
    let parsed = strata_parser::parse(source);
    let toc = parsed.outline();

    let title: Option<String> = parsed.document.fm_get("title").unwrap();
    assert_eq!(title, Some("Doc".to_string()));
    assert!(!parsed.document.content().contains("---"));
    assert_ne!(toc.frontmatter_hash, 0);
    assert_ne!(toc.frontmatter_hash_normalized, 0);
}

#[test]
fn outline_serializes_to_json() {
    let toc = strata_parser::outline(GUIDE);
    let json = serde_json::to_string(&toc).unwrap();
    assert!(json.contains("\"slug\":\"setup\""));
    assert!(json.contains("subtree_hash"));
}
