//! End-to-end comparison of documents built from inline markup.

mod common;

use common::{doc, para, paras, render, settings, table};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use revmark_core::wml::{count_revisions, GroupKind, NoteKind, Resource};
use revmark_core::xml::namespaces::{R, W};
use revmark_core::{
    accept_revisions, compare, compare_with_stats, extract_revisions, reject_revisions, CompareError, CompareSettings,
    RevisionKind,
};

#[test]
fn scenario_renders_as_two_edits() {
    let original = doc(&para("The quick brown fox"));
    let revised = doc(&para("The quick red fox"));
    let result = compare(&original, &revised, &settings()).unwrap();
    insta::assert_snapshot!(render(&result), @"The quick [-brown-]{+red+} fox¶");
}

#[test]
fn identical_table_documents_have_no_revisions() {
    let body = format!("{}{}", para("Intro"), table(&[&["a", "b"], &["c", "d"]]));
    let result = compare(&doc(&body), &doc(&body), &settings()).unwrap();
    assert_eq!(count_revisions(&result.main, result.body().unwrap()).total(), 0);
    assert_eq!(result.text(), doc(&body).text());
}

#[test]
fn words_unique_to_one_side_are_marked_once() {
    let original = doc(&para("alpha beta gamma epsilon"));
    let revised = doc(&para("alpha delta gamma zeta"));
    let result = compare(&original, &revised, &settings()).unwrap();
    let revisions = extract_revisions(&result, &settings()).unwrap();

    let joined = |kind: RevisionKind| -> Vec<String> {
        revisions.iter().filter(|r| r.kind == kind).map(|r| r.text.clone()).collect()
    };
    assert_eq!(joined(RevisionKind::Deleted), vec!["beta", "epsilon"]);
    assert_eq!(joined(RevisionKind::Inserted), vec!["delta", "zeta"]);
    assert!(revisions.iter().all(|r| r.author == "Tester"));
}

#[test]
fn one_changed_cell_expands_one_cell() {
    let rows_before: [&[&str]; 3] = [
        &["first row left cell", "first row middle cell", "first row right cell"],
        &["second row left cell", "second row middle cell", "second row right cell"],
        &["third row left cell", "third row middle cell", "third row right cell"],
    ];
    let mut rows_after = rows_before;
    rows_after[1] = &["second row left cell", "second row center cell", "second row right cell"];

    let (result, stats) =
        compare_with_stats(&doc(&table(&rows_before)), &doc(&table(&rows_after)), &settings()).unwrap();
    assert_eq!(stats.cells_expanded, 1);
    assert_eq!(stats.expanded(GroupKind::Cell), 1);
    assert_eq!(
        render(&result),
        "first row left cell¶first row middle cell¶first row right cell¶\
         second row left cell¶second row [-middle-]{+center+} cell¶second row right cell¶\
         third row left cell¶third row middle cell¶third row right cell¶"
    );
}

#[test]
fn rewritten_paragraph_is_replaced_whole() {
    let original = doc(&para("The cat sat on the mat today"));
    let revised = doc(&para("A dog ran under every tree yesterday"));
    let result = compare(&original, &revised, &settings()).unwrap();
    let revisions = extract_revisions(&result, &settings()).unwrap();

    let summary: Vec<(RevisionKind, &str)> = revisions.iter().map(|r| (r.kind, r.text.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (RevisionKind::Deleted, "The cat sat on the mat today\n"),
            (RevisionKind::Inserted, "A dog ran under every tree yesterday\n"),
        ]
    );
}

#[test]
fn lowering_the_threshold_keeps_detail() {
    let original = doc(&para("one two three four five six"));
    let revised = doc(&para("one two three four five seven"));
    let detailed = compare(&original, &revised, &settings()).unwrap();
    assert_eq!(render(&detailed), "one two three four five [-six-]{+seven+}¶");

    let strict = settings().with_detail_threshold(0.0);
    let whole = compare(&original, &revised, &strict).unwrap();
    assert_eq!(render(&whole), "[-one two three four five six-][-¶-]{+one two three four five seven+}{+¶+}");
}

#[test]
fn case_insensitive_comparison_ignores_case() {
    let original = doc(&para("Hello World"));
    let revised = doc(&para("hello world"));
    let result = compare(&original, &revised, &settings().with_case_insensitive(true)).unwrap();
    assert!(extract_revisions(&result, &settings()).unwrap().is_empty());

    let sensitive = compare(&original, &revised, &settings()).unwrap();
    assert!(!extract_revisions(&sensitive, &settings()).unwrap().is_empty());
}

#[test]
fn move_ranges_are_rejected() {
    let original = doc(&para("text"));
    let revised = doc(r#"<w:p><w:moveFrom w:id="1" w:author="a" w:date="d"><w:r><w:t>text</w:t></w:r></w:moveFrom></w:p>"#);
    let err = compare(&original, &revised, &settings()).unwrap_err();
    assert!(err.is_structural());
    assert_eq!(err.to_string(), "Unsupported construct 'moveFrom' in word/document.xml");
}

#[test]
fn nesting_limit_is_enforced() {
    let nested = format!("{}{}{}", "<w:sdt><w:sdtContent>".repeat(10), para("deep"), "</w:sdtContent></w:sdt>".repeat(10));
    let settings = settings().with_max_nesting_depth(8);
    let err = compare(&doc(&nested), &doc(&para("flat")), &settings).unwrap_err();
    assert!(matches!(err, CompareError::NestingTooDeep { limit: 8, .. }));
    assert!(err.is_structural());
}

fn text_box(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:pict><v:shape xmlns:v="urn:schemas-microsoft-com:vml"><v:textbox><w:txbxContent>{}</w:txbxContent></v:textbox></v:shape></w:pict></w:r></w:p>"#,
        para(text)
    )
}

#[test]
fn edit_inside_text_box_stays_in_one_box() {
    let original = doc(&text_box("inside box"));
    let revised = doc(&text_box("inside crate"));
    let result = compare(&original, &revised, &settings()).unwrap();

    let body = result.body().unwrap();
    let boxes = result
        .main
        .descendants(body)
        .filter(|&n| result.main.has_name(n, W::NS, "txbxContent"))
        .count();
    assert_eq!(boxes, 1);
    insta::assert_snapshot!(render(&result), @"inside [-box-]{+crate+}¶¶");
    assert_eq!(accept_revisions(&result).text(), revised.text());
    assert_eq!(reject_revisions(&result).text(), original.text());
}

#[test]
fn changed_first_word_in_text_box_round_trips() {
    let original = doc(&format!("{}{}", para("Caption"), text_box("inside box")));
    let revised = doc(&format!("{}{}", para("Caption"), text_box("outside box")));
    let result = compare(&original, &revised, &settings()).unwrap();

    assert_eq!(accept_revisions(&result).text(), "Caption\noutside box\n\n");
    assert_eq!(reject_revisions(&result).text(), "Caption\ninside box\n\n");
}

#[test]
fn existing_revisions_are_accepted_before_comparing() {
    let original = doc(r#"<w:p><w:r><w:t xml:space="preserve">Keep </w:t></w:r><w:ins w:id="7" w:author="Old" w:date="2020-01-01T00:00:00Z"><w:r><w:t>this</w:t></w:r></w:ins></w:p>"#);
    let revised = doc(&para("Keep this"));
    let result = compare(&original, &revised, &settings()).unwrap();
    assert!(extract_revisions(&result, &settings()).unwrap().is_empty());
    assert_eq!(result.text(), "Keep this\n");
}

#[test]
fn inserted_image_gets_its_own_part() {
    let image_rel = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    let drawing = r#"<w:p><w:r><w:drawing><a:blip xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" r:embed="rId1"/></w:drawing></w:r></w:p>"#;
    let original = doc(&para("Caption")).with_resource(
        Resource::new("rId1", image_rel, "media/image1.png").with_part("/word/media/image1.png", "image/png", vec![1]),
    );
    let revised = doc(&format!("{}{}", para("Caption"), drawing)).with_resource(
        Resource::new("rId1", image_rel, "media/image1.png").with_part("/word/media/image1.png", "image/png", vec![2]),
    );

    let result = compare(&original, &revised, &settings()).unwrap();
    let body = result.body().unwrap();
    let blip = result
        .main
        .descendants(body)
        .find(|&n| result.main.attribute(n, &R::embed()).is_some())
        .unwrap();
    let new_id = result.main.attribute(blip, &R::embed()).unwrap();
    assert_ne!(new_id, "rId1");

    let copied = result.resources.get(new_id).unwrap();
    assert_eq!(copied.part_name.as_deref(), Some("/word/media/image1_1.png"));
    assert_eq!(copied.data.as_deref(), Some(&[2u8][..]));
    assert_eq!(result.resources.get("rId1").and_then(|r| r.data.clone()), Some(vec![1]));
}

#[test]
fn missing_relationship_is_a_resource_error() {
    let drawing = r#"<w:p><w:r><w:drawing><a:blip xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" r:embed="rId4"/></w:drawing></w:r></w:p>"#;
    let err = compare(&doc(&para("x")), &doc(&format!("{}{}", para("x"), drawing)), &settings()).unwrap_err();
    assert!(matches!(err, CompareError::Resource { ref id, .. } if id == "rId4"));
}

#[test]
fn inserted_footnote_is_renumbered() {
    let footnotes = |body: &str| {
        format!(
            r#"<w:footnotes xmlns:w="{}"><w:footnote w:type="separator" w:id="0"><w:p><w:r><w:separator/></w:r></w:p></w:footnote><w:footnote w:type="continuationSeparator" w:id="1"><w:p><w:r><w:continuationSeparator/></w:r></w:p></w:footnote>{}</w:footnotes>"#,
            common::W_NS,
            body
        )
    };
    let original = doc(&para("Plain text")).with_footnotes_xml(&footnotes("")).unwrap();
    let revised = doc(r#"<w:p><w:r><w:t>Plain text</w:t></w:r><w:r><w:footnoteReference w:id="5"/></w:r></w:p>"#)
        .with_footnotes_xml(&footnotes(r#"<w:footnote w:id="5"><w:p><w:r><w:t>A note</w:t></w:r></w:p></w:footnote>"#))
        .unwrap();

    let result = compare(&original, &revised, &settings()).unwrap();
    let body = result.body().unwrap();
    let reference = result.main.first_descendant_named(body, &W::footnoteReference()).unwrap();
    assert_eq!(result.main.attribute(reference, &W::id()), Some("2"));

    let notes = result.footnotes.as_ref().unwrap();
    let note = notes.find(NoteKind::Footnote, "2").unwrap();
    assert_eq!(notes.doc.text_content(note), "A note");
    assert!(notes.doc.first_descendant_named(note, &W::ins()).is_some());
    assert_eq!(notes.special_notes(NoteKind::Footnote).len(), 2);

    let revisions = extract_revisions(&result, &settings()).unwrap();
    assert!(revisions
        .iter()
        .any(|r| r.containing_part == "word/footnotes.xml" && r.text.starts_with("A note")));
}

#[test]
fn settings_load_from_json_with_defaults() {
    let settings: CompareSettings =
        serde_json::from_str(r#"{"detail_threshold": 0.5, "author_for_revisions": "Json"}"#).unwrap();
    assert_eq!(settings.detail_threshold, 0.5);
    assert_eq!(settings.author_for_revisions.as_deref(), Some("Json"));
    assert_eq!(settings.max_nesting_depth, CompareSettings::default().max_nesting_depth);
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,7}"
}

fn paragraph() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..6).prop_map(|words| words.join(" "))
}

fn document() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(paragraph(), 1..4)
}

fn build(texts: &[String]) -> revmark_core::DocumentTree {
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    doc(&paras(&refs))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn comparing_a_document_with_itself_changes_nothing(texts in document()) {
        let d = build(&texts);
        let result = compare(&d, &d, &settings()).unwrap();
        prop_assert_eq!(count_revisions(&result.main, result.body().unwrap()).total(), 0);
        prop_assert_eq!(result.text(), d.text());
    }

    #[test]
    fn accepting_gives_the_revised_text(a in document(), b in document()) {
        let (original, revised) = (build(&a), build(&b));
        let result = compare(&original, &revised, &settings()).unwrap();
        prop_assert_eq!(accept_revisions(&result).text(), revised.text());
        prop_assert_eq!(reject_revisions(&result).text(), original.text());
    }
}
