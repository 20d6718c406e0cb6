//! Shared builders for the integration tests.
#![allow(dead_code)]

use indextree::NodeId;
use revmark_core::xml::namespaces::W;
use revmark_core::xml::XmlDocument;
use revmark_core::{CompareSettings, DocumentTree};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub fn doc(body: &str) -> DocumentTree {
    DocumentTree::from_main_xml(&format!(
        r#"<w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, R_NS, body
    ))
    .unwrap()
}

pub fn para(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

pub fn paras(texts: &[&str]) -> String {
    texts.iter().map(|t| para(t)).collect()
}

pub fn cell(text: &str) -> String {
    format!("<w:tc>{}</w:tc>", para(text))
}

pub fn table(rows: &[&[&str]]) -> String {
    let columns = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut xml = String::from("<w:tbl><w:tblGrid>");
    xml.push_str(&"<w:gridCol/>".repeat(columns));
    xml.push_str("</w:tblGrid>");
    for row in rows {
        xml.push_str("<w:tr>");
        for text in row.iter() {
            xml.push_str(&cell(text));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

pub fn settings() -> CompareSettings {
    CompareSettings::default()
        .with_author("Tester")
        .with_date_time("2024-01-01T00:00:00Z")
}

/// Body text with revisions spelled out: `[-deleted-]`, `{+inserted+}` and
/// `¶` for every paragraph mark (marked like text when the mark changed).
pub fn render(tree: &DocumentTree) -> String {
    let mut out = String::new();
    if let Some(body) = tree.body() {
        render_node(&tree.main, body, &mut out);
    }
    out
}

fn render_node(doc: &XmlDocument, node: NodeId, out: &mut String) {
    let Some(local) = doc.local_name(node) else { return };
    match local {
        "t" | "delText" => out.push_str(&doc.text_content(node)),
        "tab" => out.push('\t'),
        "pPr" | "rPr" | "sectPr" | "tblPr" | "tblGrid" | "trPr" | "tcPr" => {}
        "ins" | "del" => {
            let (open, close) = if local == "ins" { ("{+", "+}") } else { ("[-", "-]") };
            out.push_str(open);
            for child in doc.element_children(node) {
                render_node(doc, child, out);
            }
            out.push_str(close);
        }
        _ => {
            for child in doc.element_children(node) {
                render_node(doc, child, out);
            }
            if local == "p" {
                out.push_str(&mark(doc, node));
            }
        }
    }
}

fn mark(doc: &XmlDocument, p: NodeId) -> String {
    let rpr = doc
        .first_child_named(p, &W::pPr())
        .and_then(|ppr| doc.first_child_named(ppr, &W::rPr()));
    match rpr {
        Some(rpr) if doc.first_child_named(rpr, &W::ins()).is_some() => "{+¶+}".to_string(),
        Some(rpr) if doc.first_child_named(rpr, &W::del()).is_some() => "[-¶-]".to_string(),
        _ => "¶".to_string(),
    }
}
