use super::arena::XmlDocument;
use super::namespaces::XMLNS;
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{CompareError, Result};

pub fn parse(xml: &str) -> Result<XmlDocument> {
    let doc = roxmltree::Document::parse_with_options(
        xml,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| CompareError::XmlParse {
        message: e.to_string(),
        location: format!("line {}", e.pos().row),
    })?;

    let mut xml_doc = XmlDocument::new();
    build_tree(doc.root_element(), &mut xml_doc, None);
    Ok(xml_doc)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let text = std::str::from_utf8(bytes).map_err(|e| CompareError::XmlParse {
        message: e.to_string(),
        location: format!("byte {}", e.valid_up_to()),
    })?;
    // A UTF-8 byte order mark is legal in package parts but not for roxmltree.
    parse(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn build_tree(node: roxmltree::Node, doc: &mut XmlDocument, parent: Option<indextree::NodeId>) {
    let node_data = match node.node_type() {
        roxmltree::NodeType::Element => {
            let name = XName::new(
                node.tag_name().namespace().unwrap_or(""),
                node.tag_name().name(),
            );

            let mut attributes: Vec<XAttribute> = node
                .attributes()
                .map(|attr| {
                    XAttribute::new(
                        XName::new(attr.namespace().unwrap_or(""), attr.name()),
                        attr.value(),
                    )
                })
                .collect();

            // roxmltree reports every in-scope namespace on each element; only the
            // ones declared here are kept so serialization does not repeat them.
            let parent_scope: Vec<(Option<&str>, &str)> = node
                .parent_element()
                .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
                .unwrap_or_default();
            for ns in node.namespaces() {
                if ns.name() == Some("xml") || parent_scope.contains(&(ns.name(), ns.uri())) {
                    continue;
                }
                match ns.name() {
                    Some(prefix) => attributes.push(XAttribute::new(XName::new(XMLNS::NS, prefix), ns.uri())),
                    None => attributes.push(XAttribute::new(XName::local("xmlns"), ns.uri())),
                }
            }

            XmlNodeData::Element { name, attributes }
        }
        roxmltree::NodeType::Text => match node.text() {
            Some(text) => XmlNodeData::Text(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::Comment => match node.text() {
            Some(text) => XmlNodeData::Comment(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::PI => {
            let Some(pi) = node.pi() else { return };
            XmlNodeData::ProcessingInstruction {
                target: pi.target.to_string(),
                data: pi.value.map(|s| s.to_string()).unwrap_or_default(),
            }
        }
        _ => return,
    };

    let new_id = match parent {
        Some(parent_id) => doc.add_child(parent_id, node_data),
        None => doc.add_root(node_data),
    };

    for child in node.children() {
        build_tree(child, doc, Some(new_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::namespaces::W;

    #[test]
    fn parse_wordprocessing_paragraph() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p></w:body>
        </w:document>"#;

        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert!(doc.has_name(root, W::NS, "document"));
        let t = doc.first_descendant_named(root, &W::t()).unwrap();
        assert_eq!(doc.text_content(t), "Hello");
    }

    #[test]
    fn namespace_declarations_stay_on_declaring_element() {
        let xml = r#"<a xmlns:x="urn:x"><x:b/></a>"#;
        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        let child = doc.children(root).next().unwrap();

        assert_eq!(doc.attribute(root, &XName::new(XMLNS::NS, "x")), Some("urn:x"));
        assert_eq!(doc.get(child).and_then(|d| d.attributes()).map(|a| a.len()), Some(0));
    }

    #[test]
    fn parse_preserves_attribute_order() {
        let doc = parse(r#"<root a="1" b="2" c="3" d="4"/>"#).unwrap();
        let root_id = doc.root().unwrap();
        let attrs = doc.get(root_id).unwrap().attributes().unwrap();
        let names: Vec<_> = attrs.iter().map(|a| a.name.local_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn malformed_xml_reports_line() {
        let err = parse("<a>\n<b></a>").unwrap_err();
        assert!(matches!(err, CompareError::XmlParse { ref location, .. } if location == "line 2"));
    }

    #[test]
    fn bom_is_accepted() {
        let doc = parse_bytes("\u{feff}<a/>".as_bytes()).unwrap();
        assert!(doc.root().is_some());
    }
}
