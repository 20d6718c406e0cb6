use super::arena::XmlDocument;
use super::namespaces::{XML, XMLNS};
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{CompareError, Result};
use indextree::NodeId;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Cursor;

/// Namespace URI to prefix. An empty prefix is the default namespace.
type NamespaceMap = HashMap<String, String>;

pub fn serialize(doc: &XmlDocument) -> Result<String> {
    let bytes = serialize_bytes(doc)?;
    String::from_utf8(bytes).map_err(|e| CompareError::XmlWrite(e.to_string()))
}

pub fn serialize_bytes(doc: &XmlDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_error)?;

    if let Some(root_id) = doc.root() {
        write_top(doc, root_id, &mut writer, Vec::new())?;
    }

    Ok(writer.into_inner().into_inner())
}

/// Serializes one subtree without an XML declaration. Namespace declarations
/// inherited from ancestors are repeated on the subtree root.
pub fn serialize_subtree(doc: &XmlDocument, node_id: NodeId) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut declared: HashSet<XName> = HashSet::new();
    if let Some(attrs) = doc.get(node_id).and_then(|d| d.attributes()) {
        declared.extend(attrs.iter().filter(|a| is_xmlns_attr(a)).map(|a| a.name.clone()));
    }
    let inherited = collect_ancestor_namespace_attrs(doc, node_id, &mut declared);
    write_top(doc, node_id, &mut writer, inherited)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| CompareError::XmlWrite(e.to_string()))
}

fn write_error(e: impl std::fmt::Display) -> CompareError {
    CompareError::XmlWrite(e.to_string())
}

fn write_top<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: NodeId,
    writer: &mut Writer<W>,
    extra_attrs: Vec<XAttribute>,
) -> Result<()> {
    let Some(XmlNodeData::Element { name, attributes }) = doc.get(node_id) else {
        return write_node(doc, node_id, writer, &NamespaceMap::new());
    };

    let mut merged = attributes.clone();
    merged.extend(extra_attrs);

    let mut namespace_map = NamespaceMap::new();
    extend_namespace_map(&mut namespace_map, &merged);
    merged.extend(missing_declarations(doc, node_id, &mut namespace_map));

    write_element(doc, node_id, name, &merged, writer, &namespace_map)
}

fn is_xmlns_attr(attr: &XAttribute) -> bool {
    (attr.name.namespace.is_none() && attr.name.local_name == "xmlns")
        || attr.name.namespace.as_deref() == Some(XMLNS::NS)
}

fn collect_ancestor_namespace_attrs(
    doc: &XmlDocument,
    node_id: NodeId,
    declared: &mut HashSet<XName>,
) -> Vec<XAttribute> {
    let mut collected = Vec::new();
    for ancestor_id in doc.ancestors(node_id).skip(1) {
        let Some(attrs) = doc.get(ancestor_id).and_then(|d| d.attributes()) else {
            continue;
        };
        for attr in attrs {
            if is_xmlns_attr(attr) && !declared.contains(&attr.name) {
                declared.insert(attr.name.clone());
                collected.push(attr.clone());
            }
        }
    }
    collected
}

/// Declarations for namespaces used below `node_id` that no element declares.
fn missing_declarations(doc: &XmlDocument, node_id: NodeId, namespace_map: &mut NamespaceMap) -> Vec<XAttribute> {
    let mut declared_anywhere: HashSet<String> = namespace_map.keys().cloned().collect();
    let mut used: BTreeSet<String> = BTreeSet::new();

    for d in doc.descendants(node_id) {
        let Some(XmlNodeData::Element { name, attributes }) = doc.get(d) else {
            continue;
        };
        if let Some(ns) = &name.namespace {
            used.insert(ns.clone());
        }
        for attr in attributes {
            if is_xmlns_attr(attr) {
                declared_anywhere.insert(attr.value.clone());
            } else if let Some(ns) = &attr.name.namespace {
                used.insert(ns.clone());
            }
        }
    }

    let mut taken: HashSet<String> = namespace_map.values().cloned().collect();
    let mut added = Vec::new();
    for ns in used {
        if ns == XML::NS || ns == XMLNS::NS || declared_anywhere.contains(&ns) {
            continue;
        }
        let mut prefix = well_known_prefix(&ns).unwrap_or("ns").to_string();
        let mut n = 0;
        while taken.contains(&prefix) {
            n += 1;
            prefix = format!("ns{}", n);
        }
        taken.insert(prefix.clone());
        namespace_map.insert(ns.clone(), prefix.clone());
        added.push(XAttribute::new(XName::new(XMLNS::NS, &prefix), &ns));
    }
    added
}

fn extend_namespace_map(namespace_map: &mut NamespaceMap, attributes: &[XAttribute]) {
    for attr in attributes {
        match attr.name.namespace.as_deref() {
            None if attr.name.local_name == "xmlns" => {
                namespace_map.insert(attr.value.clone(), String::new());
            }
            Some(ns) if ns == XMLNS::NS => {
                namespace_map.insert(attr.value.clone(), attr.name.local_name.clone());
            }
            _ => {}
        }
    }
}

fn qualified_name(name: &XName, namespace_map: &NamespaceMap, is_attribute: bool) -> String {
    let Some(ns) = &name.namespace else {
        return name.local_name.clone();
    };
    let prefix = if ns == XMLNS::NS {
        "xmlns"
    } else if ns == XML::NS {
        "xml"
    } else {
        match namespace_map.get(ns.as_str()) {
            // unprefixed attributes never pick up the default namespace
            Some(p) if !(is_attribute && p.is_empty()) => p.as_str(),
            _ => well_known_prefix(ns).unwrap_or("ns"),
        }
    };
    if prefix.is_empty() {
        name.local_name.clone()
    } else {
        format!("{}:{}", prefix, name.local_name)
    }
}

fn write_node<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: NodeId,
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let Some(node_data) = doc.get(node_id) else {
        return Ok(());
    };

    match node_data {
        XmlNodeData::Element { name, attributes } => {
            write_element(doc, node_id, name, attributes, writer, namespace_map)?;
        }
        XmlNodeData::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text))).map_err(write_error)?;
        }
        XmlNodeData::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text))).map_err(write_error)?;
        }
        XmlNodeData::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::new(text))).map_err(write_error)?;
        }
        XmlNodeData::ProcessingInstruction { target, data } => {
            let pi_content = if data.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, data)
            };
            writer.write_event(Event::PI(BytesPI::new(&pi_content))).map_err(write_error)?;
        }
    }

    Ok(())
}

fn write_element<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: NodeId,
    name: &XName,
    attributes: &[XAttribute],
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let mut scoped_map = namespace_map.clone();
    extend_namespace_map(&mut scoped_map, attributes);

    let tag_name = qualified_name(name, &scoped_map, false);
    let mut elem = BytesStart::new(tag_name.as_str());
    for attr in attributes {
        let attr_name = qualified_name(&attr.name, &scoped_map, true);
        elem.push_attribute((attr_name.as_str(), attr.value.as_str()));
    }

    let children: Vec<_> = doc.children(node_id).collect();
    if children.is_empty() {
        writer.write_event(Event::Empty(elem)).map_err(write_error)?;
    } else {
        writer.write_event(Event::Start(elem)).map_err(write_error)?;
        for child_id in children {
            write_node(doc, child_id, writer, &scoped_map)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(tag_name.as_str())))
            .map_err(write_error)?;
    }

    Ok(())
}

fn well_known_prefix(namespace: &str) -> Option<&'static str> {
    let prefix = match namespace {
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main" => "w",
        "http://schemas.microsoft.com/office/word/2010/wordml" => "w14",
        "http://schemas.microsoft.com/office/word/2012/wordml" => "w15",
        "http://schemas.microsoft.com/office/word/2010/wordprocessingShape" => "wps",
        "http://schemas.openxmlformats.org/drawingml/2006/main" => "a",
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" => "wp",
        "http://schemas.openxmlformats.org/drawingml/2006/picture" => "pic",
        "http://schemas.openxmlformats.org/officeDocument/2006/math" => "m",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships" => "r",
        "http://schemas.openxmlformats.org/markup-compatibility/2006" => "mc",
        "urn:schemas-microsoft-com:vml" => "v",
        "urn:schemas-microsoft-com:office:office" => "o",
        "urn:schemas-microsoft-com:office:word" => "w10",
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties" => "cp",
        "http://purl.org/dc/elements/1.1/" => "dc",
        _ => return None,
    };
    Some(prefix)
}
