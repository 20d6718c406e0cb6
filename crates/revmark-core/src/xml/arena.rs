use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::Result;
use indextree::{Arena, NodeId};

/// Arena-backed XML tree. Node ids stay valid for the lifetime of the
/// document, which is what lets side-tables key on them.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    arena: Arena<XmlNodeData>,
    root: Option<NodeId>,
}

impl XmlDocument {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn get(&self, id: NodeId) -> Option<&XmlNodeData> {
        self.arena.get(id).filter(|node| !node.is_removed()).map(|node| node.get())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNodeData> {
        self.arena
            .get_mut(id)
            .filter(|node| !node.is_removed())
            .map(|node| node.get_mut())
    }

    /// False once the node has been removed from the arena.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn add_root(&mut self, data: XmlNodeData) -> NodeId {
        let id = self.arena.new_node(data);
        self.root = Some(id);
        id
    }

    /// Creates a node that is not attached anywhere yet.
    pub fn new_detached(&mut self, data: XmlNodeData) -> NodeId {
        self.arena.new_node(data)
    }

    pub fn add_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.append(child, &mut self.arena);
        child
    }

    pub fn add_first_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.prepend(child, &mut self.arena);
        child
    }

    pub fn add_before(&mut self, sibling: NodeId, data: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(data);
        sibling.insert_before(new_node, &mut self.arena);
        new_node
    }

    pub fn add_after(&mut self, sibling: NodeId, data: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(data);
        sibling.insert_after(new_node, &mut self.arena);
        new_node
    }

    /// Moves an existing node (with its subtree) to the end of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        parent.prepend(child, &mut self.arena);
    }

    pub fn move_before(&mut self, sibling: NodeId, node: NodeId) {
        sibling.insert_before(node, &mut self.arena);
    }

    pub fn detach(&mut self, node: NodeId) {
        node.detach(&mut self.arena);
    }

    /// Removes the node and everything below it.
    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.arena);
    }

    /// Removes the node but keeps its children in its place.
    pub fn unwrap_node(&mut self, node: NodeId) {
        node.remove(&mut self.arena);
    }

    pub fn name(&self, node: NodeId) -> Option<&XName> {
        self.get(node).and_then(|d| d.name())
    }

    pub fn local_name(&self, node: NodeId) -> Option<&str> {
        self.name(node).map(|n| n.local_name.as_str())
    }

    pub fn has_name(&self, node: NodeId, namespace: &str, local: &str) -> bool {
        self.name(node)
            .map(|n| n.local_name == local && n.namespace.as_deref() == Some(namespace))
            .unwrap_or(false)
    }

    pub fn attribute(&self, node: NodeId, name: &XName) -> Option<&str> {
        self.get(node)?
            .attributes()?
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &XName, value: &str) {
        if let Some(node_data) = self.get_mut(node) {
            if let Some(attrs) = node_data.attributes_mut() {
                if let Some(attr) = attrs.iter_mut().find(|a| &a.name == name) {
                    attr.value = value.to_string();
                } else {
                    attrs.push(XAttribute::new(name.clone(), value));
                }
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &XName) {
        if let Some(node_data) = self.get_mut(node) {
            if let Some(attrs) = node_data.attributes_mut() {
                attrs.retain(|a| &a.name != name);
            }
        }
    }

    pub fn rename(&mut self, node: NodeId, new_name: XName) {
        if let Some(XmlNodeData::Element { name, .. }) = self.get_mut(node) {
            *name = new_name;
        }
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        parent.children(&self.arena)
    }

    /// Element children only, skipping text, comments and processing instructions.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        parent
            .children(&self.arena)
            .filter(move |&c| self.get(c).map(|d| d.is_element()).unwrap_or(false))
    }

    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.parent()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.next_sibling()
    }

    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena)
    }

    pub fn elements_by_name<'a>(
        &'a self,
        parent: NodeId,
        name: &'a XName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent).filter(move |&child_id| {
            self.get(child_id)
                .and_then(|data| data.name())
                .map(|n| n == name)
                .unwrap_or(false)
        })
    }

    pub fn first_child_named(&self, parent: NodeId, name: &XName) -> Option<NodeId> {
        self.elements_by_name(parent, name).next()
    }

    pub fn first_descendant_named(&self, node: NodeId, name: &XName) -> Option<NodeId> {
        self.descendants(node).find(|&d| self.name(d) == Some(name))
    }

    /// Concatenated text of every text node below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        for d in self.descendants(node) {
            if let Some(t) = self.get(d).and_then(|data| data.text_content()) {
                text.push_str(t);
            }
        }
        text
    }

    /// Copies a single element (name and attributes, no children) from another
    /// document. `map_attrs` may rewrite the copied attributes.
    pub fn import_shallow_with<F>(
        &mut self,
        src: &XmlDocument,
        src_node: NodeId,
        parent: Option<NodeId>,
        map_attrs: &mut F,
    ) -> Result<Option<NodeId>>
    where
        F: FnMut(&mut Vec<XAttribute>) -> Result<()>,
    {
        let Some(data) = src.get(src_node) else {
            return Ok(None);
        };
        let mut data = match data {
            XmlNodeData::Element { name, attributes } => XmlNodeData::Element {
                name: name.clone(),
                attributes: attributes.clone(),
            },
            other => other.clone(),
        };
        if let Some(attrs) = data.attributes_mut() {
            map_attrs(attrs)?;
        }
        let id = match parent {
            Some(p) => self.add_child(p, data),
            None => self.new_detached(data),
        };
        Ok(Some(id))
    }

    /// Deep copy of a subtree from another document, rewriting attributes of
    /// every copied element through `map_attrs`.
    pub fn import_subtree_with<F>(
        &mut self,
        src: &XmlDocument,
        src_node: NodeId,
        parent: Option<NodeId>,
        map_attrs: &mut F,
    ) -> Result<Option<NodeId>>
    where
        F: FnMut(&mut Vec<XAttribute>) -> Result<()>,
    {
        let Some(new_id) = self.import_shallow_with(src, src_node, parent, map_attrs)? else {
            return Ok(None);
        };
        let children: Vec<NodeId> = src.children(src_node).collect();
        for child in children {
            self.import_subtree_with(src, child, Some(new_id), map_attrs)?;
        }
        Ok(Some(new_id))
    }

    pub fn import_subtree(
        &mut self,
        src: &XmlDocument,
        src_node: NodeId,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        self.import_subtree_with(src, src_node, parent, &mut |_| Ok(()))
            .ok()
            .flatten()
    }

    /// Deep copy of a subtree within this document, placed under `parent`.
    pub fn clone_subtree(&mut self, node: NodeId, parent: NodeId) -> Option<NodeId> {
        let data = self.get(node)?.clone();
        let copy = self.add_child(parent, data);
        let children: Vec<NodeId> = self.children(node).collect();
        for child in children {
            self.clone_subtree(child, copy);
        }
        Some(copy)
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}
