//! postboard-dom — element tree types shared by postboard views and renderers
//!
//! Views build a `DomNode` tree instead of concatenating markup; renderers
//! (currently HTML) consume the tree and own all escaping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single node in a postboard view tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    /// HTML tag name (e.g. "article", "form", "button")
    pub tag: String,

    /// Stable identity, rendered as `data-key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// HTML attributes (class, href, name, value, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<HashMap<String, String>>,

    /// Text content, written before any children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DomNode>>,
}

impl DomNode {
    /// Create an empty element
    pub fn new(tag: &str) -> Self {
        DomNode {
            tag: tag.to_string(),
            key: None,
            attrs: None,
            text: None,
            children: None,
        }
    }

    /// Create a simple text node
    pub fn text(tag: &str, content: &str) -> Self {
        let mut node = DomNode::new(tag);
        node.text = Some(content.to_string());
        node
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an attribute, replacing any previous value
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    /// Boolean attribute (`required`, `selected`, ...); rendered with an empty value
    pub fn flag(self, name: &str) -> Self {
        self.attr(name, "")
    }

    pub fn class_name(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, node: DomNode) -> Self {
        self.children.get_or_insert_with(Vec::new).push(node);
        self
    }

    pub fn with_children(mut self, nodes: impl IntoIterator<Item = DomNode>) -> Self {
        self.children.get_or_insert_with(Vec::new).extend(nodes);
        self
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(name).map(|s| s.as_str())
    }

    /// Iterate over children (empty slice if none)
    pub fn children_iter(&self) -> &[DomNode] {
        match &self.children {
            Some(c) => c,
            None => &[],
        }
    }

    /// Depth-first search for the first node carrying `key`
    pub fn find_by_key(&self, key: &str) -> Option<&DomNode> {
        if self.key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children_iter().iter().find_map(|c| c.find_by_key(key))
    }

    /// Depth-first collection of every node matching `pred`
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&DomNode) -> bool, out: &mut Vec<&'a DomNode>) {
        if pred(self) {
            out.push(self);
        }
        for child in self.children_iter() {
            child.find_all(pred, out);
        }
    }

    /// Concatenated text of this node and its descendants, in document order
    pub fn text_content(&self) -> String {
        let mut buf = String::new();
        collect_text(self, &mut buf);
        buf
    }
}

fn collect_text(node: &DomNode, buf: &mut String) {
    if let Some(t) = &node.text {
        buf.push_str(t);
    }
    for child in node.children_iter() {
        collect_text(child, buf);
    }
}

/// Parse a single DomNode from a JSON string
pub fn parse_node(json: &str) -> Result<DomNode, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a tree to compact JSON
pub fn to_json(node: &DomNode) -> Result<String, serde_json::Error> {
    serde_json::to_string(node)
}
