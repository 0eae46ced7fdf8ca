use crate::html::{is_void_tag, parse_fragment};
use crate::selector::{parse_selector_groups, AttrCondition, Combinator, SelectorPart, SelectorStep};
use lockstep_core::HostError;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Root,
    Element(Element),
    Text(String),
    /// Slot of a node dropped by `set_inner_html`.
    Removed,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    /// Attributes in source order.
    pub(crate) attrs: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

/// Node arena.
///
/// Slots are never reused, so stale handles never alias a live node. Replaced subtrees are
/// emptied to `NodeKind::Removed`, which keeps a fixture restore from retaining the old
/// markup; only the fixed-size slot remains.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Root,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn create_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let id_attr = attrs
            .iter()
            .find(|(k, v)| k == "id" && !v.is_empty())
            .map(|(_, v)| v.clone());
        let node = self.create_node(Some(parent), NodeKind::Element(Element { tag_name, attrs }));
        if let Some(id_attr) = id_attr {
            self.id_index.entry(id_attr).or_insert(node);
        }
        node
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeKind::Text(text))
    }

    pub(crate) fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.get(node)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Removed => String::new(),
            NodeKind::Root | NodeKind::Element(_) => self.nodes[node.0]
                .children
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    pub(crate) fn inner_html(&self, node: NodeId) -> Result<String, HostError> {
        let Some(n) = self
            .get(node)
            .filter(|n| matches!(n.kind, NodeKind::Root | NodeKind::Element(_)))
        else {
            return Err(HostError::Parse {
                message: "innerHTML target is not an element".into(),
            });
        };
        Ok(n.children.iter().map(|child| self.dump_node(*child)).collect())
    }

    pub(crate) fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), HostError> {
        if self.element(node).is_none() && node != self.root {
            return Err(HostError::Parse {
                message: "innerHTML target is not an element".into(),
            });
        }
        let fragment = parse_fragment(html)?;

        let old_children = std::mem::take(&mut self.nodes[node.0].children);
        self.release_subtrees(old_children);
        for child in fragment.nodes[fragment.root.0].children.clone() {
            self.clone_subtree_from(&fragment, child, node);
        }
        self.rebuild_id_index();
        Ok(())
    }

    fn release_subtrees(&mut self, roots: Vec<NodeId>) {
        let mut stack = roots;
        while let Some(node) = stack.pop() {
            let slot = &mut self.nodes[node.0];
            slot.parent = None;
            slot.kind = NodeKind::Removed;
            stack.append(&mut slot.children);
        }
    }

    fn clone_subtree_from(&mut self, source: &Dom, source_node: NodeId, parent: NodeId) {
        let kind = source.nodes[source_node.0].kind.clone();
        let node = self.create_node(Some(parent), kind);
        for child in &source.nodes[source_node.0].children {
            self.clone_subtree_from(source, *child, node);
        }
    }

    /// First element in document order wins when ids collide.
    fn rebuild_id_index(&mut self) {
        let mut next = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let NodeKind::Element(element) = &self.nodes[node.0].kind {
                if let Some(id) = element.attr("id").filter(|id| !id.is_empty()) {
                    next.entry(id.to_string()).or_insert(node);
                }
            }
            stack.extend(self.nodes[node.0].children.iter().rev());
        }
        self.id_index = next;
    }

    pub(crate) fn dump_node(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Root => self.nodes[node.0]
                .children
                .iter()
                .map(|child| self.dump_node(*child))
                .collect(),
            NodeKind::Text(text) => escape_text(text),
            NodeKind::Removed => String::new(),
            NodeKind::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                for (k, v) in &element.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(v));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return out;
                }
                for child in &self.nodes[node.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }

    fn collect_elements_dfs(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if matches!(self.nodes[node.0].kind, NodeKind::Element(_)) {
            out.push(node);
        }
        for child in &self.nodes[node.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    /// Connected elements matching any selector group, in document order, without duplicates.
    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, HostError> {
        let groups = parse_selector_groups(selector)?;

        if let [chain] = groups.as_slice() {
            if let [part] = chain.as_slice() {
                if let Some(id) = part.step.id_only() {
                    return Ok(self.by_id(id).into_iter().collect());
                }
            }
        }

        let mut candidates = Vec::new();
        self.collect_elements_dfs(self.root, &mut candidates);

        let mut seen = HashSet::new();
        Ok(candidates
            .into_iter()
            .filter(|node| groups.iter().any(|chain| self.matches_chain(*node, chain)))
            .filter(|node| seen.insert(*node))
            .collect())
    }

    fn matches_chain(&self, node: NodeId, chain: &[SelectorPart]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_step(node, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => self
                .parent(node)
                .is_some_and(|parent| self.matches_chain(parent, rest)),
            // every matching ancestor is a candidate, not only the nearest
            Combinator::Descendant => {
                let mut cursor = self.parent(node);
                while let Some(ancestor) = cursor {
                    if self.matches_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent(ancestor);
                }
                false
            }
        }
    }

    fn matches_step(&self, node: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !step.classes.iter().all(|class_name| element.has_class(class_name)) {
            return false;
        }
        step.attrs.iter().all(|cond| match cond {
            AttrCondition::Exists { key } => element.attr(key).is_some(),
            AttrCondition::Eq { key, value } => element.attr(key) == Some(value.as_str()),
        })
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
