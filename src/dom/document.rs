use std::mem;

use dom_query::{Document as Html, NodeRef};

use super::{Page, Selector};

/// Weak handle to an element. The underlying tree never reuses ids, so a
/// handle to a removed element stays distinct and simply reads as detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(dom_query::NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationRecord {
    Added(NodeId),
    Removed(NodeId),
}

/// A parsed HTML page plus the childList mutation log an observer on the
/// body subtree would see. Stylesheets go into `<head>`, outside that log.
pub struct Document {
    html: Html,
    head: NodeId,
    body: NodeId,
    url: String,
    records: Vec<MutationRecord>,
}

/// Declarative element builder used to insert whole subtrees at once.
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<El>,
}

impl El {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }
}

impl Document {
    pub fn new(url: impl Into<String>) -> Self {
        let html = Html::from("<html><head></head><body></body></html>");
        let root = html.root().id;
        let head = first_match(&html, "head").unwrap_or(root);
        let body = first_match(&html, "body").unwrap_or(root);
        Self {
            html,
            head: NodeId(head),
            body: NodeId(body),
            url: url.into(),
            records: Vec::new(),
        }
    }

    /// Simulates a same-document navigation (history push).
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        mem::take(&mut self.records)
    }

    /// Builds `spec` detached, then appends it under `parent` in one insertion.
    pub fn build(&mut self, parent: NodeId, spec: El) -> NodeId {
        let root = self.build_detached(spec);
        self.append_child(parent, root);
        root
    }

    fn build_detached(&mut self, spec: El) -> NodeId {
        let El {
            tag,
            attrs,
            text,
            children,
        } = spec;
        let id = self.create_element(&tag);
        for (name, value) in &attrs {
            self.set_attr(id, name, value);
        }
        if !text.is_empty() {
            self.set_text(id, &text);
        }
        for child in children {
            let child_id = self.build_detached(child);
            self.append_child(id, child_id);
        }
        id
    }

    /// Text of the `<style>` element installed under `id`.
    pub fn stylesheet(&self, id: &str) -> Option<String> {
        self.find_stylesheet(id)
            .and_then(|sheet| self.node(sheet))
            .map(|node| node.text().to_string())
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.html.tree.get(&id.0)
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent().map(|p| NodeId(p.id))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Element descendants of `root` in document order, `root` excluded.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.element_children(root);
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.element_children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| {
                node.children()
                    .into_iter()
                    .filter(|child| child.is_element())
                    .map(|child| NodeId(child.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_stylesheet(&self, id: &str) -> Option<NodeId> {
        self.element_children(self.head)
            .into_iter()
            .find(|sheet| self.attr(*sheet, "id").as_deref() == Some(id))
    }
}

fn first_match(html: &Html, css: &str) -> Option<dom_query::NodeId> {
    html.select(css).nodes().first().map(|node| node.id)
}

fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim();
            (!property.is_empty()).then(|| (property.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn serialize(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(property, value)| format!("{property}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Document {
    fn update_style(&mut self, node: NodeId, edit: impl FnOnce(&mut Vec<(String, String)>)) {
        let Some(el) = self.node(node) else {
            return;
        };
        let mut decls = el.attr("style").map(|s| declarations(&s)).unwrap_or_default();
        edit(&mut decls);
        if decls.is_empty() {
            el.remove_attr("style");
        } else {
            el.set_attr("style", &serialize(&decls));
        }
    }
}

impl Page for Document {
    fn url(&self) -> &str {
        &self.url
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn contains(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.body, node)
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.node(node)
            .is_some_and(|el| el.is_element() && el.is_match(selector.matcher()))
    }

    fn query(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.matches(*id, selector))
    }

    fn query_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.matches(*id, selector))
            .collect()
    }

    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.matches(id, selector) {
                return Some(id);
            }
            current = self.parent_of(id);
        }
        None
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?.attr(name).map(|value| value.to_string())
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.node(node) {
            el.set_attr(name, value);
        }
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.node(node) {
            el.remove_attr(name);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attr(node, "style")?;
        declarations(&style)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        self.update_style(node, |decls| {
            match decls.iter_mut().find(|(name, _)| *name == property) {
                Some((_, current)) => *current = value.to_string(),
                None => decls.push((property, value.to_string())),
            }
        });
    }

    fn remove_style(&mut self, node: NodeId, property: &str) {
        let property = property.to_ascii_lowercase();
        self.update_style(node, |decls| decls.retain(|(name, _)| *name != property));
    }

    fn text_content(&self, node: NodeId) -> String {
        self.node(node)
            .map(|el| el.text().to_string())
            .unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.node(node) {
            el.set_text(text);
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        NodeId(self.html.tree.new_element(&tag.to_ascii_lowercase()).id)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.is_inclusive_ancestor(child, parent) {
            return;
        }
        let (Some(parent_el), Some(child_el)) = (self.node(parent), self.node(child)) else {
            return;
        };
        child_el.remove_from_parent();
        parent_el.append_child(&child.0);
        if self.contains(child) {
            self.records.push(MutationRecord::Added(child));
        }
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        let was_attached = self.contains(node);
        let Some(el) = self.node(node) else {
            return;
        };
        el.remove_from_parent();
        if was_attached {
            self.records.push(MutationRecord::Removed(node));
        }
    }

    fn install_stylesheet(&mut self, id: &str, css: &str) {
        let sheet = match self.find_stylesheet(id) {
            Some(sheet) => sheet,
            None => {
                let sheet = self.create_element("style");
                self.set_attr(sheet, "id", id);
                if let Some(head) = self.node(self.head) {
                    head.append_child(&sheet.0);
                }
                sheet
            }
        };
        self.set_text(sheet, css);
    }
}
