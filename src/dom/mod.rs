mod document;
mod selector;

pub use document::{Document, El, MutationRecord, NodeId};
pub use selector::{Selector, SelectorError};

/// The slice of the host page the filter pipeline reads and annotates.
///
/// Node handles are weak: every call tolerates a handle whose node has been
/// removed, treating it as absent.
pub trait Page {
    fn url(&self) -> &str;
    fn body(&self) -> NodeId;
    /// True while the node is alive and attached under the body.
    fn contains(&self, node: NodeId) -> bool;

    fn matches(&self, node: NodeId, selector: &Selector) -> bool;
    /// First descendant of `root` (exclusive) matching `selector`.
    fn query(&self, root: NodeId, selector: &Selector) -> Option<NodeId>;
    fn query_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId>;
    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId>;

    fn attr(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attr(&mut self, node: NodeId, name: &str);

    /// Inline style declaration for `property`.
    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);
    fn remove_style(&mut self, node: NodeId, property: &str);

    fn text_content(&self, node: NodeId) -> String;
    /// Replaces the node's children with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str);

    fn create_element(&mut self, tag: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    fn remove(&mut self, node: NodeId);

    /// Installs or replaces the stylesheet registered under `id`.
    fn install_stylesheet(&mut self, id: &str, css: &str);
}
