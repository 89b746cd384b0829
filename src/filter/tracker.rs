use std::collections::HashMap;

use crate::{
    domain::HiddenReason,
    dom::{NodeId, Page},
};

/// Per-card visibility state. Cards without an entry are unprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    PreHidden,
    AwaitingAi,
    HiddenFinal(HiddenReason),
    VisibleFinal,
}

impl ElementState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ElementState::HiddenFinal(_) | ElementState::VisibleFinal)
    }

    fn can_become(from: Option<ElementState>, to: ElementState) -> bool {
        use ElementState::*;
        match (from, to) {
            (None, PreHidden) => true,
            (Some(PreHidden), HiddenFinal(_) | AwaitingAi | VisibleFinal) => true,
            (Some(AwaitingAi), HiddenFinal(HiddenReason::Ai) | VisibleFinal) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Option<ElementState>,
    pub to: ElementState,
}

/// Identity-keyed card states. Keys are weak node handles, so the tracker
/// never keeps a card alive; `sweep` evicts entries for cards the page has
/// dropped.
#[derive(Debug, Default)]
pub struct ElementTracker {
    states: HashMap<NodeId, ElementState>,
}

impl ElementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, node: NodeId) -> Option<ElementState> {
        self.states.get(&node).copied()
    }

    pub fn transition(
        &mut self,
        node: NodeId,
        to: ElementState,
    ) -> Result<(), InvalidTransition> {
        let from = self.state(node);
        if !ElementState::can_become(from, to) {
            return Err(InvalidTransition { from, to });
        }
        self.states.insert(node, to);
        Ok(())
    }

    pub fn forget(&mut self, node: NodeId) {
        self.states.remove(&node);
    }

    pub fn sweep<P: Page + ?Sized>(&mut self, page: &P) -> usize {
        let before = self.states.len();
        self.states.retain(|node, _| page.contains(*node));
        before - self.states.len()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn in_state(&self, wanted: ElementState) -> Vec<NodeId> {
        self.states
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(node, _)| *node)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El};

    #[test]
    fn walks_the_ai_path() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let card = doc.build(body, El::new("ytd-video-renderer"));
        let mut tracker = ElementTracker::new();

        tracker.transition(card, ElementState::PreHidden).unwrap();
        assert!(!tracker.state(card).unwrap().is_terminal());
        tracker.transition(card, ElementState::AwaitingAi).unwrap();
        tracker
            .transition(card, ElementState::HiddenFinal(HiddenReason::Ai))
            .unwrap();
        assert!(tracker.state(card).unwrap().is_terminal());
    }

    #[test]
    fn rejects_reopening_terminal_states() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let card = doc.build(body, El::new("ytd-video-renderer"));
        let mut tracker = ElementTracker::new();

        assert!(tracker.transition(card, ElementState::AwaitingAi).is_err());
        tracker.transition(card, ElementState::PreHidden).unwrap();
        tracker.transition(card, ElementState::VisibleFinal).unwrap();
        let err = tracker
            .transition(card, ElementState::HiddenFinal(HiddenReason::Keyword))
            .unwrap_err();
        assert_eq!(err.from, Some(ElementState::VisibleFinal));
        assert!(tracker.transition(card, ElementState::PreHidden).is_err());
    }

    #[test]
    fn sweep_drops_removed_cards() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let kept = doc.build(body, El::new("ytd-video-renderer"));
        let gone = doc.build(body, El::new("ytd-video-renderer"));
        let mut tracker = ElementTracker::new();
        tracker.transition(kept, ElementState::PreHidden).unwrap();
        tracker.transition(gone, ElementState::PreHidden).unwrap();

        doc.remove(gone);
        assert_eq!(tracker.sweep(&doc), 1);
        assert_eq!(tracker.state(gone), None);
        assert_eq!(tracker.in_state(ElementState::PreHidden), vec![kept]);
    }
}
