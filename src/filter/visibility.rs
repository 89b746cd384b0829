//! DOM side effects of the card visibility states.

use once_cell::sync::Lazy;

use crate::{
    domain::HiddenReason,
    dom::{NodeId, Page, Selector},
};

pub const PROCESSING_ATTR: &str = "data-filter-processing";
pub const HIDDEN_ATTR: &str = "data-filter-hidden";
pub const LOADER_CLASS: &str = "yt-filter-loader";
pub const STYLESHEET_ID: &str = "yt-filter-styles";
const LOADER_TEXT: &str = "AI analyzing...";

static LOADER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".yt-filter-loader").expect("valid loader selector"));

pub const STYLESHEET: &str = r#"
[data-filter-processing] {
  transition: opacity 0.1s ease-in-out !important;
}
.yt-filter-loader {
  position: absolute !important;
  inset: 0 !important;
  background: rgba(0, 0, 0, 0.8) !important;
  backdrop-filter: blur(4px) !important;
  display: flex !important;
  align-items: center !important;
  justify-content: center !important;
  z-index: 1000 !important;
  border-radius: 8px !important;
  animation: yt-filter-fade-in 0.3s ease-out !important;
}
.yt-filter-loader-content {
  display: flex !important;
  flex-direction: column !important;
  align-items: center !important;
  gap: 8px !important;
  padding: 16px !important;
  background: rgba(30, 41, 59, 0.95) !important;
  border-radius: 8px !important;
  border: 1px solid rgba(59, 130, 246, 0.3) !important;
}
.yt-filter-spinner {
  width: 20px !important;
  height: 20px !important;
  border: 2px solid rgba(59, 130, 246, 0.3) !important;
  border-top: 2px solid #3b82f6 !important;
  border-radius: 50% !important;
  animation: yt-filter-spin 1s linear infinite !important;
}
.yt-filter-text {
  color: #e2e8f0 !important;
  font-size: 12px !important;
  font-weight: 500 !important;
}
@keyframes yt-filter-spin {
  0% { transform: rotate(0deg); }
  100% { transform: rotate(360deg); }
}
@keyframes yt-filter-fade-in {
  from { opacity: 0; transform: scale(0.95); }
  to { opacity: 1; transform: scale(1); }
}
"#;

pub fn install_styles<P: Page + ?Sized>(page: &mut P) {
    page.install_stylesheet(STYLESHEET_ID, STYLESHEET);
}

/// Makes the card invisible without taking it out of layout.
pub fn pre_hide<P: Page + ?Sized>(page: &mut P, card: NodeId) {
    page.set_style(card, "visibility", "hidden");
    page.set_style(card, "opacity", "0");
    page.set_attr(card, PROCESSING_ATTR, "true");
}

/// Reveals the card and drops every marker a previous decision left behind.
pub fn show<P: Page + ?Sized>(page: &mut P, card: NodeId) {
    reveal(page, card);
    page.remove_style(card, "display");
    page.remove_attr(card, HIDDEN_ATTR);
    remove_loader(page, card);
}

/// Reveals the card under a loading overlay while its AI decision is pending.
pub fn show_with_loader<P: Page + ?Sized>(page: &mut P, card: NodeId) {
    reveal(page, card);
    remove_loader(page, card);
    page.set_style(card, "position", "relative");

    let loader = page.create_element("div");
    page.set_attr(loader, "class", LOADER_CLASS);
    let content = page.create_element("div");
    page.set_attr(content, "class", "yt-filter-loader-content");
    let spinner = page.create_element("div");
    page.set_attr(spinner, "class", "yt-filter-spinner");
    let label = page.create_element("span");
    page.set_attr(label, "class", "yt-filter-text");
    page.set_text(label, LOADER_TEXT);

    page.append_child(content, spinner);
    page.append_child(content, label);
    page.append_child(loader, content);
    page.append_child(card, loader);
}

/// Takes the card out of layout and tags it with the reason.
pub fn hide<P: Page + ?Sized>(page: &mut P, card: NodeId, reason: HiddenReason) {
    page.set_style(card, "display", "none");
    page.set_attr(card, HIDDEN_ATTR, reason.as_str());
    page.remove_attr(card, PROCESSING_ATTR);
    remove_loader(page, card);
}

pub fn has_loader<P: Page + ?Sized>(page: &P, card: NodeId) -> bool {
    page.query(card, &LOADER_SELECTOR).is_some()
}

pub fn remove_loader<P: Page + ?Sized>(page: &mut P, card: NodeId) {
    while let Some(loader) = page.query(card, &LOADER_SELECTOR) {
        page.remove(loader);
    }
}

/// Removes every loader overlay on the page; returns how many were removed.
pub fn remove_all_loaders<P: Page + ?Sized>(page: &mut P) -> usize {
    let body = page.body();
    let loaders = page.query_all(body, &LOADER_SELECTOR);
    for loader in &loaders {
        page.remove(*loader);
    }
    loaders.len()
}

fn reveal<P: Page + ?Sized>(page: &mut P, card: NodeId) {
    page.remove_style(card, "visibility");
    page.remove_style(card, "opacity");
    page.remove_attr(card, PROCESSING_ATTR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El};

    fn setup() -> (Document, NodeId) {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let card = doc.build(body, El::new("ytd-video-renderer"));
        (doc, card)
    }

    #[test]
    fn pre_hide_then_show_restores_visibility() {
        let (mut doc, card) = setup();
        pre_hide(&mut doc, card);
        assert_eq!(doc.style(card, "visibility").as_deref(), Some("hidden"));
        assert_eq!(doc.attr(card, PROCESSING_ATTR).as_deref(), Some("true"));

        show(&mut doc, card);
        assert_eq!(doc.style(card, "visibility"), None);
        assert_eq!(doc.style(card, "opacity"), None);
        assert_eq!(doc.attr(card, PROCESSING_ATTR), None);
    }

    #[test]
    fn loader_is_single_and_removed_on_hide() {
        let (mut doc, card) = setup();
        show_with_loader(&mut doc, card);
        show_with_loader(&mut doc, card);
        assert_eq!(doc.query_all(card, &LOADER_SELECTOR).len(), 1);
        assert_eq!(doc.style(card, "position").as_deref(), Some("relative"));

        hide(&mut doc, card, HiddenReason::Ai);
        assert!(!has_loader(&doc, card));
        assert_eq!(doc.style(card, "display").as_deref(), Some("none"));
        assert_eq!(doc.attr(card, HIDDEN_ATTR).as_deref(), Some("ai"));
    }

    #[test]
    fn show_reverses_an_earlier_hide() {
        let (mut doc, card) = setup();
        hide(&mut doc, card, HiddenReason::Keyword);
        show(&mut doc, card);
        assert_eq!(doc.style(card, "display"), None);
        assert_eq!(doc.attr(card, HIDDEN_ATTR), None);
    }

    #[test]
    fn remove_all_loaders_counts_overlays() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let a = doc.build(body, El::new("ytd-video-renderer"));
        let b = doc.build(body, El::new("ytd-rich-item-renderer"));
        show_with_loader(&mut doc, a);
        show_with_loader(&mut doc, b);
        assert_eq!(remove_all_loaders(&mut doc), 2);
        assert!(!has_loader(&doc, a));
    }
}
