use once_cell::sync::Lazy;
use url::Url;

use crate::dom::{NodeId, Page, Selector};

/// The three renderer elements that hold one video listing each.
pub static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("ytd-video-renderer, ytd-rich-item-renderer, ytd-compact-video-renderer")
        .expect("valid card selector")
});

#[derive(Clone, Copy)]
enum TitleField {
    Text,
    TitleAttr,
}

static TITLE_SOURCES: Lazy<Vec<(Selector, TitleField)>> = Lazy::new(|| {
    [
        ("#video-title", TitleField::Text),
        (".yt-lockup-metadata-view-model-wiz__title", TitleField::Text),
        ("a[title]", TitleField::TitleAttr),
        ("h3[title]", TitleField::TitleAttr),
    ]
    .into_iter()
    .map(|(sel, field)| (Selector::parse(sel).expect("valid title selector"), field))
    .collect()
});

static LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "#video-title-link",
        r#"a[href*="/watch?v="]"#,
        r#"a[href*="/shorts/"]"#,
        "a#video-title",
    ]
    .into_iter()
    .map(|sel| Selector::parse(sel).expect("valid link selector"))
    .collect()
});

/// Best-effort display title of a card; empty when none of the known
/// markup variants yields text.
pub fn extract_title<P: Page + ?Sized>(page: &P, card: NodeId) -> String {
    TITLE_SOURCES
        .iter()
        .filter_map(|(selector, field)| {
            let node = page.query(card, selector)?;
            let raw = match field {
                TitleField::Text => page.text_content(node),
                TitleField::TitleAttr => page.attr(node, "title")?,
            };
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .next()
        .unwrap_or_default()
}

/// Absolute watch/shorts URL of a card, with relative links resolved
/// against `origin`.
pub fn extract_video_url<P: Page + ?Sized>(
    page: &P,
    card: NodeId,
    origin: &Url,
) -> Option<String> {
    LINK_SELECTORS.iter().find_map(|selector| {
        let node = page.query(card, selector)?;
        let href = page.attr(node, "href")?;
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        origin.join(href).ok().map(String::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El};

    fn origin() -> Url {
        Url::parse("https://www.youtube.com").unwrap()
    }

    #[test]
    fn prefers_video_title_text() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let title = El::new("yt-formatted-string")
            .attr("id", "video-title")
            .text("  Text Title \n");
        let card = doc.build(
            body,
            El::new("ytd-video-renderer")
                .child(El::new("a").attr("title", "attribute title"))
                .child(
                    El::new("a")
                        .attr("id", "video-title-link")
                        .attr("href", "/watch?v=abc")
                        .child(title),
                ),
        );
        assert_eq!(extract_title(&doc, card), "Text Title");
        assert_eq!(
            extract_video_url(&doc, card, &origin()).as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[test]
    fn falls_back_to_lockup_and_title_attributes() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let lockup = doc.build(
            body,
            El::new("ytd-rich-item-renderer").child(
                El::new("span")
                    .attr("class", "yt-lockup-metadata-view-model-wiz__title other")
                    .text("Lockup Title"),
            ),
        );
        let attr_only = doc.build(
            body,
            El::new("ytd-compact-video-renderer")
                .child(El::new("h3").attr("title", "Heading Title")),
        );
        assert_eq!(extract_title(&doc, lockup), "Lockup Title");
        assert_eq!(extract_title(&doc, attr_only), "Heading Title");
    }

    #[test]
    fn absence_is_empty_or_none() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let card = doc.build(body, El::new("ytd-video-renderer").child(El::new("div")));
        assert_eq!(extract_title(&doc, card), "");
        assert_eq!(extract_video_url(&doc, card, &origin()), None);
    }

    #[test]
    fn keeps_absolute_shorts_links() {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let card = doc.build(
            body,
            El::new("ytd-rich-item-renderer")
                .child(El::new("a").attr("href", "https://m.youtube.com/shorts/xyz")),
        );
        assert_eq!(
            extract_video_url(&doc, card, &origin()).as_deref(),
            Some("https://m.youtube.com/shorts/xyz")
        );
    }
}
