use std::fmt;

use dom_query::Matcher;
use thiserror::Error;

/// A compiled CSS selector list, matched against page elements.
pub struct Selector {
    source: String,
    matcher: Matcher,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let matcher = Matcher::new(input).map_err(|err| SelectorError {
            selector: input.to_string(),
            reason: format!("{err:?}"),
        })?;
        Ok(Self {
            source: input.to_string(),
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(super) fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_source_text() {
        let sel = Selector::parse("ytd-video-renderer, ytd-rich-item-renderer").unwrap();
        assert_eq!(sel.as_str(), "ytd-video-renderer, ytd-rich-item-renderer");
        assert_eq!(
            format!("{sel:?}"),
            r#"Selector("ytd-video-renderer, ytd-rich-item-renderer")"#
        );
    }

    #[test]
    fn rejects_malformed_selectors() {
        let err = Selector::parse("div >").unwrap_err();
        assert_eq!(err.selector, "div >");
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("#").is_err());
    }
}
