//! HTML fallback parser for the gallery page
//!
//! Mirrors the markup the gallery renders: one `div.itempanel` per knob,
//! with the id on the panel element and metadata in classed child nodes.

use super::{RawId, RawKnob};
use scraper::{ElementRef, Html, Selector};

struct PanelSelectors {
    panel: Selector,
    file: Selector,
    author: Selector,
    date: Selector,
    comment: Selector,
    license: Selector,
}

impl PanelSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            panel: Selector::parse("div.itempanel").ok()?,
            file: Selector::parse("div.itemfile").ok()?,
            author: Selector::parse("div.itemauth").ok()?,
            date: Selector::parse("div.itemdate").ok()?,
            comment: Selector::parse("div.itemcom").ok()?,
            license: Selector::parse("img.itemlic").ok()?,
        })
    }
}

/// Parse `div.itempanel` entries out of the gallery page markup.
///
/// Panels without an id attribute are skipped; every other field is
/// best-effort, matching how unevenly the gallery fills its panels.
pub(super) fn parse_gallery(html: &str) -> Vec<RawKnob> {
    let Some(selectors) = PanelSelectors::new() else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for panel in document.select(&selectors.panel) {
        let Some(id) = panel.value().attr("id") else {
            continue;
        };

        let file = child_text(panel, &selectors.file)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("knob_{id}"));
        let author = child_text(panel, &selectors.author)
            .map(|a| a.trim_start_matches("by ").to_string());
        let date = child_text(panel, &selectors.date);
        let comment = child_text(panel, &selectors.comment)
            .map(|c| c.trim_start_matches("* ").to_string());

        // License is rendered as an icon; the filename stem is the tag
        let license = panel
            .select(&selectors.license)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| src.rsplit('/').next())
            .and_then(|name| name.split('.').next())
            .map(str::to_string);

        entries.push(RawKnob {
            id: RawId::Text(id.to_string()),
            file,
            author,
            license,
            date,
            comment,
            tags: None,
            size: None,
        });
    }

    entries
}

fn child_text(panel: ElementRef<'_>, selector: &Selector) -> Option<String> {
    panel
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const GALLERY_PAGE: &str = r#"
        <html><body>
          <div class="itempanel" id="101">
            <img class="itemlic" src="/img/lic/CC-BY-4.0.png">
            <div class="itemfile">chrome.knob</div>
            <div class="itemauth">by ana</div>
            <div class="itemdate">2024-03-01</div>
            <div class="itemcom">* brushed metal</div>
          </div>
          <div class="itempanel" id="102">
            <div class="itemfile"></div>
          </div>
          <div class="itempanel">
            <div class="itemfile">orphan.knob</div>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_complete_panels() {
        let entries = parse_gallery(GALLERY_PAGE);
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.id.as_u64(), Some(101));
        assert_eq!(first.file, "chrome.knob");
        assert_eq!(first.author.as_deref(), Some("ana"));
        assert_eq!(first.date.as_deref(), Some("2024-03-01"));
        assert_eq!(first.comment.as_deref(), Some("brushed metal"));
        assert_eq!(first.license.as_deref(), Some("CC-BY-4"));
    }

    #[test]
    fn empty_filename_falls_back_to_id() {
        let entries = parse_gallery(GALLERY_PAGE);
        assert_eq!(entries[1].file, "knob_102");
    }

    #[test]
    fn panels_without_id_are_skipped() {
        let entries = parse_gallery(GALLERY_PAGE);
        assert!(entries.iter().all(|e| e.file != "orphan.knob"));
    }

    #[test]
    fn empty_document_parses_to_nothing() {
        assert!(parse_gallery("<html></html>").is_empty());
    }
}
