//! Ordered selector-fallback extraction.
//!
//! Listing markup changes often; every field is therefore located via an
//! ordered list of selector candidates, first match wins, and a miss
//! yields `None` rather than an error. Text is read with script/style
//! subtrees stripped so embedded markup never leaks into field values.

use scraper::{ElementRef, Selector};

/// Elements whose text content is never part of a field value.
const NON_CONTENT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Find the first candidate selector that matches under `scope` and has
/// non-empty text; return that text with whitespace normalized.
pub fn first_text(scope: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = scope.select(&selector).next() {
            let text = normalized_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Like [`first_text`] but preserves line structure, for long-form fields.
pub fn first_text_block(scope: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = scope.select(&selector).next() {
            let text = block_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Collect the normalized text of every match of the first candidate
/// selector that matches at all (used for tag-like lists, e.g. skills).
pub fn all_texts(scope: ElementRef<'_>, candidates: &[&str]) -> Vec<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let texts: Vec<String> = scope
            .select(&selector)
            .map(normalized_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

/// Whether any candidate selector matches under `scope`.
pub fn any_matches(scope: ElementRef<'_>, candidates: &[&str]) -> bool {
    candidates.iter().any(|candidate| {
        Selector::parse(candidate)
            .map(|selector| scope.select(&selector).next().is_some())
            .unwrap_or(false)
    })
}

/// Element text with script/style stripped and whitespace collapsed.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element text with script/style stripped, keeping line breaks between
/// block-ish chunks.
fn block_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if NON_CONTENT_TAGS.contains(&child_element.value().name()) {
                continue;
            }
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}
