//! Cleanup of raw news text before it reaches any provider.
//!
//! Input may be an HTML fragment, a feed description or plain text. The
//! output is a single line of visible text with links, tracking parameters
//! and boilerplate removed.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Cleaned text shorter than this carries no meaningful content
pub const MIN_CONTENT_CHARS: usize = 10;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());
static SHORT_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bit\.ly|t\.co|goo\.gl|tinyurl\.com|ow\.ly|buff\.ly|is\.gd|rebrand\.ly)/\S*")
        .unwrap()
});
static TRACKING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[?&](?:utm_[a-z_]+|ref)=[^\s&]*").unwrap());
static QUERY_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?\w+=\S*").unwrap());
/// Lead-ins only: start of text or of a sentence, followed by a colon
static BOILERPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^|[.!?…]\s*)(?:read more|click here|continue reading|read the full story|devamını oku)\s*:",
    )
    .unwrap()
});
static ELLIPSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*(?:\.{3}|…)\s*\]|\.{3,}|…").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose content is never visible text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that separate words when flattened
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "section", "article", "header", "footer", "blockquote", "figcaption",
];

/// Clean raw input down to its visible, meaningful text.
///
/// Returns an empty string when fewer than [`MIN_CONTENT_CHARS`] characters remain.
pub fn normalize(raw: &str) -> String {
    normalize_with_min(raw, MIN_CONTENT_CHARS)
}

/// [`normalize`] with a caller-chosen minimum length
pub fn normalize_with_min(raw: &str, min_chars: usize) -> String {
    let cleaned = clean(raw);
    if cleaned.chars().count() < min_chars {
        if !cleaned.is_empty() {
            debug!("Discarding {} chars of normalized text below minimum {}", cleaned.chars().count(), min_chars);
        }
        return String::new();
    }
    cleaned
}

/// Cleanup without the minimum-length rule
pub fn clean(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = visible_text(raw);

    // Anything after a pipe is trailing metadata ("Headline | Source")
    let text = match text.find('|') {
        Some(idx) => &text[..idx],
        None => text.as_str(),
    };

    let text = URL_RE.replace_all(text, " ");
    let text = SHORT_LINK_RE.replace_all(&text, " ");
    let text = TRACKING_RE.replace_all(&text, " ");
    let text = QUERY_SUFFIX_RE.replace_all(&text, " ");
    let text = BOILERPLATE_RE.replace_all(&text, "${1} ");
    let text = ELLIPSIS_RE.replace_all(&text, " ");

    collapse_whitespace(&text)
}

/// Fold every whitespace run, blank lines included, into a single space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Visible text content of a markup fragment
fn visible_text(raw: &str) -> String {
    match parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut raw.as_bytes())
    {
        Ok(dom) => {
            let mut out = String::with_capacity(raw.len());
            collect_text(&dom.document, &mut out);
            out
        }
        Err(e) => {
            debug!("Markup parse failed, stripping tags with regex: {}", e);
            strip_tags(raw)
        }
    }
}

/// Blunt tag removal used when the markup cannot be parsed
pub fn strip_tags(raw: &str) -> String {
    TAG_RE.replace_all(raw, " ").into_owned()
}

fn collect_text(node: &Handle, out: &mut String) {
    match node.data {
        NodeData::Text { ref contents } => {
            out.push_str(&contents.borrow());
        }
        NodeData::Element { ref name, .. } => {
            let tag = &*name.local;
            if HIDDEN_ELEMENTS.contains(&tag) {
                return;
            }
            let block = BLOCK_ELEMENTS.contains(&tag);
            if block {
                out.push(' ');
            }
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
            if block {
                out.push(' ');
            }
        }
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markup_scripts_and_styles() {
        let raw = r#"<div><style>.x{color:red}</style><p>Bitcoin rallied above $70,000 today.</p>
            <script>track("visit")</script><p>Traders cheered.</p></div>"#;
        assert_eq!(
            normalize(raw),
            "Bitcoin rallied above $70,000 today. Traders cheered."
        );
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            normalize("<p>Coinbase &amp; Kraken list new token</p>"),
            "Coinbase & Kraken list new token"
        );
    }

    #[test]
    fn test_drops_trailing_metadata_after_pipe() {
        assert_eq!(
            normalize("Ethereum upgrade goes live | CoinDesk"),
            "Ethereum upgrade goes live"
        );
    }

    #[test]
    fn test_removes_urls_and_tracking() {
        let raw = "Solana hits record volume https://example.com/news?utm_source=x see www.site.com and bit.ly/abc123 now";
        assert_eq!(normalize(raw), "Solana hits record volume see and now");
    }

    #[test]
    fn test_removes_boilerplate_and_ellipsis() {
        let raw = "The SEC approved the ETF filing... Read more: the full decision";
        assert_eq!(normalize(raw), "The SEC approved the ETF filing the full decision");
    }

    #[test]
    fn test_lead_in_at_start_is_removed() {
        assert_eq!(
            normalize("Click here: Bitcoin ETF inflows hit a record"),
            "Bitcoin ETF inflows hit a record"
        );
        assert_eq!(
            normalize("Solana upgrade ships. Continue reading: validators are pleased."),
            "Solana upgrade ships. validators are pleased."
        );
    }

    #[test]
    fn test_boilerplate_words_in_running_text_survive() {
        let raw = "Investors who read more than two reports bought Bitcoin.";
        assert_eq!(normalize(raw), raw);

        let raw = "Users click here and there: the wallet app is confusing.";
        assert_eq!(normalize(raw), raw);

        assert_eq!(clean("Haberin devamını oku ve yorum yap."), "Haberin devamını oku ve yorum yap.");
    }

    #[test]
    fn test_collapses_whitespace_and_blank_lines() {
        let raw = "Line one of the story.\n\n\n   Line two   of the story.\t";
        assert_eq!(normalize(raw), "Line one of the story. Line two of the story.");
    }

    #[test]
    fn test_short_result_is_empty() {
        assert_eq!(normalize("<b>BTC</b>"), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("https://only-a-link.example.com"), "");
    }

    #[test]
    fn test_custom_minimum() {
        assert_eq!(normalize_with_min("BTC up.", 1), "BTC up.");
        assert_eq!(normalize_with_min("BTC up.", 20), "");
    }

    #[test]
    fn test_strip_tags_fallback() {
        assert_eq!(collapse_whitespace(&strip_tags("<b>Bold</b> move")), "Bold move");
    }
}
