//! Section recovery from free-form synthesis text.
//!
//! The moderator model is asked to emit `**Title**` section headers with
//! bullet lists, but its formatting drifts: numbered prefixes before
//! headers, bullets inline instead of on their own lines, stray trailing
//! list numbers, colons inside or outside the markers. This parser is a
//! best-effort heuristic over that output. It never fails and never drops
//! non-empty content; when no recognized header is found it returns an
//! empty section list and the caller shows the raw message instead.

use std::sync::LazyLock;

use regex::Regex;

/// Section titles the synthesis prompt asks the moderator to emit,
/// in the order they are requested.
pub const DEFAULT_TITLES: &[&str] = &[
    "Synthesis",
    "Points of Agreement",
    "Points of Contention",
    "Key Insights",
    "Conclusion",
    "Confidence",
];

/// Trailing "2." / "3." artifacts: the model starting a numbered item it
/// never fills in.
static TRAILING_ENUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*\d+\.\s*)+$").unwrap());

/// The "no further content" marker the model sometimes appends.
static BOILERPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[\s(]*no further content[.)\s]*$").unwrap());

/// Enumeration prefix directly before an emphasis marker ("1. **Title**").
static ENUM_BEFORE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)\d+\.\s*(\*\*)").unwrap());

/// Any `**...**` emphasis pair (checked against the title list before
/// being stripped).
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());

/// A bullet marker preceded by whitespace mid-line, to be normalized onto
/// its own line.
static INLINE_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\*[ \t]+").unwrap());

/// Bullet boundary after normalization.
static BULLET_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\*[ \t]+").unwrap());

/// One recovered section: a title and its content fragments. A
/// one-element `bullets` list is a single paragraph, not a bullet list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub bullets: Vec<String>,
}

impl Section {
    /// Whether this section is a single paragraph rather than a list.
    pub fn is_paragraph(&self) -> bool {
        self.bullets.len() == 1
    }
}

/// Parser over a fixed, ordered set of recognized section titles.
pub struct SectionParser {
    titles: Vec<String>,
    header: Regex,
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new(DEFAULT_TITLES)
    }
}

impl SectionParser {
    /// Build a parser recognizing the given titles (matched
    /// case-insensitively, wrapped in `**` markers, optionally preceded
    /// by an enumeration prefix and optionally followed by a colon).
    pub fn new(titles: &[&str]) -> Self {
        // Longest-first so "Points of Agreement" can never be shadowed by
        // a shorter alternative.
        let mut ordered: Vec<&str> = titles.to_vec();
        ordered.sort_by_key(|t| std::cmp::Reverse(t.len()));
        let alternation = ordered
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)(?:\d+\.\s*)?\*\*\s*({alternation})\s*:?\s*\*\*\s*:?");
        Self {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            // Alternation of escaped literals; cannot fail to compile.
            header: Regex::new(&pattern).unwrap(),
        }
    }

    /// Parse a message into ordered sections.
    ///
    /// Returns an empty list when no recognized header occurs anywhere in
    /// the message; the caller must then fall back to the raw text.
    pub fn parse(&self, message: &str) -> Vec<Section> {
        let cleaned = self.pre_clean(message);

        let marks: Vec<(usize, usize, String)> = self
            .header
            .captures_iter(&cleaned)
            .map(|caps| {
                let whole = caps.get(0).expect("capture 0 always present");
                let found = caps.get(1).expect("header has one group").as_str();
                (whole.start(), whole.end(), self.canonical_title(found))
            })
            .collect();
        if marks.is_empty() {
            return Vec::new();
        }

        let mut sections = Vec::with_capacity(marks.len());
        for (i, (_, content_start, title)) in marks.iter().enumerate() {
            let span_end = marks.get(i + 1).map(|m| m.0).unwrap_or(cleaned.len());
            let span = cleaned[*content_start..span_end].trim();
            if span.is_empty() {
                continue;
            }
            sections.push(Section {
                title: title.clone(),
                bullets: split_bullets(span),
            });
        }
        sections
    }

    /// Normalize away the generator's formatting noise without touching
    /// recognized section headers.
    fn pre_clean(&self, message: &str) -> String {
        let mut text = message.trim();
        if let Some(rest) = text.strip_prefix(':') {
            text = rest.trim_start();
        }
        let text = BOILERPLATE.replace(text, "");
        let text = TRAILING_ENUM.replace(&text, "");
        let text = ENUM_BEFORE_MARKER.replace_all(&text, "$1$2");
        let text = EMPHASIS.replace_all(&text, |caps: &regex::Captures| {
            let inner = caps[1].trim().trim_end_matches(':').trim_end();
            if self.is_title(inner) {
                caps[0].to_string()
            } else {
                caps[1].to_string()
            }
        });
        text.trim().to_string()
    }

    fn is_title(&self, candidate: &str) -> bool {
        self.titles.iter().any(|t| t.eq_ignore_ascii_case(candidate))
    }

    /// Map a case-insensitive match back to the configured casing.
    fn canonical_title(&self, found: &str) -> String {
        self.titles
            .iter()
            .find(|t| t.eq_ignore_ascii_case(found))
            .cloned()
            .unwrap_or_else(|| found.to_string())
    }
}

/// Split a non-empty content span into bullets, or keep it as a single
/// paragraph when it carries no bullet markers (or only one fragment).
fn split_bullets(span: &str) -> Vec<String> {
    if !span.contains("* ") {
        return vec![clean_fragment(span)];
    }

    let normalized = INLINE_BULLET.replace_all(span, "\n* ");
    let mut bullets: Vec<String> = Vec::new();
    for (i, fragment) in BULLET_SPLIT.split(&normalized).enumerate() {
        let fragment = if i == 0 {
            // The span itself may open with a bullet marker.
            fragment.trim_start().trim_start_matches("* ")
        } else {
            fragment
        };
        let text = clean_fragment(fragment);
        if !text.is_empty() {
            bullets.push(text);
        }
    }

    if bullets.len() > 1 {
        bullets
    } else if let Some(only) = bullets.pop() {
        vec![only]
    } else {
        vec![clean_fragment(span)]
    }
}

fn clean_fragment(fragment: &str) -> String {
    fragment.replace("**", "").trim().to_string()
}
