//! Forbidden-vocabulary filter for companion dialogue.
//!
//! The filter cuts a line at the first forbidden term, and shortens long
//! lines to their first clause. Lines that end up too short are rejected
//! and the caller substitutes [`CANNED_LINE`].

/// The persona vocabulary companions must not use.
pub const DEFAULT_FORBIDDEN_TERMS: &[&str] = &[
    "守护", "命运", "指引", "耐心", "静待", "荣誉", "鲁莽", "信念", "灵魂", "正义", "承诺", "永远",
    "之路", "方向", "直到", "我会", "让我", "耐心等待", "美德",
];

/// Substitute for a rejected line.
pub const CANNED_LINE: &str = "血没干，小心。";

/// Longest line shown as-is, in characters.
pub const DEFAULT_MAX_CHARS: usize = 12;

/// Shortest acceptable line after cutting, in characters.
pub const DEFAULT_MIN_CHARS: usize = 3;

const CLAUSE_BREAKS: &[char] = &['，', '。', '！', '？'];
const TERMINATOR: char = '。';

/// Filter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Terms that may not appear. Empty strings are ignored.
    pub forbidden_terms: Vec<String>,
    /// Display length limit.
    pub max_chars: usize,
    /// Minimum length of a cut line.
    pub min_chars: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            forbidden_terms: DEFAULT_FORBIDDEN_TERMS.iter().map(|s| s.to_string()).collect(),
            max_chars: DEFAULT_MAX_CHARS,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

impl FilterConfig {
    /// Replace the forbidden list.
    pub fn with_forbidden_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Set the display length limit.
    pub fn with_max_chars(mut self, n: usize) -> Self {
        self.max_chars = n;
        self
    }

    /// Set the minimum cut length.
    pub fn with_min_chars(mut self, n: usize) -> Self {
        self.min_chars = n;
        self
    }
}

/// What the filter did to a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Unchanged apart from surrounding whitespace.
    Clean(String),
    /// Cut before a forbidden term.
    Truncated {
        /// The kept text.
        text: String,
        /// The term that triggered the cut.
        term: String,
    },
    /// Too long; reduced to the first clause.
    Shortened(String),
    /// Nothing usable is left.
    Rejected {
        /// The term that triggered the cut, if any.
        term: Option<String>,
    },
}

impl FilterOutcome {
    /// The resulting text, unless rejected.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Clean(t) | Self::Shortened(t) | Self::Truncated { text: t, .. } => Some(t),
            Self::Rejected { .. } => None,
        }
    }

    /// Whether the line was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Whether the line was left untouched.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }

    /// The resulting text, or [`CANNED_LINE`] when rejected.
    pub fn into_text(self) -> String {
        match self {
            Self::Clean(t) | Self::Shortened(t) | Self::Truncated { text: t, .. } => t,
            Self::Rejected { .. } => CANNED_LINE.to_string(),
        }
    }
}

/// A pure text filter.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    config: FilterConfig,
}

impl ContentFilter {
    /// Filter with the given settings.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// The active settings.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The earliest forbidden term in `text`, by byte offset. Ties go to
    /// the longer term.
    pub fn find_forbidden(&self, text: &str) -> Option<(usize, &str)> {
        self.config
            .forbidden_terms
            .iter()
            .filter(|t| !t.is_empty())
            .filter_map(|t| text.find(t.as_str()).map(|i| (i, t.as_str())))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())))
    }

    /// Sanitize one line. Never fails, and the text of a non-rejected
    /// outcome never contains a forbidden term.
    pub fn sanitize(&self, text: &str) -> FilterOutcome {
        let outcome = self.cut(text.trim());
        // Shortening appends a terminator, which can complete a term.
        match outcome.text().and_then(|t| self.find_forbidden(t)) {
            Some((_, term)) => FilterOutcome::Rejected {
                term: Some(term.to_string()),
            },
            None => outcome,
        }
    }

    fn cut(&self, text: &str) -> FilterOutcome {

        if let Some((idx, term)) = self.find_forbidden(text) {
            let term = term.to_string();
            let kept = text[..idx].trim();
            if char_len(kept) < self.config.min_chars {
                return FilterOutcome::Rejected { term: Some(term) };
            }
            let kept = self.shorten(kept).unwrap_or_else(|| kept.to_string());
            if char_len(&kept) < self.config.min_chars {
                return FilterOutcome::Rejected { term: Some(term) };
            }
            return FilterOutcome::Truncated { text: kept, term };
        }

        if text.is_empty() {
            return FilterOutcome::Rejected { term: None };
        }

        match self.shorten(text) {
            Some(short) if char_len(&short) < self.config.min_chars => {
                FilterOutcome::Rejected { term: None }
            }
            Some(short) => FilterOutcome::Shortened(short),
            None => FilterOutcome::Clean(text.to_string()),
        }
    }

    /// First clause plus a terminator, if `text` is over the limit.
    fn shorten(&self, text: &str) -> Option<String> {
        if char_len(text) <= self.config.max_chars {
            return None;
        }
        let first = text.split(CLAUSE_BREAKS).next().unwrap_or_default().trim();
        let mut out = first.to_string();
        out.push(TERMINATOR);
        Some(out)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
