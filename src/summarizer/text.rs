//! Article text processing
//!
//! Cleaning, sentence splitting, token-budgeted chunking, key figure
//! extraction and story classification. Nothing here calls a model.

use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| regex(r"<[^>]+>"));
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| regex(r"\[[^\]]*\]"));
static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| regex(r"\([^)]*\)"));
static URL: LazyLock<Regex> = LazyLock::new(|| regex(r"https?://\S+"));
static PHOTO_CREDIT: LazyLock<Regex> =
    LazyLock::new(|| regex(r"\b(?:AFP/Getty Images|Getty Images|Reuters|AP)\b"));
static PICTURE_CAPTION: LazyLock<Regex> = LazyLock::new(|| regex(r"This picture taken on.*?\."));
static RELATED_ARTICLE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)Related article.*?$"));
static DATELINE: LazyLock<Regex> = LazyLock::new(|| regex(r"CNN\s*—\s*"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| regex(r"&(?:amp|lt|gt|quot|apos);"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+"));
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| regex(r#"[.!?]+["'”’)\]]*\s+"#));

static PRICE: LazyLock<Regex> = LazyLock::new(|| regex(r"\$([0-9,]+\.?[0-9]*)"));
static PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| regex(r"([0-9]+\.?[0-9]*)\s*%"));
static TICKER: LazyLock<Regex> = LazyLock::new(|| regex(r"\b[A-Z]{2,5}\b"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},?\s+\d{4}",
    )
});
static QUARTER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?:q[1-4]|first quarter|second quarter|third quarter|fourth quarter)\b")
});

// Patterns are literals
#[allow(clippy::expect_used)]
fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// Strip markup and web artifacts, then collapse whitespace
///
/// Removes HTML tags (keeping their inner text), bracketed and parenthesized
/// asides, URLs, photo credits, caption and "Related article" lines, the CNN
/// dateline, and decodes the five basic HTML entities.
pub fn clean_text(text: &str) -> String {
    let text = HTML_TAG.replace_all(text, "");
    let text = BRACKETED.replace_all(&text, "");
    let text = PARENTHESIZED.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = PHOTO_CREDIT.replace_all(&text, "");
    let text = PICTURE_CAPTION.replace_all(&text, "");
    let text = RELATED_ARTICLE.replace_all(&text, "");
    let text = DATELINE.replace_all(&text, "");
    let text = ENTITY.replace_all(&text, |caps: &regex::Captures<'_>| {
        match &caps[0] {
            "&amp;" => "&",
            "&lt;" => "<",
            "&gt;" => ">",
            "&quot;" => "\"",
            _ => "'",
        }
        .to_string()
    });
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Split text into sentences at terminal punctuation followed by whitespace
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(text) {
        let sentence = text[start..boundary.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = boundary.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Approximate subword token count: four tokens for every three words
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words * 4).div_ceil(3)
}

/// Group whole sentences into chunks of at most `max_tokens` estimated tokens
///
/// A single sentence longer than the budget becomes its own chunk.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let candidate = if current.is_empty() {
            sentence.clone()
        } else {
            format!("{current} {sentence}")
        };

        if estimate_tokens(&candidate) <= max_tokens {
            current = candidate;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current = sentence;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Figures mentioned in an article
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyData {
    /// Dollar amounts without the `$` (first 5)
    pub prices: Vec<String>,
    /// Percentages without the `%` (first 5)
    pub percentages: Vec<String>,
    /// Distinct ticker-like uppercase tokens, in order of appearance (up to 10)
    pub tickers: Vec<String>,
    /// Full dates such as `march 3, 2024` (first 3, lowercased)
    pub dates: Vec<String>,
    /// Quarter references such as `q3` (first 2, lowercased)
    pub quarters: Vec<String>,
}

impl KeyData {
    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
            && self.percentages.is_empty()
            && self.tickers.is_empty()
            && self.dates.is_empty()
            && self.quarters.is_empty()
    }
}

/// Pull prices, percentages, tickers, dates and quarters out of `text`
pub fn extract_key_data(text: &str) -> KeyData {
    let lower = text.to_lowercase();

    let mut tickers: Vec<String> = Vec::new();
    for ticker in TICKER.find_iter(text).take(10) {
        if !tickers.iter().any(|t| t == ticker.as_str()) {
            tickers.push(ticker.as_str().to_string());
        }
    }

    KeyData {
        prices: PRICE
            .captures_iter(text)
            .take(5)
            .map(|c| c[1].to_string())
            .collect(),
        percentages: PERCENTAGE
            .captures_iter(text)
            .take(5)
            .map(|c| c[1].to_string())
            .collect(),
        tickers,
        dates: DATE
            .find_iter(&lower)
            .take(3)
            .map(|m| m.as_str().to_string())
            .collect(),
        quarters: QUARTER
            .find_iter(&lower)
            .take(2)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}

/// Kind of financial story an article tells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoryType {
    /// Cryptocurrency and blockchain news
    Crypto,
    /// Company earnings reports
    StockEarnings,
    /// Share price action
    StockMovement,
    /// Central bank and rate decisions
    FedPolicy,
    /// Anything else market related
    MarketGeneral,
}

impl StoryType {
    /// Keyword table in classification order; ties go to the earlier entry
    const KEYWORDS: [(StoryType, &'static [&'static str]); 5] = [
        (
            StoryType::Crypto,
            &[
                "bitcoin",
                "btc",
                "ethereum",
                "eth",
                "crypto",
                "blockchain",
                "defi",
                "nft",
                "token",
                "coin",
                "doge",
                "ada",
                "sol",
            ],
        ),
        (
            StoryType::StockEarnings,
            &[
                "earnings",
                "eps",
                "revenue",
                "quarterly",
                "q1",
                "q2",
                "q3",
                "q4",
                "guidance",
                "beat",
                "miss",
            ],
        ),
        (
            StoryType::StockMovement,
            &[
                "stock",
                "share",
                "equity",
                "nyse",
                "nasdaq",
                "trading",
                "volume",
                "price action",
            ],
        ),
        (
            StoryType::FedPolicy,
            &[
                "fed",
                "federal reserve",
                "interest rate",
                "jerome powell",
                "fomc",
                "monetary policy",
                "inflation",
                "cpi",
            ],
        ),
        (
            StoryType::MarketGeneral,
            &[
                "market",
                "spy",
                "qqq",
                "dow",
                "nasdaq",
                "s&p",
                "index",
                "volatility",
                "vix",
            ],
        ),
    ];

    /// Keywords that vote for this story type
    pub fn keywords(self) -> &'static [&'static str] {
        Self::KEYWORDS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, words)| *words)
            .unwrap_or(&[])
    }
}

/// Overall tone of an article
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sentiment {
    /// Clearly upbeat
    Positive,
    /// Clearly downbeat
    Negative,
    /// Mixed or unclear
    Neutral,
}

impl Sentiment {
    /// Map a classifier label such as `POSITIVE` or `LABEL_0`
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "positive" | "pos" | "label_2" | "bullish" => Some(Sentiment::Positive),
            "negative" | "neg" | "label_0" | "bearish" => Some(Sentiment::Negative),
            "neutral" | "label_1" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "gain", "rise", "up", "increase", "growth", "bull", "strong", "beat", "profit", "bullish",
    "buy",
];
const NEGATIVE_WORDS: &[&str] = &[
    "loss", "fall", "down", "decrease", "decline", "bear", "weak", "miss", "deficit", "bearish",
    "sell",
];

/// Story type and keyword sentiment for an article
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoryContext {
    /// Best-matching story type
    pub story_type: StoryType,
    /// Keyword-derived sentiment
    pub sentiment: Sentiment,
}

/// Classify an article from its text plus the model summary
///
/// Keywords are matched as substrings of the lowercased text. Sentiment needs
/// a margin of more than one indicator either way, otherwise it stays neutral.
pub fn analyze_story_context(text: &str, summary: &str) -> StoryContext {
    let combined = format!("{text} {summary}").to_lowercase();

    let mut story_type = StoryType::MarketGeneral;
    let mut best = 0;
    for (kind, keywords) in StoryType::KEYWORDS {
        let matches = keywords.iter().filter(|k| combined.contains(**k)).count();
        if matches > best {
            best = matches;
            story_type = kind;
        }
    }

    let positive = POSITIVE_WORDS
        .iter()
        .filter(|w| combined.contains(**w))
        .count();
    let negative = NEGATIVE_WORDS
        .iter()
        .filter(|w| combined.contains(**w))
        .count();
    let sentiment = if positive > negative + 1 {
        Sentiment::Positive
    } else if negative > positive + 1 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };

    StoryContext {
        story_type,
        sentiment,
    }
}
