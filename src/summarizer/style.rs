//! Output styling: headline, journalistic paragraph and hashtags

use super::text::{Sentiment, StoryContext, StoryType, split_sentences};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Hashtags used to pad the generated set
pub const BASE_HASHTAGS: [&str; 5] = ["#News", "#Finance", "#Trading", "#Market", "#Investment"];

/// Title used when there is nothing to build one from
pub const FALLBACK_TITLE: &str = "News Update";

const HASHTAG_KEYWORDS: &[&str] = &[
    "bitcoin",
    "crypto",
    "stock",
    "trading",
    "market",
    "investment",
    "finance",
    "earnings",
    "tech",
    "ai",
    "startup",
    "ethereum",
    "btc",
    "eth",
    "price",
    "revenue",
    "profit",
    "loss",
    "fed",
    "interest",
    "rate",
    "inflation",
    "gdp",
    "unemployment",
    "dollar",
    "euro",
    "currency",
    "bond",
    "yield",
    "nasdaq",
    "sp500",
    "dow",
];

const FINANCIAL_TERMS: &[&str] = &[
    "bitcoin",
    "btc",
    "ethereum",
    "eth",
    "crypto",
    "stock",
    "market",
    "trading",
    "price",
    "earnings",
    "revenue",
    "profit",
    "loss",
    "fed",
    "interest",
    "rate",
    "inflation",
    "gdp",
    "unemployment",
    "dollar",
    "euro",
    "currency",
    "bond",
    "yield",
    "nasdaq",
    "sp500",
    "dow",
];

const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "this", "that", "these", "those",
    "it", "its", "they", "them", "their", "there", "here", "where", "when", "how", "why", "what",
    "which", "who", "whom", "whose", "very", "much", "many", "most", "more", "some", "any",
    "all", "each", "every", "as", "so", "too", "also", "just", "only", "even", "still", "yet",
    "already", "than", "then", "now", "today", "yesterday", "tomorrow", "said", "says", "about",
];

static ACTION_WORDS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    HashMap::from([
        ("announces", 0.5),
        ("reports", 0.3),
        ("reveals", 0.4),
        ("shows", 0.2),
        ("confirms", 0.5),
        ("launches", 0.8),
        ("releases", 0.6),
        ("beats", 1.0),
        ("surges", 1.0),
        ("rises", 0.9),
        ("gains", 0.8),
        ("jumps", 1.0),
        ("improves", 0.7),
        ("accelerates", 0.9),
        ("outperforms", 1.0),
        ("soars", 1.0),
        ("climbs", 0.9),
        ("expands", 0.6),
        ("misses", -1.0),
        ("falls", -0.9),
        ("plunges", -1.0),
        ("crashes", -1.0),
        ("decreases", -0.6),
        ("loses", -0.8),
        ("declines", -0.7),
        ("drops", -0.6),
        ("slows", -0.5),
        ("cuts", -0.7),
        ("warns", -0.9),
        ("halts", -1.0),
        ("underperforms", -1.0),
        ("downgrades", -1.0),
        ("breaks", 0.2),
        ("hits", 0.3),
        ("reaches", 0.4),
        ("crosses", 0.3),
        ("meets", 0.1),
        ("expects", 0.1),
        ("updates", 0.1),
        ("adds", 0.2),
        ("sets", 0.2),
        ("resumes", 0.3),
    ])
});

const TRANSITIONS: [&str; 5] = [
    "From a technical standpoint, we're seeing",
    "From a trading perspective, this signals",
    "Looking at the charts, we're observing",
    "From a market structure standpoint, we're seeing",
    "Technically speaking, this indicates",
];

const OPENING_SENTENCES: usize = 3;
const OPENING_MIN_WORDS: usize = 6;
const OPENING_MAX_WORDS: usize = 40;

fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Pick at most `max_words` of the most informative words from `text`, in original order
///
/// Words score on position (earlier is better), capitalization, financial
/// vocabulary and a weight for headline verbs such as "surges" or "misses".
/// Filler words never score.
pub fn generate_short_title(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    let mut scored: Vec<(usize, f64)> = Vec::new();
    for (i, original) in words.iter().enumerate() {
        let clean = clean_word(original);
        if clean.is_empty() || FILLER_WORDS.contains(&clean.as_str()) {
            continue;
        }

        let mut score = match i {
            0..5 => 3.0,
            5..10 => 2.0,
            10..15 => 1.0,
            _ => 0.0,
        };
        if starts_uppercase(original) {
            score += 2.0;
            if original.chars().count() > 1 {
                score += 1.0;
            }
        }
        score += ACTION_WORDS.get(clean.as_str()).copied().unwrap_or(0.0);
        if FINANCIAL_TERMS.contains(&clean.as_str()) {
            score += 3.0;
        }
        scored.push((i, score));
    }

    if scored.is_empty() {
        return words
            .iter()
            .take(max_words)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
    }

    // Highest score first, earlier position breaks ties
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut selected: Vec<usize> = scored.iter().take(max_words).map(|(i, _)| *i).collect();
    selected.sort_unstable();

    let title = selected
        .iter()
        .map(|i| words[*i])
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build between `min_count` and `max_count` hashtags for `text`
///
/// The first three financial keywords found in the text come first, then the
/// base tags. Duplicates are dropped, order is preserved, and the output is
/// deterministic for a given input. If `min_count` exceeds the number of
/// distinct candidates, all candidates are returned.
pub fn generate_hashtags(text: &str, min_count: usize, max_count: usize) -> Vec<String> {
    let keyword_tags = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| HASHTAG_KEYWORDS.contains(&word.as_str()))
        .take(3)
        .map(|word| format!("#{}", capitalize(&word)));

    let mut hashtags: Vec<String> = Vec::new();
    for tag in keyword_tags.chain(BASE_HASHTAGS.iter().map(|t| t.to_string())) {
        if !hashtags.contains(&tag) {
            hashtags.push(tag);
        }
    }

    hashtags.truncate(max_count.max(min_count));
    hashtags
}

/// Opening sentence(s) of the paragraph, taken from the article itself
///
/// Uses the first two of the first three sentences that have more than five
/// words, capped at 40 words. Falls back to the first sentence of `summary`.
pub fn factual_opening(text: &str, summary: &str) -> String {
    let key_sentences: Vec<String> = split_sentences(text)
        .into_iter()
        .take(OPENING_SENTENCES)
        .filter(|s| s.split_whitespace().count() >= OPENING_MIN_WORDS)
        .take(2)
        .collect();

    if key_sentences.is_empty() {
        let first = summary.split('.').next().unwrap_or("").trim();
        if first.is_empty() {
            return String::new();
        }
        return format!("{first}.");
    }

    let opening = key_sentences.join(" ");
    let words: Vec<&str> = opening.split_whitespace().collect();
    if words.len() > OPENING_MAX_WORDS {
        words[..OPENING_MAX_WORDS].join(" ")
    } else {
        opening
    }
}

/// Random lead-in for the trading analysis
pub fn transition<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    TRANSITIONS.choose(rng).copied().unwrap_or(TRANSITIONS[0])
}

/// Market commentary for the story type and tone
pub fn trading_analysis(context: StoryContext) -> String {
    let mut parts: Vec<&str> = match (context.story_type, context.sentiment) {
        (StoryType::Crypto, Sentiment::Negative) => vec![
            "bearish divergence forming across major timeframes 📉",
            "Smart money is likely de-risking while retail still holds bags",
        ],
        (StoryType::StockEarnings, Sentiment::Positive) => vec![
            "earnings momentum typically drives multi-quarter outperformance",
            "Options flow is showing heavy call activity from institutional players",
        ],
        (StoryType::StockEarnings, _) => vec![
            "earnings disappointment often creates oversold bounce opportunities",
            "Put/call ratios are elevated, suggesting capitulation might be near",
        ],
        _ => vec![
            "mixed signals with some assets holding stronger than others 📊",
            "Volume patterns are telling the real story here - institutional flows vs retail sentiment",
        ],
    };

    if context.story_type == StoryType::Crypto {
        parts.push("BTC and ETH correlation remains strong, but alt performance is diverging");
        parts.push("Alt coin resilience during macro uncertainty often signals underlying strength");
    } else {
        parts.push(
            "Sector rotation patterns are giving us clues about where smart money is positioning",
        );
    }

    format!("{}.", parts.join(". "))
}

/// Closing trade ideas for the story type and tone
pub fn actionable_insights(context: StoryContext) -> String {
    let parts: [&str; 2] = match (context.story_type, context.sentiment) {
        (StoryType::Crypto, Sentiment::Positive) => [
            "Momentum plays are setting up nicely for continuation",
            "DeFi tokens might catch a bid if this keeps up ⚡",
        ],
        (StoryType::Crypto, Sentiment::Negative) => [
            "Bounce plays might emerge from oversold levels",
            "Risk management is key - size down until volatility subsides",
        ],
        (StoryType::StockEarnings, Sentiment::Positive) => [
            "Earnings momentum trades typically have 2-3 week windows",
            "Look for sector peers to follow suit with similar beats",
        ],
        (StoryType::StockEarnings, _) => [
            "Oversold bounces often happen 2-3 sessions after earnings dumps",
            "Wait for capitulation volume before considering entries",
        ],
        _ => [
            "Range-bound trading may persist until clearer directional catalysts emerge",
            "Range traders have solid opportunities between established support/resistance levels ⏰",
        ],
    };

    format!("{}.", parts.join(". "))
}

/// Assemble the full paragraph: opening, transition, analysis, insights
pub fn journalistic_paragraph<R: Rng + ?Sized>(
    text: &str,
    summary: &str,
    context: StoryContext,
    rng: &mut R,
) -> String {
    let components = [
        factual_opening(text, summary),
        transition(rng).to_string(),
        trading_analysis(context),
        actionable_insights(context),
    ];
    components
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
