use crate::domain::news::{NewsCategory, Sentiment};

// Checked in this order; the first category with a keyword hit wins.
const CATEGORY_KEYWORDS: &[(NewsCategory, &[&str])] = &[
    (
        NewsCategory::Earnings,
        &[
            "earnings", "profit", "revenue", "quarter", "q1", "q2", "q3", "q4", "results",
            "dividend", "ebitda", "margin",
        ],
    ),
    (
        NewsCategory::Regulatory,
        &["sebi", "rbi", "regulator", "regulatory", "compliance", "penalty", "policy", "tax"],
    ),
    (
        NewsCategory::Corporate,
        &[
            "merger", "acquisition", "acquire", "stake", "ceo", "board", "appoint", "deal",
            "partnership", "ipo", "buyback",
        ],
    ),
    (
        NewsCategory::Technical,
        &[
            "technical", "support", "resistance", "breakout", "moving average", "rsi", "chart",
            "rally", "target price",
        ],
    ),
    (
        NewsCategory::Market,
        &[
            "sensex", "nifty", "market", "index", "indices", "fii", "dii", "investors", "trading",
        ],
    ),
];

/// Assigns a category by whole-word keyword matching on title and description.
pub fn categorize(title: &str, description: &str) -> NewsCategory {
    let text = padded_words(&format!("{title} {description}"));
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|kw| text.contains(&format!(" {kw} ")))
        })
        .map(|(category, _)| *category)
        .unwrap_or(NewsCategory::General)
}

/// Maps provider labels ("Bullish", "Somewhat-Bearish", "positive") onto the three-way scale.
pub fn sentiment_from_label(label: &str) -> Sentiment {
    let label = label.to_ascii_lowercase();
    if label.contains("bullish") || label.contains("positive") {
        Sentiment::Positive
    } else if label.contains("bearish") || label.contains("negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

// Lowercase, punctuation collapsed to spaces, padded so " kw " matches at either end.
fn padded_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_categories_take_precedence() {
        // Mentions both results and Sensex: earnings comes first.
        assert_eq!(
            categorize("Sensex jumps as Infosys Q3 results beat", ""),
            NewsCategory::Earnings
        );
        assert_eq!(
            categorize("SEBI tightens F&O rules", "New norms for the market"),
            NewsCategory::Regulatory
        );
        assert_eq!(
            categorize("Reliance to acquire stake in retail firm", ""),
            NewsCategory::Corporate
        );
        assert_eq!(
            categorize("Nifty breakout above resistance", ""),
            NewsCategory::Technical
        );
        assert_eq!(categorize("Sensex, Nifty end flat", ""), NewsCategory::Market);
        assert_eq!(categorize("Monsoon arrives in Kerala", ""), NewsCategory::General);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        // "taxi" must not hit "tax"; "boardwalk" must not hit "board".
        assert_eq!(categorize("Taxi fares rise on boardwalk", ""), NewsCategory::General);
    }

    #[test]
    fn provider_labels_map_to_sentiment() {
        assert_eq!(sentiment_from_label("Somewhat-Bullish"), Sentiment::Positive);
        assert_eq!(sentiment_from_label("Bearish"), Sentiment::Negative);
        assert_eq!(sentiment_from_label("negative"), Sentiment::Negative);
        assert_eq!(sentiment_from_label("Neutral"), Sentiment::Neutral);
        assert_eq!(sentiment_from_label(""), Sentiment::Neutral);
    }
}
