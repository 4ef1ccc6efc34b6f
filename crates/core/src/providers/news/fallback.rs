use crate::domain::news::{Article, NewsCategory, NewsResult, Sentiment};
use crate::providers::news::NewsQuery;
use crate::time::in_market::time_ago;
use chrono::{DateTime, Duration, Utc};

pub const FALLBACK_SOURCE: &str = "fallback";

struct Template {
    outlet: &'static str,
    url: &'static str,
    minutes_ago: i64,
    category: NewsCategory,
    title: fn(&str) -> String,
    description: fn(&str) -> String,
}

const TEMPLATES: [Template; 5] = [
    Template {
        outlet: "Economic Times",
        url: "https://economictimes.indiatimes.com/markets",
        minutes_ago: 0,
        category: NewsCategory::Market,
        title: |t| format!("{t}: market participants track latest developments"),
        description: |t| {
            format!("Investors are watching {t} closely as trading sessions on NSE and BSE unfold.")
        },
    },
    Template {
        outlet: "Moneycontrol",
        url: "https://www.moneycontrol.com/news/business/markets/",
        minutes_ago: 30,
        category: NewsCategory::Technical,
        title: |t| format!("{t}: analysts review key support and resistance levels"),
        description: |t| {
            format!("Technical analysts outline the levels to watch for {t} in the near term.")
        },
    },
    Template {
        outlet: "Business Standard",
        url: "https://www.business-standard.com/markets",
        minutes_ago: 60,
        category: NewsCategory::Market,
        title: |t| format!("{t}: institutional flows and sector trends in focus"),
        description: |t| {
            format!("FII and DII activity continues to shape sentiment around {t}.")
        },
    },
    Template {
        outlet: "LiveMint",
        url: "https://www.livemint.com/market",
        minutes_ago: 120,
        category: NewsCategory::Earnings,
        title: |t| format!("{t}: what the latest quarterly numbers could mean"),
        description: |t| {
            format!("Earnings expectations and valuation remain central to the outlook for {t}.")
        },
    },
    Template {
        outlet: "NDTV Profit",
        url: "https://www.ndtvprofit.com/markets",
        minutes_ago: 180,
        category: NewsCategory::Regulatory,
        title: |t| format!("{t}: regulatory updates investors should know"),
        description: |t| {
            format!("Recent SEBI and RBI announcements relevant to {t} and Indian equities.")
        },
    },
];

/// Placeholder headlines used when no news provider returned anything.
/// The result is flagged `fallback` so callers never present it as live news.
pub fn fallback_news(query: &NewsQuery, now: DateTime<Utc>) -> NewsResult {
    let topic = query.topic();
    let articles = TEMPLATES
        .iter()
        .map(|t| {
            let published_at = now - Duration::minutes(t.minutes_ago);
            Article {
                title: (t.title)(topic),
                description: (t.description)(topic),
                source: t.outlet.to_string(),
                published_at,
                url: t.url.to_string(),
                category: t.category,
                sentiment: Sentiment::Neutral,
                sentiment_glyph: Sentiment::Neutral.glyph().to_string(),
                time_ago: time_ago(published_at, now),
            }
        })
        .collect();

    NewsResult {
        source: FALLBACK_SOURCE.to_string(),
        articles,
        timestamp: now,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generic_topic_without_symbol() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap();
        let res = fallback_news(&NewsQuery::for_symbol(None), now);

        assert!(res.fallback);
        let outlets: Vec<&str> = res.articles.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(
            outlets,
            ["Economic Times", "Moneycontrol", "Business Standard", "LiveMint", "NDTV Profit"]
        );
        assert!(res.articles[0].title.starts_with("Indian stock market:"));
        assert_eq!(res.articles[0].time_ago, "Just now");
        assert_eq!(res.articles[4].time_ago, "3 hours ago");
    }

    #[test]
    fn is_deterministic_for_a_fixed_clock() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap();
        let q = NewsQuery::for_symbol(Some("TCS"));
        assert_eq!(fallback_news(&q, now), fallback_news(&q, now));
    }
}
