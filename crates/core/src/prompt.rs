//! Prompt assembly. The output is a pure function of [`PromptInput`]: no clock reads, no I/O.

use crate::domain::news::{NewsCategory, NewsResult};
use crate::domain::quote::QuoteResult;
use crate::time::in_market::MarketSession;
use std::fmt::Write;

pub const GUIDELINES: &str = "You are StockMind AI, a specialized Indian stock market assistant. You help investors with:

1. Stock analysis and recommendations for NSE/BSE stocks
2. Market insights and trends
3. Investment strategies for Indian markets
4. Technical and fundamental analysis
5. Risk assessment and portfolio advice

Key Guidelines:
- Always mention currency in ₹ (INR)
- Use Indian market terminology (lakhs, crores)
- Reference Indian market timings (9:15 AM - 3:30 PM IST)
- Consider Indian investor behavior and preferences
- Mention relevant Indian indices (Nifty 50, Sensex, Bank Nifty)
- Include regulatory context (SEBI guidelines when relevant)
- Be conversational but professional
- Always add risk disclaimers for investment advice
- If you cannot access real-time data, provide general market knowledge and suggest reliable sources";

const DEFAULT_CONTEXT: &str = "General stock market conversation";

const MISSING_QUOTE_NOTE: &str = "NOTE: Live price data is not available for this request. Provide general market knowledge and analysis, and recommend checking official sources (NSE, BSE, MoneyControl, Economic Times) for current prices.";

const CLOSING_INSTRUCTION: &str = "Please provide a comprehensive and helpful response. If real-time data is unavailable, focus on providing valuable analysis and insights while guiding users to reliable sources for current information.";

#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub message: &'a str,
    pub context: &'a str,
    pub session: MarketSession,
    pub symbol: Option<&'a str>,
    pub quote: Option<&'a QuoteResult>,
    pub news: Option<&'a NewsResult>,
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(GUIDELINES);

    let context = match input.context.trim() {
        "" => DEFAULT_CONTEXT,
        c => c,
    };
    // Writing into a String cannot fail.
    let _ = write!(out, "\n\nCurrent context: {context}");
    let _ = write!(out, "\nMarket session: {}", input.session);

    if let Some(q) = input.quote {
        write_quote(&mut out, q);
    }

    if let Some(news) = input.news.filter(|n| !n.articles.is_empty()) {
        write_news(&mut out, news);
    }

    if input.quote.is_none() {
        out.push_str("\n\n");
        out.push_str(MISSING_QUOTE_NOTE);
        if let Some(symbol) = input.symbol {
            write_symbol_guidance(&mut out, symbol);
        }
    }

    let _ = write!(out, "\n\n{CLOSING_INSTRUCTION}\n\nUser Query: {}", input.message);
    out
}

/// Prompt for the plain assistant: guidelines and a single chat turn.
pub fn plain_chat_prompt(message: &str, context: &str) -> String {
    let context = match context.trim() {
        "" => DEFAULT_CONTEXT,
        c => c,
    };
    format!("{GUIDELINES}\n\nCurrent context: {context}\n\nUser: {message}\n\nAssistant:")
}

fn write_quote(out: &mut String, q: &QuoteResult) {
    let name = q.company_name.as_deref().unwrap_or(&q.symbol);
    let _ = write!(
        out,
        "\n\nLIVE STOCK PRICE ({}, as of {}):\n\
- Company: {name}\n\
- Symbol: {}\n\
- Price: ₹{:.2}\n\
- Change: {:+.2} ({:+.2}%)\n\
- Previous close: ₹{:.2}\n\
- Volume: {}",
        q.source,
        q.timestamp.to_rfc3339(),
        q.symbol,
        q.price,
        q.change,
        q.change_percent,
        q.previous_close,
        q.volume,
    );
    if let Some(exchange) = &q.exchange {
        let _ = write!(out, "\n- Exchange: {exchange}");
    }
    if let Some(cap) = q.market_cap {
        let _ = write!(out, "\n- Market cap: ₹{:.2} crore", cap / 1e7);
    }
    out.push_str("\nUse these figures prominently and cite the source.");
}

fn write_news(out: &mut String, news: &NewsResult) {
    if news.fallback {
        out.push_str(
            "\n\nCURATED NEWS HEADLINES (offline placeholders, not live reporting; do not quote them as current events):",
        );
    } else {
        let _ = write!(out, "\n\nLATEST NEWS (source: {}):", news.source);
    }
    for (i, a) in news.articles.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {} {} [{}] ({}, {})",
            i + 1,
            a.sentiment_glyph,
            a.title,
            category_label(a.category),
            a.source,
            a.time_ago,
        );
        if !a.description.is_empty() {
            let _ = write!(out, "\n   {}", a.description);
        }
    }
}

fn write_symbol_guidance(out: &mut String, symbol: &str) {
    let _ = write!(
        out,
        "\n\nSpecific guidance for {symbol}: Since real-time data is unavailable, provide comprehensive analysis including:\n\
- Company overview and business model\n\
- Recent performance trends and market position\n\
- Key financial metrics to watch\n\
- Investment considerations and risk factors\n\
- Suggest specific reliable sources for current price (NSE: nseindia.com, BSE: bseindia.com, MoneyControl, Yahoo Finance India)\n\
- Market sentiment and analyst views if known"
    );
}

fn category_label(c: NewsCategory) -> &'static str {
    match c {
        NewsCategory::Earnings => "earnings",
        NewsCategory::Corporate => "corporate",
        NewsCategory::Technical => "technical",
        NewsCategory::Regulatory => "regulatory",
        NewsCategory::Market => "market",
        NewsCategory::General => "general",
    }
}
