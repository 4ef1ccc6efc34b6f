//! Ticker extraction from free-text chat messages.
//!
//! Rules are tried in a fixed order and the first hit wins, even when a later rule would also
//! match. Callers treat `None` as "no symbol", which narrows the data that can be fetched.

use regex::Regex;
use std::sync::LazyLock;

/// Companies whose market ticker differs from the name people type.
const ALIAS_RULES: &[(&str, &str)] = &[
    (r"(?i)\b(?:lic|lici)\b", "LICI"),
    (r"(?i)\blife\s+insurance\s+corp(?:oration)?\b", "LICI"),
    (r"(?i)\bstate\s+bank\s+of\s+india\b", "SBIN"),
    (r"(?i)\bhdfc\s+bank\b", "HDFCBANK"),
    (r"(?i)\binfosys\b", "INFY"),
    (r"(?i)\b(?:bharti\s+)?airtel\b", "BHARTIARTL"),
    (r"(?i)\blarsen(?:\s*(?:&|and)\s*toubro)?\b", "LT"),
    (r"(?i)\bhindustan\s+unilever\b", "HINDUNILVR"),
    (r"(?i)\btata\s+consultancy\b", "TCS"),
    (r"(?i)\btata\s+motors\b", "TATAMOTORS"),
    (r"(?i)\btata\s+steel\b", "TATASTEEL"),
    (r"(?i)\btech\s+mahindra\b", "TECHM"),
    (r"(?i)\bmahindra\b", "M&M"),
    (r"(?i)\bbajaj\s+auto\b", "BAJAJ-AUTO"),
    (r"(?i)\bmaruti(?:\s+suzuki)?\b", "MARUTI"),
    (r"(?i)\basian\s+paints\b", "ASIANPAINT"),
    (r"(?i)\bsun\s+pharma(?:ceutical)?\b", "SUNPHARMA"),
];

/// Single-word alias keys, applied to tokens captured by the generic phrase rules.
const ALIAS_KEYS: &[(&str, &str)] = &[
    ("LIC", "LICI"),
    ("LIFECORP", "LICI"),
    ("INFOSYS", "INFY"),
    ("AIRTEL", "BHARTIARTL"),
    ("LARSEN", "LT"),
    ("MAHINDRA", "M&M"),
];

const LARGE_CAPS: &[&str] = &[
    "RELIANCE", "TCS", "HDFCBANK", "INFY", "ITC", "SBIN", "BHARTIARTL", "LT", "WIPRO", "MARUTI",
    "ADANIENT", "ASIANPAINT", "BAJFINANCE", "KOTAKBANK", "HINDUNILVR", "TATAMOTORS", "ULTRACEMCO",
    "NESTLEIND", "DRREDDY", "POWERGRID", "NTPC", "ONGC", "COALINDIA", "GRASIM", "BPCL",
    "JSWSTEEL", "TATASTEEL", "HINDALCO", "SHREECEM", "BRITANNIA", "DIVISLAB", "CIPLA", "EICHERMOT",
    "HEROMOTOCO", "BAJAJ-AUTO", "M&M", "TECHM", "SUNPHARMA", "TITAN",
];

const PHRASE_RULES: &[&str] = &[
    r"(?i)\b(?:stock|share|price)\s+(?:of\s+)?([a-z]{2,15})\b",
    r"(?i)\b([a-z]{2,15})\s+(?:stock|share|price|quote|analysis)\b",
    r"(?i)\b([a-z]{2,15})\s+(?:current|latest|today|live)\b",
    r"(?i)\b(?:company|corp|ltd)\s+([a-z]{2,15})\b",
    r"(?i)\b([a-z]{2,15})\s+(?:company|corp|ltd)\b",
];

// Words the phrase rules would otherwise capture ("the stock", "stock market").
const STOP_WORDS: &[&str] = &[
    "ABOUT", "ALL", "AN", "ANALYSIS", "AND", "ANY", "ARE", "AT", "BEST", "BUY", "CHECK",
    "COMPANY", "CORP", "CURRENT", "DO", "FOR", "FORECAST", "GIVE", "GOOD", "HOW", "IN", "INDIA",
    "INDIAN", "IS", "IT", "ITS", "LATEST", "LIVE", "LTD", "ME", "MARKET", "MY", "NEWS", "NOW",
    "OF", "ON", "OR", "OUR", "OUTLOOK", "PER", "PERFORMANCE", "PLEASE", "PRICE", "PRICES",
    "QUOTE", "RESULTS", "SECTOR", "SELL", "SHARE", "SHARES", "SHOW", "SOME", "STOCK", "STOCKS",
    "TARGET", "TELL", "THE", "THEIR", "THESE", "THIS", "THOSE", "TO", "TODAY", "TOP", "TREND",
    "TRENDS", "UPDATE", "WHAT", "WHICH", "WITH", "YOUR",
];

struct Rules {
    aliases: Vec<(Regex, &'static str)>,
    large_caps: Regex,
    phrases: Vec<Regex>,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| {
    let aliases = ALIAS_RULES
        .iter()
        .map(|(pattern, ticker)| (Regex::new(pattern).expect("alias pattern"), *ticker))
        .collect();

    let alternation = LARGE_CAPS
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let large_caps =
        Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("large-cap pattern");

    let phrases = PHRASE_RULES
        .iter()
        .map(|pattern| Regex::new(pattern).expect("phrase pattern"))
        .collect();

    Rules {
        aliases,
        large_caps,
        phrases,
    }
});

/// Returns the canonical uppercase ticker mentioned in `message`, if any.
pub fn extract_symbol(message: &str) -> Option<String> {
    let rules = &*RULES;

    for (re, ticker) in &rules.aliases {
        if re.is_match(message) {
            tracing::debug!(symbol = ticker, rule = "alias", "extracted stock symbol");
            return Some((*ticker).to_string());
        }
    }

    if let Some(m) = rules.large_caps.find(message) {
        let symbol = m.as_str().to_ascii_uppercase();
        tracing::debug!(%symbol, rule = "large_cap", "extracted stock symbol");
        return Some(symbol);
    }

    for (idx, re) in rules.phrases.iter().enumerate() {
        if let Some(token) = first_phrase_token(re, message) {
            let symbol = canonical_alias(&token).unwrap_or(token);
            tracing::debug!(%symbol, rule = "phrase", phrase_idx = idx, "extracted stock symbol");
            return Some(symbol);
        }
    }

    tracing::debug!("no stock symbol found in message");
    None
}

// Matches may overlap: in "stock price of zomato" the rejected "stock price" shares its
// "price" with the wanted "price of zomato", so the search resumes one character past
// the rejected match start rather than after its end.
fn first_phrase_token(re: &Regex, message: &str) -> Option<String> {
    let mut start = 0;
    while start < message.len() {
        let caps = re.captures_at(message, start)?;
        let whole = caps.get(0)?;
        if let Some(m) = caps.get(1) {
            let token = m.as_str().to_ascii_uppercase();
            if !STOP_WORDS.contains(&token.as_str()) {
                return Some(token);
            }
        }
        start = whole.start() + whole.as_str().chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Maps an alias key such as `LIC` to its ticker.
pub fn canonical_alias(token: &str) -> Option<String> {
    ALIAS_KEYS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(token))
        .map(|(_, ticker)| (*ticker).to_string())
}

/// Company names people use for `symbol`, used to widen news searches.
pub fn company_aliases(symbol: &str) -> Vec<&'static str> {
    match symbol {
        "LICI" => vec!["LIC", "Life Insurance Corporation"],
        "SBIN" => vec!["SBI", "State Bank of India"],
        "HDFCBANK" => vec!["HDFC Bank"],
        "INFY" => vec!["Infosys"],
        "BHARTIARTL" => vec!["Bharti Airtel"],
        "LT" => vec!["Larsen & Toubro"],
        "HINDUNILVR" => vec!["Hindustan Unilever"],
        "TCS" => vec!["Tata Consultancy Services"],
        "TATAMOTORS" => vec!["Tata Motors"],
        "TATASTEEL" => vec!["Tata Steel"],
        "M&M" => vec!["Mahindra & Mahindra"],
        "BAJAJ-AUTO" => vec!["Bajaj Auto"],
        "MARUTI" => vec!["Maruti Suzuki"],
        "ASIANPAINT" => vec!["Asian Paints"],
        "SUNPHARMA" => vec!["Sun Pharma"],
        "RELIANCE" => vec!["Reliance Industries"],
        _ => Vec::new(),
    }
}
