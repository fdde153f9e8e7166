//! Ticker lists for batch analysis.
//!
//! A list is comma separated; each token is `TICKER` or `TICKER:Company Name`.
//! Both are trimmed and otherwise kept as written, since bar files are looked
//! up by exact name. The company name defaults to the ticker itself.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSpec {
    pub ticker: String,
    pub company: String,
}

impl TickerSpec {
    pub fn new(ticker: &str, company: Option<&str>) -> Self {
        let ticker = ticker.trim().to_string();
        let company = company
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| ticker.clone());
        Self { ticker, company }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<TickerSpec>, TickerError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let (symbol, company) = match token.split_once(':') {
            Some((symbol, company)) => (symbol, Some(company)),
            None => (token, None),
        };
        if symbol.trim().is_empty() {
            return Err(TickerError::EmptyToken);
        }
        let spec = TickerSpec::new(symbol, company);
        // tcs and TCS name the same listing
        if !seen.insert(spec.ticker.to_uppercase()) {
            return Err(TickerError::DuplicateTicker(spec.ticker));
        }
        tickers.push(spec);
    }

    Ok(tickers)
}
