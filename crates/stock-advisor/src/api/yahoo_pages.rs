//! Yahoo Finance web pages
//!
//! Company profile, analyst ratings, income statement rows and key statistics are
//! not exposed by the chart API, so they are read from the public quote pages.
//! Fetching and parsing are kept apart: every `parse_*` function is pure and takes
//! the page HTML.

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Label to value pairs scraped from a page
pub type FieldMap = BTreeMap<String, String>;

pub const YAHOO_FINANCE_BASE: &str = "https://finance.yahoo.com";

/// Company profile with fixed keys; missing fields are empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub sector: String,
    pub industry: String,
    pub employees: String,
    pub description: String,
}

/// Client for the Yahoo Finance quote pages
#[derive(Clone)]
pub struct YahooPageClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl YahooPageClient {
    /// Create a client sending `user_agent`, limited to `requests_per_second`
    pub fn new(user_agent: &str, timeout: Duration, requests_per_second: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: YAHOO_FINANCE_BASE.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Self::new(
            &config.user_agent,
            config.request_timeout,
            config.yahoo_requests_per_second,
        )
    }

    /// Point the client at another host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether both clients draw from the same request quota
    pub fn shares_rate_limiter(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rate_limiter, &other.rate_limiter)
    }

    #[cfg(test)]
    pub(crate) fn try_acquire(&self) -> bool {
        self.rate_limiter.check().is_ok()
    }

    fn page_url(&self, symbol: &str, page: &str) -> String {
        if page.is_empty() {
            format!("{}/quote/{}", self.base_url, symbol)
        } else {
            format!("{}/quote/{}/{}", self.base_url, symbol, page)
        }
    }

    async fn fetch(&self, symbol: &str, page: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let url = self.page_url(symbol, page);
        debug!(%url, "fetching Yahoo page");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }

    /// Display name from the quote page; the ticker on any failure
    pub async fn company_name(&self, symbol: &str) -> String {
        match self.fetch(symbol, "").await {
            Ok(html) => match parse_company_name(&html) {
                Ok(Some(name)) => name,
                _ => symbol.to_string(),
            },
            Err(e) => {
                debug!(symbol, error = %e, "company name lookup failed, using ticker");
                symbol.to_string()
            }
        }
    }

    /// Regular market price shown on the quote page
    pub async fn current_price(&self, symbol: &str) -> Result<f64> {
        let html = self.fetch(symbol, "").await?;
        parse_current_price(&html)
    }

    /// Profile page fields; the all-empty record on any failure
    pub async fn company_info(&self, symbol: &str) -> CompanyInfo {
        match self
            .fetch(symbol, "profile")
            .await
            .and_then(|html| parse_company_info(&html))
        {
            Ok(info) => info,
            Err(e) => {
                warn!(symbol, error = %e, "failed to retrieve company info");
                CompanyInfo::default()
            }
        }
    }

    /// Rating to analyst count from the analysis page
    pub async fn analyst_recommendations(&self, symbol: &str) -> Result<BTreeMap<String, i64>> {
        let html = self.fetch(symbol, "analysis").await?;
        parse_recommendations(&html)
    }

    /// Income statement rows from the financials page
    pub async fn income_statement(&self, symbol: &str) -> Result<BTreeMap<String, Vec<String>>> {
        let html = self.fetch(symbol, "financials").await?;
        parse_income_statement(&html)
    }

    /// Quote statistics from the summary page
    ///
    /// A non-success status yields an empty map rather than an error.
    pub async fn fundamentals(&self, symbol: &str) -> Result<FieldMap> {
        match self.fetch(symbol, "").await {
            Ok(html) => parse_fundamentals(&html),
            Err(AdvisorError::HttpStatus { status, .. }) => {
                debug!(symbol, status, "summary page unavailable");
                Ok(FieldMap::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Every two-cell table row on the key statistics page
    pub async fn key_ratios(&self, symbol: &str) -> Result<FieldMap> {
        let html = self.fetch(symbol, "key-statistics").await?;
        parse_key_ratios(&html)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AdvisorError::ParseError(format!("bad selector '{css}': {e}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>> {
    Ok(scope.select(&selector(css)?).next().map(text_of))
}

/// First element named `tag` after `after` in document order
fn find_next<'a>(document: &'a Html, after: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let mut seen = false;
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if seen && element.value().name() == tag {
            return Some(element);
        }
        if element.id() == after.id() {
            seen = true;
        }
    }
    None
}

/// Text of the first `next_tag` element following a `dt` containing `label`
fn definition_after(document: &Html, label: &str, next_tag: &str) -> Result<String> {
    Ok(document
        .select(&selector("dt")?)
        .find(|dt| text_of(*dt).contains(label))
        .and_then(|dt| find_next(document, dt, next_tag))
        .map(text_of)
        .unwrap_or_default())
}

/// Text of the first `h1`, if it is not blank
pub fn parse_company_name(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    Ok(first_text(document.root_element(), "h1")?.filter(|name| !name.is_empty()))
}

/// `regularMarketPrice` streamer value, falling back to its text; 0.0 when absent
pub fn parse_current_price(html: &str) -> Result<f64> {
    let document = Html::parse_document(html);
    let Some(streamer) = document
        .select(&selector(r#"fin-streamer[data-field="regularMarketPrice"]"#)?)
        .next()
    else {
        return Ok(0.0);
    };

    if let Some(value) = streamer.value().attr("value").and_then(|v| v.parse::<f64>().ok()) {
        return Ok(value);
    }

    let text = text_of(streamer).replace(',', "");
    text.parse::<f64>()
        .map_err(|_| AdvisorError::ParseError(format!("unreadable price '{text}'")))
}

pub fn parse_company_info(html: &str) -> Result<CompanyInfo> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let address = match root.select(&selector("div.address")?).next() {
        Some(div) => div
            .select(&selector("div")?)
            .map(text_of)
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    };

    Ok(CompanyInfo {
        name: first_text(root, r#"section[data-testid="asset-profile"] h3"#)?.unwrap_or_default(),
        address,
        phone: first_text(root, r#"a[aria-label="phone number"]"#)?.unwrap_or_default(),
        website: first_text(root, r#"a[aria-label="website link"]"#)?.unwrap_or_default(),
        sector: definition_after(&document, "Sector", "a")?,
        industry: definition_after(&document, "Industry", "a")?,
        employees: definition_after(&document, "Full Time Employees", "strong")?,
        description: first_text(root, r#"section[data-testid="description"] p"#)?
            .unwrap_or_default(),
    })
}

/// Ratings table: the first table whose first header mentions "Recommendation"
pub fn parse_recommendations(html: &str) -> Result<BTreeMap<String, i64>> {
    let document = Html::parse_document(html);
    let th = selector("th")?;
    let tr = selector("tr")?;
    let td = selector("td")?;

    let Some(table) = document.select(&selector("table")?).find(|table| {
        table
            .select(&th)
            .next()
            .is_some_and(|header| text_of(header).contains("Recommendation"))
    }) else {
        return Ok(BTreeMap::new());
    };

    Ok(table
        .select(&tr)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<_> = row.select(&td).map(text_of).collect();
            if cells.len() < 2 {
                return None;
            }
            let count = cells[1].parse::<i64>().unwrap_or(0);
            Some((cells[0].clone(), count))
        })
        .collect())
}

/// `D(tbr)` rows: first cell is the line item, the rest are period values
pub fn parse_income_statement(html: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let document = Html::parse_document(html);
    let cell = selector(r#"div[class~="D(tbc)"]"#)?;

    Ok(document
        .select(&selector(r#"div[class~="D(tbr)"]"#)?)
        .filter_map(|row| {
            let mut cells = row.select(&cell).map(text_of);
            let key = cells.next()?;
            let values: Vec<String> = cells.collect();
            (!values.is_empty()).then_some((key, values))
        })
        .collect())
}

/// `quote-statistics` list items keyed by label title or text
pub fn parse_fundamentals(html: &str) -> Result<FieldMap> {
    let document = Html::parse_document(html);
    let label = selector("span.label")?;
    let value = selector("span.value")?;

    let Some(stats) = document
        .select(&selector(r#"div[data-testid="quote-statistics"]"#)?)
        .next()
    else {
        return Ok(FieldMap::new());
    };

    Ok(stats
        .select(&selector("li")?)
        .filter_map(|item| {
            let label_el = item.select(&label).next()?;
            let value_el = item.select(&value).next()?;
            let key = label_el
                .value()
                .attr("title")
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| text_of(label_el));
            Some((key, text_of(value_el)))
        })
        .collect())
}

pub fn parse_key_ratios(html: &str) -> Result<FieldMap> {
    let document = Html::parse_document(html);
    let tr = selector("tr")?;
    let td = selector("td")?;

    let mut ratios = FieldMap::new();
    for table in document.select(&selector("table")?) {
        for row in table.select(&tr) {
            let mut cells = row.select(&td);
            if let (Some(label), Some(value)) = (cells.next(), cells.next()) {
                ratios.insert(text_of(label), text_of(value));
            }
        }
    }
    Ok(ratios)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_PAGE: &str = r#"
        <html><body>
          <h1> Apple Inc. (AAPL) </h1>
          <fin-streamer data-field="regularMarketPrice" value="189.84">189.84</fin-streamer>
          <div data-testid="quote-statistics">
            <ul>
              <li><span class="label" title="Previous Close">Previous Close</span><span class="value">187.15</span></li>
              <li><span class="label">Market Cap (intraday)</span><span class="value">2.95T</span></li>
              <li><span class="label" title="PE Ratio (TTM)">PE Ratio...</span><span class="value">29.51</span></li>
              <li><span class="label">Orphan label</span></li>
            </ul>
          </div>
        </body></html>
    "#;

    const PROFILE_PAGE: &str = r#"
        <html><body>
          <section data-testid="asset-profile">
            <h3>Apple Inc.</h3>
            <div class="address"><div>One Apple Park Way</div><div>Cupertino, CA 95014</div><div>United States</div></div>
            <a aria-label="phone number" href="tel:408-996-1010">408 996 1010</a>
            <a aria-label="website link" href="https://www.apple.com">https://www.apple.com</a>
            <dl>
              <dt>Sector:</dt><dd><a href="/sectors/technology">Technology</a></dd>
              <dt>Industry:</dt><dd><a href="/industries/consumer-electronics">Consumer Electronics</a></dd>
              <dt>Full Time Employees:</dt><dd><strong>161,000</strong></dd>
            </dl>
          </section>
          <section data-testid="description"><h3>Description</h3><p> Apple designs smartphones. </p></section>
        </body></html>
    "#;

    const ANALYSIS_PAGE: &str = r#"
        <html><body>
          <table><tr><th>Earnings Estimate</th></tr><tr><td>No. of Analysts</td><td>28</td></tr></table>
          <table>
            <tr><th>Recommendation Rating</th><th>Count</th></tr>
            <tr><td>Strong Buy</td><td>12</td></tr>
            <tr><td>Buy</td><td>20</td></tr>
            <tr><td>Hold</td><td>n/a</td></tr>
            <tr><td>Sell</td></tr>
          </table>
        </body></html>
    "#;

    const FINANCIALS_PAGE: &str = r#"
        <html><body>
          <div class="D(tbr) fi-row"><div class="D(tbc)">Breakdown</div><div class="D(tbc)">TTM</div><div class="D(tbc)">9/30/2023</div></div>
          <div class="D(tbr)"><div class="D(tbc)">Total Revenue</div><div class="D(tbc)">385,706,000</div><div class="D(tbc)">383,285,000</div></div>
          <div class="D(tbr)"><div class="D(tbc)">Lonely</div></div>
        </body></html>
    "#;

    const KEY_STATS_PAGE: &str = r#"
        <html><body>
          <table>
            <tr><th>Valuation Measures</th></tr>
            <tr><td>Trailing P/E</td><td>29.51</td></tr>
            <tr><td>Forward P/E</td><td>28.17</td></tr>
          </table>
          <table>
            <tr><td>Beta (5Y Monthly)</td><td>1.29</td><td>extra</td></tr>
            <tr><td>Single</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_company_name() {
        assert_eq!(parse_company_name(QUOTE_PAGE).unwrap().as_deref(), Some("Apple Inc. (AAPL)"));
        assert_eq!(parse_company_name("<html><h1>  </h1></html>").unwrap(), None);
        assert_eq!(parse_company_name("<html></html>").unwrap(), None);
    }

    #[test]
    fn test_parse_current_price() {
        assert_eq!(parse_current_price(QUOTE_PAGE).unwrap(), 189.84);

        let text_only =
            r#"<fin-streamer data-field="regularMarketPrice">1,234.50</fin-streamer>"#;
        assert_eq!(parse_current_price(text_only).unwrap(), 1234.5);

        assert_eq!(parse_current_price("<html></html>").unwrap(), 0.0);

        let garbage = r#"<fin-streamer data-field="regularMarketPrice">--</fin-streamer>"#;
        assert!(parse_current_price(garbage).is_err());
    }

    #[test]
    fn test_parse_company_info() {
        let info = parse_company_info(PROFILE_PAGE).unwrap();
        assert_eq!(info.name, "Apple Inc.");
        assert_eq!(info.address, "One Apple Park Way Cupertino, CA 95014 United States");
        assert_eq!(info.phone, "408 996 1010");
        assert_eq!(info.website, "https://www.apple.com");
        assert_eq!(info.sector, "Technology");
        assert_eq!(info.industry, "Consumer Electronics");
        assert_eq!(info.employees, "161,000");
        assert_eq!(info.description, "Apple designs smartphones.");
    }

    #[test]
    fn test_parse_company_info_empty_page() {
        assert_eq!(parse_company_info("<html><body></body></html>").unwrap(), CompanyInfo::default());
    }

    #[test]
    fn test_parse_recommendations() {
        let recs = parse_recommendations(ANALYSIS_PAGE).unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs["Strong Buy"], 12);
        assert_eq!(recs["Buy"], 20);
        assert_eq!(recs["Hold"], 0);
        assert!(!recs.contains_key("No. of Analysts"));

        assert!(parse_recommendations("<table><tr><th>Other</th></tr></table>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_income_statement() {
        let rows = parse_income_statement(FINANCIALS_PAGE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows["Breakdown"], vec!["TTM", "9/30/2023"]);
        assert_eq!(rows["Total Revenue"], vec!["385,706,000", "383,285,000"]);
        assert!(!rows.contains_key("Lonely"));
    }

    #[test]
    fn test_parse_fundamentals() {
        let stats = parse_fundamentals(QUOTE_PAGE).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats["Previous Close"], "187.15");
        assert_eq!(stats["Market Cap (intraday)"], "2.95T");
        assert_eq!(stats["PE Ratio (TTM)"], "29.51");

        assert!(parse_fundamentals("<html></html>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_key_ratios() {
        let ratios = parse_key_ratios(KEY_STATS_PAGE).unwrap();
        assert_eq!(ratios.len(), 3);
        assert_eq!(ratios["Trailing P/E"], "29.51");
        assert_eq!(ratios["Beta (5Y Monthly)"], "1.29");
        assert!(!ratios.contains_key("Single"));
    }

    #[test]
    fn test_page_urls() {
        let client = YahooPageClient::new("Mozilla/5.0", Duration::from_secs(5), 2)
            .unwrap()
            .with_base_url("http://localhost:9/");
        assert_eq!(client.page_url("AAPL", ""), "http://localhost:9/quote/AAPL");
        assert_eq!(
            client.page_url("AAPL", "key-statistics"),
            "http://localhost:9/quote/AAPL/key-statistics"
        );
    }

    #[tokio::test]
    async fn test_company_name_falls_back_to_ticker() {
        let client = YahooPageClient::new("Mozilla/5.0", Duration::from_millis(200), 10)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(client.company_name("TSLA").await, "TSLA");
        assert_eq!(client.company_info("TSLA").await, CompanyInfo::default());
    }

    mod http {
        use super::*;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn page(server: &MockServer, url_path: &str, status: u16, body: &str) {
            Mock::given(method("GET"))
                .and(path(url_path))
                .and(header("user-agent", "Mozilla/5.0"))
                .respond_with(ResponseTemplate::new(status).set_body_string(body))
                .mount(server)
                .await;
        }

        fn client(server: &MockServer) -> YahooPageClient {
            YahooPageClient::new("Mozilla/5.0", Duration::from_secs(5), 50)
                .unwrap()
                .with_base_url(server.uri())
        }

        #[tokio::test]
        async fn test_quote_page_over_http() {
            let server = MockServer::start().await;
            page(&server, "/quote/AAPL", 200, QUOTE_PAGE).await;
            let client = client(&server);

            assert_eq!(client.company_name("AAPL").await, "Apple Inc. (AAPL)");
            assert_eq!(client.current_price("AAPL").await.unwrap(), 189.84);
            let fundamentals = client.fundamentals("AAPL").await.unwrap();
            assert_eq!(fundamentals["PE Ratio (TTM)"], "29.51");
        }

        #[tokio::test]
        async fn test_non_success_status_is_http_error() {
            let server = MockServer::start().await;
            page(&server, "/quote/AAPL/key-statistics", 404, "not found").await;

            match client(&server).key_ratios("AAPL").await {
                Err(AdvisorError::HttpStatus { status, url }) => {
                    assert_eq!(status, 404);
                    assert!(url.ends_with("/quote/AAPL/key-statistics"));
                }
                other => panic!("expected HttpStatus, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_fundamentals_empty_on_non_success() {
            let server = MockServer::start().await;
            page(&server, "/quote/AAPL", 503, "unavailable").await;

            assert!(client(&server).fundamentals("AAPL").await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_company_info_empty_on_non_success() {
            let server = MockServer::start().await;
            page(&server, "/quote/AAPL/profile", 404, PROFILE_PAGE).await;
            page(&server, "/quote/AAPL", 429, "slow down").await;
            let client = client(&server);

            assert_eq!(client.company_info("AAPL").await, CompanyInfo::default());
            assert_eq!(client.company_name("AAPL").await, "AAPL");
        }
    }

    #[test]
    fn test_clones_share_rate_limiter() {
        let client = YahooPageClient::new("Mozilla/5.0", Duration::from_secs(1), 1).unwrap();
        let clone = client.clone();
        let separate = YahooPageClient::new("Mozilla/5.0", Duration::from_secs(1), 1).unwrap();

        assert!(client.shares_rate_limiter(&clone));
        assert!(!client.shares_rate_limiter(&separate));
        assert!(clone.try_acquire());
        assert!(!client.try_acquire());
        assert!(separate.try_acquire());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_company_info() {
        let client = YahooPageClient::from_config(&AdvisorConfig::default()).unwrap();
        let info = client.company_info("AAPL").await;
        assert!(!info.name.is_empty());
    }
}
