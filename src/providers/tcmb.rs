//! Central bank (TCMB) daily XML bulletin.
//!
//! The feed prices every currency in TRY, split into forex buying/selling,
//! and some currencies per 100 units (`<Unit>`). It is authoritative but slow
//! under load.

use crate::core::error::SourceError;
use crate::core::normalize::{NativeQuotes, SourceMeta, SpreadQuote, normalize};
use crate::core::rates::{DataQuality, RateSet, RateSource};
use crate::providers::util::{fetch_text, http_client, parse_number, start_of_day};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

pub const ID: &str = "tcmb";

/// Currency in which the bulletin is denominated.
const FEED_CURRENCY: &str = "TRY";

const RECOGNIZED: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "SEK", "NOK", "DKK", "SAR", "KWD", "AED",
    "CNY", "RUB", "IRR", "BGN", "RON", "AZN", "PKR", "QAR", "KRW", "INR", "BRL", "ZAR", "MXN",
    "PLN",
];

static CURRENCY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<Currency\b[^>]*?\bKod="([^"]+)"[^>]*>(.*?)</Currency>"#)
        .expect("valid currency block pattern")
});
static TARIH_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bTarih="(\d{2}\.\d{2}\.\d{4})""#).expect("valid Tarih pattern")
});
static DATE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bDate="(\d{2}/\d{2}/\d{4})""#).expect("valid Date pattern")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(\w+)>([^<]*)</\w+>").expect("valid tag pattern")
});

pub struct TcmbSource {
    url: String,
    timeout: Duration,
    domestic: String,
}

impl TcmbSource {
    pub fn new(url: &str, timeout: Duration, domestic: &str) -> Self {
        TcmbSource {
            url: url.to_string(),
            timeout,
            domestic: domestic.to_uppercase(),
        }
    }
}

fn bulletin_date(xml: &str) -> Option<DateTime<Utc>> {
    let tarih = TARIH_ATTR
        .captures(xml)
        .and_then(|c| NaiveDate::parse_from_str(&c[1], "%d.%m.%Y").ok());
    let date = tarih.or_else(|| {
        DATE_ATTR
            .captures(xml)
            .and_then(|c| NaiveDate::parse_from_str(&c[1], "%m/%d/%Y").ok())
    })?;
    Some(start_of_day(date))
}

fn tag_value<'a>(block: &'a str, name: &str) -> Option<&'a str> {
    TAG.captures_iter(block)
        .find(|c| &c[1] == name)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Extracts forex quotes for recognized currencies. Blocks with missing or
/// malformed prices are skipped.
fn parse_quotes(xml: &str) -> Result<Vec<SpreadQuote>, SourceError> {
    if !xml.contains("<Tarih_Date") && !xml.contains("<Currency") {
        return Err(SourceError::ParseError(
            "Response is not a TCMB rate bulletin".to_string(),
        ));
    }

    let mut quotes = Vec::new();
    for block in CURRENCY_BLOCK.captures_iter(xml) {
        let code = block[1].trim().to_uppercase();
        if !RECOGNIZED.contains(&code.as_str()) {
            continue;
        }
        let body = &block[2];

        let buying = tag_value(body, "ForexBuying").and_then(parse_number);
        let selling = tag_value(body, "ForexSelling").and_then(parse_number);
        let unit = tag_value(body, "Unit").map_or(Some(1.0), parse_number);

        match (buying, selling, unit) {
            (Some(buying), Some(selling), Some(unit)) => quotes.push(SpreadQuote {
                code,
                buying,
                selling,
                mid: None,
                unit,
            }),
            _ => debug!(code = %code, "Skipping TCMB entry without forex prices"),
        }
    }
    Ok(quotes)
}

fn parse_bulletin(xml: &str, domestic: &str) -> Result<RateSet, SourceError> {
    let quotes = parse_quotes(xml)?;
    let timestamp = bulletin_date(xml).unwrap_or_else(|| {
        debug!("No bulletin date in TCMB feed, using current time");
        Utc::now()
    });

    let meta = SourceMeta {
        source: "TCMB (Türkiye Cumhuriyet Merkez Bankası)".to_string(),
        quality: DataQuality::Official,
        reliability: "100%".to_string(),
        timestamp,
        domestic: FEED_CURRENCY.to_string(),
        spread: 0.0,
    };
    let rates = normalize(NativeQuotes::Domestic(quotes), &meta)?;

    if domestic.eq_ignore_ascii_case(FEED_CURRENCY) {
        return Ok(rates);
    }
    rates.rebased(domestic).ok_or_else(|| {
        SourceError::ParseError(format!("TCMB bulletin has no rate for {domestic}"))
    })
}

#[async_trait]
impl RateSource for TcmbSource {
    fn id(&self) -> &str {
        ID
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(name = "TcmbFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<RateSet, SourceError> {
        let client = http_client(self.timeout)?;
        let xml = fetch_text(&client, &self.url).await?;
        let rates = parse_bulletin(&xml, &self.domestic)?;
        debug!(entries = rates.len(), "Parsed TCMB bulletin");
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_BULLETIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-stylesheet type="text/xsl" href="isokur.xsl"?>
<Tarih_Date Tarih="17.10.2026" Date="10/17/2026" Bulten_No="2026/196">
  <Currency CrossOrder="0" Kod="USD" CurrencyCode="USD">
    <Unit>1</Unit>
    <Isim>ABD DOLARI</Isim>
    <CurrencyName>US DOLLAR</CurrencyName>
    <ForexBuying>34.10</ForexBuying>
    <ForexSelling>34.20</ForexSelling>
    <BanknoteBuying>34.08</BanknoteBuying>
    <BanknoteSelling>34.25</BanknoteSelling>
    <CrossRateUSD/>
    <CrossRateOther/>
  </Currency>
  <Currency CrossOrder="9" Kod="JPY" CurrencyCode="JPY">
    <Unit>100</Unit>
    <Isim>JAPON YENİ</Isim>
    <CurrencyName>JAPENESE YEN</CurrencyName>
    <ForexBuying>22.70</ForexBuying>
    <ForexSelling>22.90</ForexSelling>
    <BanknoteBuying>22.55</BanknoteBuying>
    <BanknoteSelling>23.05</BanknoteSelling>
    <CrossRateUSD>150.2</CrossRateUSD>
    <CrossRateOther/>
  </Currency>
  <Currency CrossOrder="1" Kod="EUR" CurrencyCode="EUR">
    <Unit>1</Unit>
    <Isim>EURO</Isim>
    <CurrencyName>EURO</CurrencyName>
    <ForexBuying></ForexBuying>
    <ForexSelling>37.10</ForexSelling>
  </Currency>
  <Currency CrossOrder="20" Kod="XDR" CurrencyCode="XDR">
    <Unit>1</Unit>
    <Isim>ÖZEL ÇEKME HAKKI (SDR)</Isim>
    <CurrencyName>SPECIAL DRAWING RIGHT (SDR)</CurrencyName>
    <ForexBuying>45.50</ForexBuying>
    <ForexSelling>45.60</ForexSelling>
  </Currency>
</Tarih_Date>"#;

    async fn create_tcmb_mock_server(body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kurlar/today.xml"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source_for(mock_server: &MockServer) -> TcmbSource {
        TcmbSource::new(
            &format!("{}/kurlar/today.xml", mock_server.uri()),
            Duration::from_secs(5),
            "TRY",
        )
    }

    #[tokio::test]
    async fn test_successful_tcmb_fetch() {
        let mock_server = create_tcmb_mock_server(SAMPLE_BULLETIN, 200).await;
        let rates = source_for(&mock_server).fetch().await.unwrap();

        assert_eq!(rates.data_quality, DataQuality::Official);
        assert_eq!(rates.base, "TRY");
        assert_eq!(rates.last_update, "2026-10-17");

        let usd = rates.get("USD").unwrap();
        assert_eq!(usd.buying, 34.10);
        assert_eq!(usd.selling, 34.20);
        assert!((usd.rate - 34.15).abs() < 1e-9);

        let jpy = rates.get("JPY").unwrap();
        assert!((jpy.selling - 0.229).abs() < 1e-12);

        // EUR has no buying price, XDR is not recognized
        assert!(rates.get("EUR").is_none());
        assert!(rates.get("XDR").is_none());
        assert_eq!(rates.get("TRY").unwrap().rate, 1.0);
        assert_eq!(rates.len(), 3);
    }

    #[tokio::test]
    async fn test_tcmb_server_error() {
        let mock_server = create_tcmb_mock_server("", 500).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_tcmb_unexpected_document() {
        let mock_server = create_tcmb_mock_server("<html><body>Bakım</body></html>", 200).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_tcmb_bulletin_without_usable_entries() {
        let xml = r#"<Tarih_Date Tarih="17.10.2026" Date="10/17/2026">
  <Currency Kod="XDR"><ForexBuying>45.5</ForexBuying><ForexSelling>45.6</ForexSelling></Currency>
</Tarih_Date>"#;
        let mock_server = create_tcmb_mock_server(xml, 200).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::EmptyResult(_))));
    }

    #[test]
    fn test_bulletin_date_fallbacks() {
        let only_date = r#"<Tarih_Date Date="10/16/2026"></Tarih_Date>"#;
        assert_eq!(
            bulletin_date(only_date).unwrap().format("%Y-%m-%d").to_string(),
            "2026-10-16"
        );
        assert!(bulletin_date("<Tarih_Date></Tarih_Date>").is_none());
    }

    #[test]
    fn test_rebased_to_other_domestic_currency() {
        let rates = parse_bulletin(SAMPLE_BULLETIN, "USD").unwrap();
        assert_eq!(rates.base, "USD");
        assert_eq!(rates.get("USD").unwrap().rate, 1.0);
        assert!((rates.get("TRY").unwrap().rate - 1.0 / 34.15).abs() < 1e-12);

        assert!(matches!(
            parse_bulletin(SAMPLE_BULLETIN, "GBP"),
            Err(SourceError::ParseError(_))
        ));
    }
}
