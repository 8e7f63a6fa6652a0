//! Yahoo Finance 일봉 Provider.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

use super::DailyPriceProvider;
use crate::error::FetchError;
use crate::model::RawPriceRow;

/// Yahoo Finance 기반 일봉 Provider.
pub struct YahooDailyProvider {
    connector: yahoo::YahooConnector,
}

impl YahooDailyProvider {
    /// 새로운 Provider 생성.
    pub fn new() -> Result<Self, FetchError> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| FetchError::Network(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl DailyPriceProvider for YahooDailyProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_daily(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawPriceRow>, FetchError> {
        // Yahoo의 종료 시각은 배타적이므로 다음날 자정까지 요청
        let start = naive_date_to_offset_datetime(start_date)?;
        let end = naive_date_to_offset_datetime(end_date.succ_opt().unwrap_or(end_date))?;

        debug!(
            ticker = ticker,
            start = %start_date,
            end = %end_date,
            "Yahoo Finance API 날짜 범위 호출"
        );

        let response = match self
            .connector
            .get_quote_history_interval(ticker, start, end, "1d")
            .await
        {
            Ok(response) => response,
            Err(e) => return empty_or_error(ticker, &e.to_string()),
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => return empty_or_error(ticker, &e.to_string()),
        };

        let rows: Vec<RawPriceRow> = quotes.iter().map(quote_to_row).collect();

        debug!(ticker = ticker, rows = rows.len(), "Yahoo Finance 일봉 수신");
        Ok(rows)
    }
}

/// Yahoo 시세 한 건을 원본 행으로 변환.
///
/// 라이브러리는 누락된 시가/고가/저가/수정 종가를 0으로 채우므로 0은 누락으로 취급합니다.
pub fn quote_to_row(quote: &yahoo::Quote) -> RawPriceRow {
    RawPriceRow {
        date: DateTime::from_timestamp(quote.timestamp, 0).map(|dt| dt.date_naive()),
        open: present(quote.open),
        high: present(quote.high),
        low: present(quote.low),
        close: Some(quote.close),
        adjusted_close: present(quote.adjclose),
        volume: Some(quote.volume as f64),
    }
}

fn present(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// 빈 데이터셋 응답은 성공으로, 그 외는 분류된 에러로 변환.
fn empty_or_error(ticker: &str, message: &str) -> Result<Vec<RawPriceRow>, FetchError> {
    let error = FetchError::classify(message);
    if !matches!(error, FetchError::NotFound(_)) && is_empty_dataset(message) {
        debug!(ticker = ticker, "Yahoo Finance 빈 데이터셋");
        return Ok(Vec::new());
    }
    Err(error)
}

fn is_empty_dataset(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("empty data") || lower.contains("no quotes")
}

/// NaiveDate를 OffsetDateTime(UTC 자정)으로 변환.
fn naive_date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, FetchError> {
    let month = time::Month::try_from(date.month() as u8)
        .map_err(|e| FetchError::Provider(format!("날짜 변환 실패 ({}): {}", date, e)))?;
    let day = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|e| FetchError::Provider(format!("날짜 변환 실패 ({}): {}", date, e)))?;
    Ok(day.midnight().assume_utc())
}
