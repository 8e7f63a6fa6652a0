//! 통합 테스트용 인메모리 저장소/Provider.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use price_collector::modules::{CollectOptions, ProgressReporter, TickerSelection};
use price_data::{
    DailyPriceProvider, DataError, FetchError, PriceRecord, PriceStore, RawPriceRow, Security,
};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// `(security_id, date)` 유일성을 지키는 인메모리 저장소.
#[derive(Default)]
pub struct MemoryPriceStore {
    securities: Mutex<Vec<Security>>,
    prices: Mutex<BTreeMap<(i64, NaiveDate), PriceRecord>>,
    failing_inserts: Mutex<HashSet<i64>>,
}

impl MemoryPriceStore {
    pub fn with_securities(securities: &[(i64, &str)]) -> Self {
        let store = Self::default();
        *store.securities.lock().unwrap() = securities
            .iter()
            .map(|(id, ticker)| Security::new(*id, *ticker))
            .collect();
        store
    }

    /// 해당 종목의 삽입을 항상 실패시킴.
    pub fn fail_inserts_for(&self, security_id: i64) {
        self.failing_inserts.lock().unwrap().insert(security_id);
    }

    pub fn remove_security(&self, security_id: i64) {
        self.securities.lock().unwrap().retain(|s| s.id != security_id);
    }

    /// 임의 일봉 `count`개를 직접 적재.
    pub fn seed_prices(&self, security_id: i64, count: usize) {
        let mut prices = self.prices.lock().unwrap();
        for (i, date) in trading_days(count).into_iter().enumerate() {
            let close = dec!(100) + rust_decimal::Decimal::from(i as i64);
            prices.insert(
                (security_id, date),
                PriceRecord {
                    security_id,
                    date,
                    open: None,
                    high: None,
                    low: None,
                    close,
                    adjusted_close: close,
                    volume: None,
                },
            );
        }
    }

    pub fn price_count(&self) -> usize {
        self.prices.lock().unwrap().len()
    }

    pub fn price_count_for(&self, security_id: i64) -> usize {
        self.prices
            .lock()
            .unwrap()
            .keys()
            .filter(|(id, _)| *id == security_id)
            .count()
    }

    pub fn record(&self, security_id: i64, date: NaiveDate) -> Option<PriceRecord> {
        self.prices.lock().unwrap().get(&(security_id, date)).cloned()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn list_securities(&self) -> price_data::Result<Vec<Security>> {
        let mut securities = self.securities.lock().unwrap().clone();
        securities.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(securities)
    }

    async fn find_securities(&self, tickers: &[String]) -> price_data::Result<Vec<Security>> {
        let wanted: HashSet<String> = tickers.iter().map(|t| t.to_uppercase()).collect();
        Ok(self
            .securities
            .lock()
            .unwrap()
            .iter()
            .filter(|s| wanted.contains(&s.ticker.to_uppercase()))
            .cloned()
            .collect())
    }

    async fn insert_daily_prices(
        &self,
        security_id: i64,
        records: &[PriceRecord],
    ) -> price_data::Result<u64> {
        if self.failing_inserts.lock().unwrap().contains(&security_id) {
            return Err(DataError::InsertError(format!(
                "simulated failure for security {}",
                security_id
            )));
        }

        let mut prices = self.prices.lock().unwrap();
        let mut inserted = 0;
        for record in records {
            let key = (record.security_id, record.date);
            if let std::collections::btree_map::Entry::Vacant(entry) = prices.entry(key) {
                entry.insert(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn count_daily_prices(&self) -> price_data::Result<i64> {
        Ok(self.price_count() as i64)
    }

    async fn priced_security_ids(&self) -> price_data::Result<Vec<i64>> {
        let ids: HashSet<i64> = self.prices.lock().unwrap().keys().map(|(id, _)| *id).collect();
        Ok(ids.into_iter().collect())
    }

    async fn count_daily_prices_for(&self, security_ids: &[i64]) -> price_data::Result<i64> {
        Ok(self
            .prices
            .lock()
            .unwrap()
            .keys()
            .filter(|(id, _)| security_ids.contains(id))
            .count() as i64)
    }

    async fn delete_daily_prices_for(&self, security_ids: &[i64]) -> price_data::Result<u64> {
        let mut prices = self.prices.lock().unwrap();
        let before = prices.len();
        prices.retain(|(id, _), _| !security_ids.contains(id));
        Ok((before - prices.len()) as u64)
    }
}

type Response = Result<Vec<RawPriceRow>, FetchError>;

/// 티커별로 정해진 응답을 돌려주는 Provider.
///
/// 등록되지 않은 티커는 `NotFound`.
#[derive(Default)]
pub struct ScriptedProvider {
    fixed: Mutex<HashMap<String, Response>>,
    queued: Mutex<HashMap<String, VecDeque<Response>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항상 같은 응답.
    pub fn respond(self, ticker: &str, response: Response) -> Self {
        self.fixed
            .lock()
            .unwrap()
            .insert(ticker.to_uppercase(), response);
        self
    }

    /// 순서대로 소진되는 응답. 소진 후에는 `respond` 응답 사용.
    pub fn respond_sequence(self, ticker: &str, responses: Vec<Response>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .insert(ticker.to_uppercase(), responses.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(ticker, _)| ticker.clone())
            .collect()
    }

    pub fn call_count(&self, ticker: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t.eq_ignore_ascii_case(ticker))
            .count()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl DailyPriceProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_daily(
        &self,
        ticker: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<RawPriceRow>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((ticker.to_string(), Instant::now()));

        let key = ticker.to_uppercase();
        if let Some(response) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
        {
            return response;
        }

        self.fixed
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::NotFound(format!(
                    "{}: No data found, symbol may be delisted",
                    ticker
                )))
            })
    }
}

/// 갱신 기록용 Reporter. 지정한 완료 수에 도달하면 토큰을 취소합니다.
#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Vec<(usize, usize)>,
    cancel_at: Option<(usize, CancellationToken)>,
}

impl RecordingProgress {
    pub fn cancelling_at(completed: usize, token: CancellationToken) -> Self {
        Self {
            updates: Vec::new(),
            cancel_at: Some((completed, token)),
        }
    }
}

impl ProgressReporter for RecordingProgress {
    fn update(&mut self, completed: usize, total: usize, _started_at: Instant) {
        self.updates.push((completed, total));
        if let Some((at, token)) = &self.cancel_at {
            if completed >= *at {
                token.cancel();
            }
        }
    }
}

/// 2024-01-02부터 평일 `count`일.
pub fn trading_days(count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    while days.len() < count {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(date);
        }
        date += ChronoDuration::days(1);
    }
    days
}

/// 정상 원본 행 `count`개.
pub fn sample_rows(count: usize) -> Vec<RawPriceRow> {
    trading_days(count)
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let close = 150.0 + (i % 20) as f64 * 0.25;
            RawPriceRow {
                date: Some(date),
                open: Some(close - 0.5),
                high: Some(close + 1.0),
                low: Some(close - 1.0),
                close: Some(close),
                adjusted_close: Some(close * 0.99),
                volume: Some(1_000_000.0 + i as f64),
            }
        })
        .collect()
}

/// 2024년 전체, 지연 없는 테스트 옵션.
pub fn test_options(selection: TickerSelection) -> CollectOptions {
    CollectOptions {
        selection,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        batch_size: 100,
        max_retries: 3,
        retry_base_delay: Duration::from_millis(10),
        request_delay: Duration::ZERO,
        batch_delay: Duration::ZERO,
        dry_run: false,
        cleanup: false,
    }
}
