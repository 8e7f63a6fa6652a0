//! 재시도 포함 일봉 조회.
//!
//! 재시도 가능한 실패는 `base_delay * 2^retry` 만큼 대기 후 다시 시도합니다.
//! 최초 시도 1회 + 최대 `max_retries`회 재시도. `NotFound`는 즉시 실패합니다.

use chrono::NaiveDate;
use price_data::{DailyPriceProvider, FetchError, RawPriceRow};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 조회 성공 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRows {
    /// 원본 행 (비어 있으면 "데이터 없음")
    pub rows: Vec<RawPriceRow>,
    /// 사용한 시도 횟수
    pub attempts: u32,
}

/// 이번 실행에서 해당 티커를 포기한 조회 실패.
#[derive(Debug, Clone, Error)]
#[error("{ticker}: {error} (attempts: {attempts})")]
pub struct FetchFailure {
    pub ticker: String,
    pub attempts: u32,
    /// 마지막 에러
    pub error: FetchError,
}

/// 재시도/백오프 래퍼.
pub struct RetryingFetcher<'a, P: ?Sized> {
    provider: &'a P,
    max_retries: u32,
    base_delay: Duration,
}

impl<'a, P> RetryingFetcher<'a, P>
where
    P: DailyPriceProvider + ?Sized,
{
    pub fn new(provider: &'a P, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            provider,
            max_retries,
            base_delay,
        }
    }

    /// `retry`번째 재시도 전 대기 시간 (0부터 시작).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// 티커의 날짜 범위 일봉 조회.
    pub async fn fetch(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FetchedRows, FetchFailure> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let error = match self.provider.fetch_daily(ticker, start_date, end_date).await {
                Ok(rows) => return Ok(FetchedRows { rows, attempts }),
                Err(e) => e,
            };

            if !error.is_retryable() {
                warn!(ticker = ticker, error = %error, "재시도 불가 에러, 티커 건너뜀");
                return Err(FetchFailure {
                    ticker: ticker.to_string(),
                    attempts,
                    error,
                });
            }

            let retry = attempts - 1;
            if retry >= self.max_retries {
                warn!(
                    ticker = ticker,
                    attempts = attempts,
                    error = %error,
                    "조회 최종 실패"
                );
                return Err(FetchFailure {
                    ticker: ticker.to_string(),
                    attempts,
                    error,
                });
            }

            let delay = self.backoff_delay(retry);
            debug!(
                ticker = ticker,
                attempt = attempts,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "조회 재시도 예정"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
