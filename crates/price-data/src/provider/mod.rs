//! 일봉 데이터 Provider 모듈.
//!
//! 외부 시세 제공자는 "티커 + 날짜 범위" 조회 함수로만 취급합니다.
//! 조회는 실패하거나 일부/빈 데이터를 반환할 수 있습니다.
//!
//! ## Yahoo Finance
//! - `YahooDailyProvider`: `yahoo_finance_api` 기반 일봉 조회

pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchError;
use crate::model::RawPriceRow;

pub use yahoo::YahooDailyProvider;

/// 일봉 Provider trait.
#[async_trait]
pub trait DailyPriceProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 날짜 범위(양 끝 포함)의 일봉 원본 행 조회.
    ///
    /// 빈 벡터는 "해당 범위에 데이터 없음"을 의미하며 에러가 아닙니다.
    async fn fetch_daily(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawPriceRow>, FetchError>;
}
