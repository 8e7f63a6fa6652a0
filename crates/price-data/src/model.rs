//! 종목 및 일봉 도메인 타입.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 참조 종목.
///
/// 수집 파이프라인에서는 읽기 전용으로만 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Security {
    pub id: i64,
    pub ticker: String,
}

impl Security {
    pub fn new(id: i64, ticker: impl Into<String>) -> Self {
        Self {
            id,
            ticker: ticker.into(),
        }
    }
}

/// 하루치 일봉 레코드.
///
/// `(security_id, date)`가 저장소 전체에서 유일한 자연키입니다.
/// 한 번 저장된 레코드는 갱신되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub security_id: i64,
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: Option<i64>,
}

/// Provider 응답 원본 행 (정규화 전).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPriceRow {
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
}
