//! Provider 원본 행을 일봉 레코드로 정규화.

use price_data::{PriceRecord, RawPriceRow};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// 가격 소수점 자리수
const PRICE_SCALE: u32 = 4;

/// 정규화 결과.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// 날짜 오름차순 레코드
    pub records: Vec<PriceRecord>,
    /// 날짜 또는 종가 누락으로 버려진 행 수
    pub missing_fields: usize,
    /// 음수/NaN 등 품질 문제나 중복 날짜로 버려진 행 수
    pub quality_skips: usize,
}

impl NormalizedBatch {
    /// 버려진 전체 행 수
    pub fn dropped(&self) -> usize {
        self.missing_fields + self.quality_skips
    }
}

/// 원본 행을 정규화합니다.
///
/// 행 단위로만 버리고 배치 전체를 실패시키지 않습니다.
pub fn normalize(security_id: i64, rows: &[RawPriceRow]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut by_date: BTreeMap<chrono::NaiveDate, PriceRecord> = BTreeMap::new();

    for row in rows {
        let (date, close) = match (row.date, row.close) {
            (Some(date), Some(close)) => (date, close),
            _ => {
                batch.missing_fields += 1;
                continue;
            }
        };

        let Some(record) = to_record(security_id, date, close, row) else {
            batch.quality_skips += 1;
            continue;
        };

        if by_date.contains_key(&date) {
            batch.quality_skips += 1;
            continue;
        }
        by_date.insert(date, record);
    }

    batch.records = by_date.into_values().collect();
    batch
}

fn to_record(
    security_id: i64,
    date: chrono::NaiveDate,
    close: f64,
    row: &RawPriceRow,
) -> Option<PriceRecord> {
    let close = to_price(close)?;
    let open = optional(row.open, to_price)?;
    let high = optional(row.high, to_price)?;
    let low = optional(row.low, to_price)?;
    let adjusted_close = optional(row.adjusted_close, to_price)?.unwrap_or(close);
    let volume = optional(row.volume, to_volume)?;

    Some(PriceRecord {
        security_id,
        date,
        open,
        high,
        low,
        close,
        adjusted_close,
        volume,
    })
}

/// 값이 없으면 `Some(None)`, 있는데 변환 실패면 `None`.
fn optional<T>(value: Option<f64>, convert: fn(f64) -> Option<T>) -> Option<Option<T>> {
    match value {
        None => Some(None),
        Some(v) => convert(v).map(Some),
    }
}

fn to_price(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Decimal::from_f64_retain(value).map(|d| d.round_dp(PRICE_SCALE))
}

fn to_volume(value: f64) -> Option<i64> {
    if !value.is_finite() || value < 0.0 || value > i64::MAX as f64 {
        return None;
    }
    Some(value.round() as i64)
}
