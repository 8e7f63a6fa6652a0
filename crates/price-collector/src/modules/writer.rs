//! 중복 안전 일봉 저장.

use price_data::{DataError, PriceRecord, PriceStore};
use tracing::{debug, error};

/// 종목 단위 저장 결과.
#[derive(Debug)]
pub struct WriteResult {
    /// 새로 저장된 (드라이런이면 저장 예정) 레코드 수
    pub written: usize,
    /// 저장 실패 시 에러
    pub error: Option<DataError>,
}

impl WriteResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 저장소에 "없으면 삽입" 방식으로 일봉을 기록합니다.
///
/// 실패는 해당 종목의 결과로만 보고되고 이미 저장된 다른 종목에는 영향이 없습니다.
pub struct UpsertWriter<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> UpsertWriter<'a, S>
where
    S: PriceStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn write(
        &self,
        security_id: i64,
        records: &[PriceRecord],
        dry_run: bool,
    ) -> WriteResult {
        if dry_run {
            debug!(security_id, would_write = records.len(), "DRY RUN: 저장 생략");
            return WriteResult {
                written: records.len(),
                error: None,
            };
        }

        if records.is_empty() {
            return WriteResult {
                written: 0,
                error: None,
            };
        }

        match self.store.insert_daily_prices(security_id, records).await {
            Ok(inserted) => WriteResult {
                written: inserted as usize,
                error: None,
            },
            Err(e) => {
                error!(security_id, error = %e, "일봉 저장 실패");
                WriteResult {
                    written: 0,
                    error: Some(e),
                }
            }
        }
    }
}
