//! 참조 종목에 없는 일봉(고아 레코드) 정리.

use price_data::PriceStore;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::Result;

/// 고아 일봉 정리기.
pub struct OrphanCleaner<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> OrphanCleaner<'a, S>
where
    S: PriceStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// 고아 레코드 삭제 (드라이런이면 삭제 예정 수만 반환).
    ///
    /// 참조 종목이 하나도 없으면 전체 삭제를 막기 위해 아무것도 하지 않습니다.
    pub async fn cleanup(&self, dry_run: bool) -> Result<u64> {
        let universe: HashSet<i64> = self
            .store
            .list_securities()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if universe.is_empty() {
            warn!("참조 종목이 비어 있어 고아 정리를 건너뜁니다");
            return Ok(0);
        }

        let mut orphans: Vec<i64> = self
            .store
            .priced_security_ids()
            .await?
            .into_iter()
            .filter(|id| !universe.contains(id))
            .collect();
        orphans.sort_unstable();
        orphans.dedup();

        if orphans.is_empty() {
            info!("고아 레코드 없음");
            return Ok(0);
        }

        if dry_run {
            let count = self.store.count_daily_prices_for(&orphans).await?;
            info!(
                orphan_securities = orphans.len(),
                records = count,
                "DRY RUN: 고아 레코드 삭제 예정"
            );
            return Ok(count.max(0) as u64);
        }

        let deleted = self.store.delete_daily_prices_for(&orphans).await?;
        info!(
            orphan_securities = orphans.len(),
            deleted = deleted,
            "고아 레코드 삭제 완료"
        );
        Ok(deleted)
    }
}
