//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 에러 그룹당 로그에 나열할 최대 티커 수
const MAX_TICKERS_PER_GROUP: usize = 10;

/// 일봉 수집 실행 요약
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionSummary {
    /// 처리한 티커 수
    pub total: usize,
    /// 성공 횟수 (빈 데이터 포함)
    pub success: usize,
    /// 실패 횟수 (조회 실패 + 저장 실패)
    pub failed: usize,
    /// 빈 데이터 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 저장된 레코드 수 (드라이런이면 저장 예정 수)
    pub records_written: usize,
    /// 품질 문제로 버려진 행 수
    pub quality_skips: usize,
    /// 필수 필드(날짜/종가) 누락으로 버려진 행 수
    pub missing_fields: usize,
    /// 드라이런 여부
    pub dry_run: bool,
    /// 실행 후 저장소의 전체 일봉 수
    pub store_total: Option<i64>,
    /// 고아 정리로 삭제된 (또는 삭제 예정) 레코드 수
    pub orphans_deleted: Option<u64>,
    /// 에러 분류별 실패 티커
    pub error_groups: BTreeMap<String, Vec<String>>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl IngestionSummary {
    /// 새 요약 객체 생성
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        for (category, tickers) in &self.error_groups {
            tracing::warn!(
                category = category.as_str(),
                count = tickers.len(),
                tickers = %format_ticker_group(tickers),
                "실패 그룹"
            );
        }

        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            failed = self.failed,
            empty = self.empty,
            records_written = self.records_written,
            quality_skips = self.quality_skips,
            missing_fields = self.missing_fields,
            dry_run = self.dry_run,
            store_total = ?self.store_total,
            orphans_deleted = ?self.orphans_deleted,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

/// 실패 티커 목록을 최대 10개까지 나열하고 나머지는 개수로 표시.
pub fn format_ticker_group(tickers: &[String]) -> String {
    let shown = tickers
        .iter()
        .take(MAX_TICKERS_PER_GROUP)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if tickers.len() > MAX_TICKERS_PER_GROUP {
        format!(
            "{} and {} more...",
            shown,
            tickers.len() - MAX_TICKERS_PER_GROUP
        )
    } else {
        shown
    }
}
