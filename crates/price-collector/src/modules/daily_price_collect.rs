//! 일봉 백필 수집 모듈.
//!
//! 티커 결정 → 배치 분할 → 티커별 (조회 → 정규화 → 저장 → 진행률) → 요약 → (선택) 고아 정리.
//! 개별 티커 실패는 요약에 집계되고 실행을 중단시키지 않습니다.

use chrono::NaiveDate;
use price_data::{DailyPriceProvider, PriceStore, Security};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::fetch::{FetchFailure, RetryingFetcher};
use super::normalize::{normalize, NormalizedBatch};
use super::orphan_cleanup::OrphanCleaner;
use super::progress::ProgressReporter;
use super::rate_limit::RateLimiter;
use super::writer::UpsertWriter;
use crate::config::IngestConfig;
use crate::error::CollectorError;
use crate::{IngestionSummary, Result};

/// 수집 대상 티커 선택.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerSelection {
    /// 저장소의 전체 종목 (티커 순)
    All,
    /// 지정한 티커만 (입력 순서 유지, 대소문자 무시)
    Explicit(Vec<String>),
}

impl TickerSelection {
    /// 쉼표 구분 목록 파싱. 없으면 전체 선택.
    pub fn from_list(tickers: Option<&str>) -> Self {
        match tickers {
            Some(list) => TickerSelection::Explicit(
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            None => TickerSelection::All,
        }
    }
}

/// 1회 수집 실행 옵션.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub selection: TickerSelection,
    /// 시작일 (포함)
    pub start_date: NaiveDate,
    /// 종료일 (포함)
    pub end_date: NaiveDate,
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub request_delay: Duration,
    pub batch_delay: Duration,
    pub dry_run: bool,
    /// 수집 후 고아 정리 실행 여부
    pub cleanup: bool,
}

impl CollectOptions {
    /// 설정값으로 옵션 생성. 날짜 미지정 시 1970-01-01 ~ `today`.
    pub fn from_config(
        config: &IngestConfig,
        selection: TickerSelection,
        today: NaiveDate,
    ) -> Self {
        Self {
            selection,
            // NaiveDate 기본값은 1970-01-01
            start_date: config.start_date.unwrap_or_default(),
            end_date: config.end_date.unwrap_or(today),
            batch_size: config.batch_size,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay(),
            request_delay: config.request_delay(),
            batch_delay: config.batch_delay(),
            dry_run: false,
            cleanup: false,
        }
    }
}

/// 티커 실패 사유.
#[derive(Debug, Clone)]
pub enum FailureReason {
    /// 조회 실패 (재시도 소진 또는 존재하지 않는 심볼)
    Fetch(FetchFailure),
    /// 저장 실패
    Storage(String),
}

impl FailureReason {
    /// 요약 그룹 분류명.
    pub fn category(&self) -> &'static str {
        match self {
            FailureReason::Fetch(failure) => failure.error.category(),
            FailureReason::Storage(_) => "storage error",
        }
    }
}

/// 티커 단위 처리 결과.
#[derive(Debug, Clone)]
pub enum TickerOutcome {
    /// 저장 완료 (드라이런이면 저장 예정 수)
    Written { records: usize },
    /// 조회는 성공했으나 기간 내 데이터 없음
    Empty,
    Failed(FailureReason),
}

/// 한 번의 실행 동안만 유지되는 작업 상태.
#[derive(Debug)]
pub struct BatchJobState {
    pub total: usize,
    pub completed: usize,
    pub started_at: Instant,
    pub dry_run: bool,
    pub quality_skips: usize,
    pub missing_fields: usize,
    pub outcomes: Vec<(String, TickerOutcome)>,
}

impl BatchJobState {
    pub fn new(total: usize, dry_run: bool) -> Self {
        Self {
            total,
            completed: 0,
            started_at: Instant::now(),
            dry_run,
            quality_skips: 0,
            missing_fields: 0,
            outcomes: Vec::with_capacity(total),
        }
    }

    /// 정규화 단계에서 버려진 행 집계.
    pub fn count_dropped(&mut self, batch: &NormalizedBatch) {
        self.quality_skips += batch.quality_skips;
        self.missing_fields += batch.missing_fields;
    }

    /// 티커 결과 기록.
    pub fn record(&mut self, ticker: &str, outcome: TickerOutcome) {
        self.completed += 1;
        let progress = format!("{}/{}", self.completed, self.total);

        match &outcome {
            TickerOutcome::Written { records } => {
                debug!(
                    ticker = ticker,
                    records = records,
                    progress = %progress,
                    "수집 및 저장 완료"
                );
            }
            TickerOutcome::Empty => {
                debug!(ticker = ticker, progress = %progress, "데이터 없음");
            }
            TickerOutcome::Failed(reason) => {
                error!(
                    ticker = ticker,
                    category = reason.category(),
                    progress = %progress,
                    "티커 처리 실패"
                );
            }
        }

        self.outcomes.push((ticker.to_string(), outcome));
    }

    /// 요약으로 변환.
    pub fn to_summary(&self) -> IngestionSummary {
        let mut summary = IngestionSummary::new(self.dry_run);
        summary.total = self.completed;
        summary.quality_skips = self.quality_skips;
        summary.missing_fields = self.missing_fields;

        for (ticker, outcome) in &self.outcomes {
            match outcome {
                TickerOutcome::Written { records } => {
                    summary.success += 1;
                    summary.records_written += records;
                }
                TickerOutcome::Empty => {
                    summary.success += 1;
                    summary.empty += 1;
                }
                TickerOutcome::Failed(reason) => {
                    summary.failed += 1;
                    summary
                        .error_groups
                        .entry(reason.category().to_string())
                        .or_default()
                        .push(ticker.clone());
                }
            }
        }

        summary.elapsed = self.started_at.elapsed();
        summary
    }
}

/// 심볼 형식 검사 (영문자, 숫자, 마침표만 허용).
pub fn is_valid_symbol(ticker: &str) -> bool {
    !ticker.is_empty() && ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// 수집 대상 종목 결정.
pub async fn resolve_tickers<S>(store: &S, selection: &TickerSelection) -> Result<Vec<Security>>
where
    S: PriceStore + ?Sized,
{
    match selection {
        TickerSelection::All => {
            let mut securities: Vec<Security> = store
                .list_securities()
                .await?
                .into_iter()
                .filter(|s| {
                    let valid = is_valid_symbol(&s.ticker);
                    if !valid {
                        warn!(ticker = %s.ticker, "잘못된 심볼 형식, 건너뜀");
                    }
                    valid
                })
                .collect();
            securities.sort_by(|a, b| a.ticker.cmp(&b.ticker));
            info!(count = securities.len(), "전체 종목 조회 완료");
            Ok(securities)
        }
        TickerSelection::Explicit(requested) => {
            let mut wanted: Vec<String> = Vec::with_capacity(requested.len());
            for ticker in requested {
                let ticker = ticker.trim();
                if !is_valid_symbol(ticker) {
                    warn!(ticker = ticker, "잘못된 심볼 형식, 건너뜀");
                    continue;
                }
                if !wanted.iter().any(|w| w.eq_ignore_ascii_case(ticker)) {
                    wanted.push(ticker.to_string());
                }
            }

            if wanted.is_empty() {
                return Err(CollectorError::Precondition(
                    "유효한 티커가 지정되지 않았습니다".to_string(),
                ));
            }

            let by_ticker: HashMap<String, Security> = store
                .find_securities(&wanted)
                .await?
                .into_iter()
                .map(|s| (s.ticker.to_uppercase(), s))
                .collect();

            let mut securities = Vec::with_capacity(wanted.len());
            for ticker in &wanted {
                match by_ticker.get(&ticker.to_uppercase()) {
                    Some(security) => securities.push(security.clone()),
                    None => warn!(ticker = %ticker, "저장소에 없는 티커, 건너뜀"),
                }
            }

            if securities.is_empty() {
                return Err(CollectorError::Precondition(format!(
                    "지정한 티커가 저장소에 없습니다: {}",
                    wanted.join(", ")
                )));
            }

            info!(
                requested = requested.len(),
                matched = securities.len(),
                "지정 티커 조회 완료"
            );
            Ok(securities)
        }
    }
}

/// 일봉 백필 수집.
pub async fn collect_daily_prices<S, P>(
    store: &S,
    provider: &P,
    options: &CollectOptions,
    progress: &mut dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Result<IngestionSummary>
where
    S: PriceStore + ?Sized,
    P: DailyPriceProvider + ?Sized,
{
    if options.start_date > options.end_date {
        return Err(CollectorError::Precondition(format!(
            "시작일({})이 종료일({})보다 늦습니다",
            options.start_date, options.end_date
        )));
    }

    info!(
        provider = provider.name(),
        start_date = %options.start_date,
        end_date = %options.end_date,
        dry_run = options.dry_run,
        "일봉 수집 시작"
    );

    let securities = resolve_tickers(store, &options.selection).await?;
    let mut state = BatchJobState::new(securities.len(), options.dry_run);

    if securities.is_empty() {
        warn!("수집할 종목이 없습니다");
        return Ok(state.to_summary());
    }

    let limiter = RateLimiter::new(options.request_delay, options.batch_delay);
    let fetcher = RetryingFetcher::new(provider, options.max_retries, options.retry_base_delay);
    let writer = UpsertWriter::new(store);
    let batch_size = options.batch_size.max(1);
    let batch_count = securities.len().div_ceil(batch_size);

    progress.update(0, state.total, state.started_at);

    for (batch_idx, batch) in securities.chunks(batch_size).enumerate() {
        if batch_idx > 0 {
            limiter.wait_before_batch().await;
        }
        debug!(
            batch = batch_idx + 1,
            batches = batch_count,
            tickers = batch.len(),
            "배치 시작"
        );

        for security in batch {
            if cancel.is_cancelled() {
                warn!(
                    completed = state.completed,
                    total = state.total,
                    "수집 중단 요청"
                );
                return Err(CollectorError::Cancelled);
            }

            limiter.wait_before_request().await;

            let outcome = match fetcher
                .fetch(&security.ticker, options.start_date, options.end_date)
                .await
            {
                Err(failure) => TickerOutcome::Failed(FailureReason::Fetch(failure)),
                Ok(fetched) if fetched.rows.is_empty() => TickerOutcome::Empty,
                Ok(fetched) => {
                    let normalized = normalize(security.id, &fetched.rows);
                    if normalized.dropped() > 0 {
                        debug!(
                            ticker = %security.ticker,
                            missing_fields = normalized.missing_fields,
                            quality_skips = normalized.quality_skips,
                            "일부 행 제외"
                        );
                    }
                    state.count_dropped(&normalized);

                    let result = writer
                        .write(security.id, &normalized.records, options.dry_run)
                        .await;
                    match result.error {
                        Some(e) => TickerOutcome::Failed(FailureReason::Storage(e.to_string())),
                        None => TickerOutcome::Written {
                            records: result.written,
                        },
                    }
                }
            };

            state.record(&security.ticker, outcome);
            progress.update(state.completed, state.total, state.started_at);
        }
    }

    let mut summary = state.to_summary();

    if options.cleanup {
        match OrphanCleaner::new(store).cleanup(options.dry_run).await {
            Ok(deleted) => summary.orphans_deleted = Some(deleted),
            Err(e) => warn!(error = %e, "고아 정리 실패"),
        }
    }

    match store.count_daily_prices().await {
        Ok(count) => summary.store_total = Some(count),
        Err(e) => warn!(error = %e, "저장소 일봉 수 조회 실패"),
    }

    summary.elapsed = state.started_at.elapsed();
    Ok(summary)
}
