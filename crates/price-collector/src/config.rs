//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use chrono::NaiveDate;
use price_data::DatabaseConfig;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 일봉 수집 설정
    pub ingest: IngestConfig,
}

/// 일봉 수집 설정
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// 배치당 티커 수
    pub batch_size: usize,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 배치 간 딜레이 (밀리초)
    pub batch_delay_ms: u64,
    /// 티커당 최대 재시도 횟수 (최초 시도 제외)
    pub max_retries: u32,
    /// 재시도 백오프 기준 딜레이 (밀리초)
    pub retry_base_delay_ms: u64,
    /// 진행률 표시 최소 갱신 간격 (밀리초)
    pub progress_refresh_ms: u64,
    /// 수집 시작 날짜 (기본: 1970-01-01)
    pub start_date: Option<NaiveDate>,
    /// 수집 종료 날짜 (기본: 오늘)
    pub end_date: Option<NaiveDate>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            request_delay_ms: 500,
            batch_delay_ms: 1000,
            max_retries: 3,
            retry_base_delay_ms: 500,
            progress_refresh_ms: 250,
            start_date: None,
            end_date: None,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 로드
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL").ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let mut database = DatabaseConfig::new(url);
        database.max_connections =
            env_var_parse(&lookup, "DATABASE_MAX_CONNECTIONS", database.max_connections);
        database.acquire_timeout_secs = env_var_parse(
            &lookup,
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            database.acquire_timeout_secs,
        );

        let defaults = IngestConfig::default();
        let ingest = IngestConfig {
            batch_size: env_var_parse(&lookup, "PRICE_BATCH_SIZE", defaults.batch_size),
            request_delay_ms: env_var_parse(
                &lookup,
                "PRICE_REQUEST_DELAY_MS",
                defaults.request_delay_ms,
            ),
            batch_delay_ms: env_var_parse(&lookup, "PRICE_BATCH_DELAY_MS", defaults.batch_delay_ms),
            max_retries: env_var_parse(&lookup, "PRICE_MAX_RETRIES", defaults.max_retries),
            retry_base_delay_ms: env_var_parse(
                &lookup,
                "PRICE_RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay_ms,
            ),
            progress_refresh_ms: env_var_parse(
                &lookup,
                "PRICE_PROGRESS_REFRESH_MS",
                defaults.progress_refresh_ms,
            ),
            start_date: parse_date_var(&lookup, "PRICE_START_DATE")?,
            end_date: parse_date_var(&lookup, "PRICE_END_DATE")?,
        };

        if ingest.batch_size == 0 {
            return Err(CollectorError::Config(
                "PRICE_BATCH_SIZE는 1 이상이어야 합니다".to_string(),
            ));
        }

        Ok(Self { database, ingest })
    }
}

impl IngestConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 배치 간 딜레이를 Duration으로 반환
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// 재시도 백오프 기준 딜레이를 Duration으로 반환
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// 진행률 갱신 간격을 Duration으로 반환
    pub fn progress_refresh(&self) -> Duration {
        Duration::from_millis(self.progress_refresh_ms)
    }
}

/// 날짜 문자열 파싱 (YYYY-MM-DD)
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: {}. Expected YYYY-MM-DD", s))
}

/// 초 단위 문자열을 밀리초로 변환 (음수/비유한 값 거부)
pub fn parse_seconds_as_millis(s: &str) -> std::result::Result<u64, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid seconds value: {}", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("Seconds must be a non-negative number: {}", s));
    }
    Ok((secs * 1000.0).round() as u64)
}

/// 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_date_var<F>(lookup: &F, key: &str) -> Result<Option<NaiveDate>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_date(&raw)
            .map(Some)
            .map_err(|e| CollectorError::Config(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}
