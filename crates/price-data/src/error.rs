//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),

    /// 데이터 삭제 오류
    #[error("Delete error: {0}")]
    DeleteError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                if code == "23505" {
                    // PostgreSQL 고유 제약 조건 위반
                    DataError::DuplicateError(db_err.message().to_string())
                } else {
                    DataError::QueryError(db_err.message().to_string())
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// 외부 시세 Provider 조회 오류.
///
/// `NotFound`를 제외한 모든 오류는 재시도 대상입니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// 존재하지 않거나 상장폐지된 심볼
    #[error("Symbol not found: {0}")]
    NotFound(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 분류되지 않은 Provider 에러
    #[error("Provider error: {0}")]
    Provider(String),
}

impl FetchError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::NotFound(_))
    }

    /// 요약 리포트용 에러 분류명.
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "symbol not found (possibly delisted)",
            FetchError::RateLimited(_) => "rate limit exceeded",
            FetchError::Timeout(_) => "request timeout",
            FetchError::Network(_) => "network error",
            FetchError::Provider(_) => "provider error",
        }
    }

    /// Provider 에러 메시지를 텍스트 패턴으로 분류.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("not found")
            || lower.contains("404")
            || lower.contains("delisted")
            || lower.contains("no timezone found")
        {
            FetchError::NotFound(message.to_string())
        } else if lower.contains("too many requests")
            || lower.contains("429")
            || lower.contains("rate limit")
        {
            FetchError::RateLimited(message.to_string())
        } else if lower.contains("timeout") || lower.contains("timed out") {
            FetchError::Timeout(message.to_string())
        } else if lower.contains("connection") || lower.contains("network") {
            FetchError::Network(message.to_string())
        } else {
            FetchError::Provider(message.to_string())
        }
    }
}
