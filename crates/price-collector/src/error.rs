//! 에러 타입 정의.

use price_data::DataError;
use thiserror::Error;

/// Collector 에러 타입.
///
/// 종목 단위 실패는 요약에 집계되고 여기로 전파되지 않습니다.
/// 이 타입은 실행 전체를 중단시키는 경우만 표현합니다.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 저장소 에러 (시작 시 연결 실패 등)
    #[error("Storage error: {0}")]
    Storage(#[from] DataError),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 실행 전제 조건 위반 (예: 지정한 티커가 하나도 일치하지 않음)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// 외부 중단 요청
    #[error("Collection cancelled")]
    Cancelled,
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
