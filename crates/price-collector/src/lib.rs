//! 일봉 백필 수집기.
//!
//! 이 crate는 외부 시세 제공자에서 전체 종목의 과거 일봉을 가져와
//! 저장소에 적재하는 바이너리를 제공합니다:
//! - 요청 간/배치 간 지연으로 제공자 요청 한도 준수
//! - 지수 백오프 재시도
//! - 중복 안전 삽입 (이미 있는 날짜는 건너뜀)
//! - 진행률/남은 시간 표시
//! - 고아 일봉 정리 (명시적 요청 시에만)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::IngestionSummary;
