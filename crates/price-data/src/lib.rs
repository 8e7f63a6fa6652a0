//! 일봉 데이터 관리.
//!
//! 이 crate는 다음을 제공합니다:
//! - 종목/일봉 도메인 타입
//! - 외부 시세 Provider 추상화 (Yahoo Finance 구현)
//! - 일봉 저장소 추상화 (PostgreSQL 구현)

pub mod error;
pub mod model;
pub mod provider;
pub mod storage;

pub use error::{DataError, FetchError, Result};
pub use model::{PriceRecord, RawPriceRow, Security};

// Provider 재내보내기
pub use provider::{DailyPriceProvider, YahooDailyProvider};

// 저장소 재내보내기
pub use storage::{DatabaseConfig, PgPriceStore, PriceStore};
