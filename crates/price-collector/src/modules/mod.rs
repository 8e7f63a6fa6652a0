//! 일봉 수집 파이프라인 모듈.

pub mod daily_price_collect;
pub mod fetch;
pub mod normalize;
pub mod orphan_cleanup;
pub mod progress;
pub mod rate_limit;
pub mod writer;

pub use daily_price_collect::{
    collect_daily_prices, resolve_tickers, BatchJobState, CollectOptions, FailureReason,
    TickerOutcome, TickerSelection,
};
pub use fetch::{FetchFailure, FetchedRows, RetryingFetcher};
pub use normalize::{normalize, NormalizedBatch};
pub use orphan_cleanup::OrphanCleaner;
pub use progress::{ConsoleProgress, ProgressReporter, ProgressSnapshot, SilentProgress};
pub use rate_limit::RateLimiter;
pub use writer::{UpsertWriter, WriteResult};
