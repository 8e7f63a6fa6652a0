//! 요청/배치 간 지연.
//!
//! 단일 작업자가 순차적으로 요청하므로 고정 지연이 곧 요청 한도가 됩니다.

use std::time::Duration;

use crate::config::IngestConfig;

/// 요청 간, 배치 간 고정 지연을 적용하는 Rate limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    request_delay: Duration,
    batch_delay: Duration,
}

impl RateLimiter {
    pub fn new(request_delay: Duration, batch_delay: Duration) -> Self {
        Self {
            request_delay,
            batch_delay,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.request_delay(), config.batch_delay())
    }

    /// 외부 요청 직전 대기.
    pub async fn wait_before_request(&self) {
        sleep_unless_zero(self.request_delay).await;
    }

    /// 배치 경계에서 대기.
    pub async fn wait_before_batch(&self) {
        sleep_unless_zero(self.batch_delay).await;
    }
}

async fn sleep_unless_zero(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
