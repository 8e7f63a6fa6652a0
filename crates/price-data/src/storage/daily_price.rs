//! PostgreSQL 일봉 저장소.
//!
//! `daily_price` 테이블은 `(security_id, date)` 고유 제약을 가져야 합니다.
//! 스키마는 `migrations/` 의 참조 DDL을 따릅니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use price_data::{DatabaseConfig, PgPriceStore, PriceStore};
//!
//! let store = PgPriceStore::connect(&DatabaseConfig::new(url)).await?;
//! let inserted = store.insert_daily_prices(security.id, &records).await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{DatabaseConfig, PriceStore};
use crate::error::{DataError, Result};
use crate::model::{PriceRecord, Security};

/// UNNEST 일괄 삽입 청크 크기
const INSERT_CHUNK_SIZE: usize = 1000;

/// PostgreSQL 기반 일봉 저장소.
#[derive(Clone)]
pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    /// 연결 풀을 생성합니다. 연결할 수 없으면 즉시 실패합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("데이터베이스 연결 중...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("데이터베이스 연결 성공");
        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 생성합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 풀 종료.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn list_securities(&self) -> Result<Vec<Security>> {
        sqlx::query_as("SELECT id, ticker FROM security ORDER BY ticker")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn find_securities(&self, tickers: &[String]) -> Result<Vec<Security>> {
        let upper: Vec<String> = tickers.iter().map(|t| t.to_uppercase()).collect();

        sqlx::query_as("SELECT id, ticker FROM security WHERE UPPER(ticker) = ANY($1)")
            .bind(&upper)
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_daily_prices(
        &self,
        security_id: i64,
        records: &[PriceRecord],
    ) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;

        // UNNEST 패턴으로 일괄 삽입, 중복 자연키는 건너뜀
        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let security_ids: Vec<i64> = chunk.iter().map(|_| security_id).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|r| r.date).collect();
            let opens: Vec<Option<Decimal>> = chunk.iter().map(|r| r.open).collect();
            let highs: Vec<Option<Decimal>> = chunk.iter().map(|r| r.high).collect();
            let lows: Vec<Option<Decimal>> = chunk.iter().map(|r| r.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|r| r.close).collect();
            let adjusted: Vec<Decimal> = chunk.iter().map(|r| r.adjusted_close).collect();
            let volumes: Vec<Option<i64>> = chunk.iter().map(|r| r.volume).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO daily_price
                    (security_id, date, open, high, low, close, adjusted_close, volume)
                SELECT * FROM UNNEST(
                    $1::bigint[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
                    $8::bigint[]
                )
                ON CONFLICT (security_id, date) DO NOTHING
                "#,
            )
            .bind(&security_ids)
            .bind(&dates)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&adjusted)
            .bind(&volumes)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected();
        }

        debug!(
            security_id = security_id,
            requested = records.len(),
            inserted = inserted,
            "일봉 저장"
        );

        Ok(inserted)
    }

    async fn count_daily_prices(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM daily_price")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn priced_security_ids(&self) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT DISTINCT security_id FROM daily_price ORDER BY security_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn count_daily_prices_for(&self, security_ids: &[i64]) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM daily_price WHERE security_id = ANY($1)")
                .bind(security_ids)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(securities = security_ids.len()))]
    async fn delete_daily_prices_for(&self, security_ids: &[i64]) -> Result<u64> {
        if security_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM daily_price WHERE security_id = ANY($1)")
            .bind(security_ids)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::DeleteError(e.to_string()))?;

        info!(deleted = result.rows_affected(), "일봉 삭제");
        Ok(result.rows_affected())
    }
}
