//! 일봉 백필 수집기 CLI.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use price_collector::config::{parse_date, parse_seconds_as_millis};
use price_collector::modules::{
    self, CollectOptions, ConsoleProgress, OrphanCleaner, ProgressReporter, SilentProgress,
    TickerSelection,
};
use price_collector::{CollectorConfig, CollectorError};
use price_data::{PgPriceStore, YahooDailyProvider};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "price-collector")]
#[command(about = "Daily price backfill collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 일봉 데이터 백필 수집
    Collect {
        /// 특정 티커만 수집 (쉼표로 구분, 예: "AAPL,MSFT")
        #[arg(long)]
        tickers: Option<String>,

        /// 시작일 (YYYY-MM-DD, 기본: 1970-01-01)
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,

        /// 종료일 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long, value_parser = parse_date)]
        end_date: Option<NaiveDate>,

        /// 배치당 티커 수
        #[arg(long)]
        batch_size: Option<usize>,

        /// 요청 간 딜레이 (초)
        #[arg(long, value_parser = parse_seconds_as_millis)]
        delay: Option<u64>,

        /// 배치 간 딜레이 (초)
        #[arg(long, value_parser = parse_seconds_as_millis)]
        batch_delay: Option<u64>,

        /// 티커당 최대 재시도 횟수
        #[arg(long)]
        max_retries: Option<u32>,

        /// 저장하지 않고 조회/정규화만 수행
        #[arg(long)]
        dry_run: bool,

        /// 수집 후 고아 일봉 정리
        #[arg(long)]
        cleanup: bool,

        /// 진행률 표시 끄기
        #[arg(long)]
        no_progress: bool,

        /// 요약을 JSON으로 표준 출력에 기록
        #[arg(long)]
        json: bool,
    },

    /// 참조 종목에 없는 일봉 정리
    Cleanup {
        /// 삭제하지 않고 삭제 예정 수만 보고
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "price_collector={lvl},price_data={lvl}",
                    lvl = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("일봉 수집기 시작");

    // 설정 로드
    let mut config = CollectorConfig::from_env()?;
    tracing::debug!(
        max_connections = config.database.max_connections,
        "설정 로드 완료"
    );

    // DB 연결
    let store = PgPriceStore::connect(&config.database).await?;
    tracing::info!("데이터베이스 연결 성공");

    let result = run(cli.command, &mut config, &store).await;

    store.close().await;
    tracing::info!("일봉 수집기 종료");

    result
}

async fn run(
    command: Commands,
    config: &mut CollectorConfig,
    store: &PgPriceStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Collect {
            tickers,
            start_date,
            end_date,
            batch_size,
            delay,
            batch_delay,
            max_retries,
            dry_run,
            cleanup,
            no_progress,
            json,
        } => {
            // CLI 인자가 환경변수보다 우선
            let ingest = &mut config.ingest;
            if start_date.is_some() {
                ingest.start_date = start_date;
            }
            if end_date.is_some() {
                ingest.end_date = end_date;
            }
            if let Some(size) = batch_size {
                if size == 0 {
                    return Err(CollectorError::Config(
                        "--batch-size는 1 이상이어야 합니다".into(),
                    )
                    .into());
                }
                ingest.batch_size = size;
            }
            if let Some(ms) = delay {
                ingest.request_delay_ms = ms;
            }
            if let Some(ms) = batch_delay {
                ingest.batch_delay_ms = ms;
            }
            if let Some(retries) = max_retries {
                ingest.max_retries = retries;
            }

            let today = Utc::now().date_naive();
            let mut options = CollectOptions::from_config(
                ingest,
                TickerSelection::from_list(tickers.as_deref()),
                today,
            );
            options.dry_run = dry_run;
            options.cleanup = cleanup;

            if dry_run {
                tracing::info!("DRY RUN 모드: 저장소에 기록하지 않습니다");
            }

            let provider = YahooDailyProvider::new()?;

            // Ctrl-C 시 다음 티커 시작 전에 중단
            let cancel = CancellationToken::new();
            let signal_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("종료 신호 수신, 수집 중단 중...");
                    signal_token.cancel();
                }
            });

            let mut progress: Box<dyn ProgressReporter> = if no_progress {
                Box::new(SilentProgress)
            } else {
                Box::new(ConsoleProgress::new(ingest.progress_refresh()))
            };

            let summary = modules::collect_daily_prices(
                store,
                &provider,
                &options,
                progress.as_mut(),
                &cancel,
            )
            .await?;
            drop(progress);

            summary.log_summary("일봉 수집");
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Commands::Cleanup { dry_run } => {
            let deleted = OrphanCleaner::new(store).cleanup(dry_run).await?;
            tracing::info!(deleted = deleted, dry_run = dry_run, "고아 정리 완료");
        }
    }

    Ok(())
}
