/// 주기 작업 스케줄러
/// 1초 주기의 상태 스윕(SCHEDULED -> ACTIVE)과
/// 경매 종료 정산, 수수료 정산, 신고 제재의 세 주기 작업을 기동한다.
/// 작업들은 서로 독립적인 타이머로 돌며 공유하는 메모리 상태가 없다.
// region:    --- Imports
use crate::notifier::Notifier;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Modules
pub mod closer;
pub mod enforcement;
pub mod settlement;

// endregion: --- Modules

// region:    --- Job Scheduler

// 주기 작업 기본 실행 간격(초)
const DEFAULT_JOB_INTERVAL_SECS: u64 = 60;

/// 주기 작업 스케줄러
pub struct JobScheduler {
    pool: Arc<PgPool>,
    notifier: Arc<dyn Notifier>,
}

impl JobScheduler {
    pub fn new(pool: Arc<PgPool>, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// 모든 주기 작업 시작
    pub async fn start(&self) {
        let tick = Duration::from_secs(Self::job_interval_secs());

        // 경매 상태 스윕
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                if let Err(e) = Self::update_auction_statuses(&pool).await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });

        // 경매 종료 정산 작업
        let pool = Arc::clone(&self.pool);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let mut interval = interval(tick);
            loop {
                interval.tick().await;
                if let Err(e) = closer::close_ended_auctions(&pool, notifier.as_ref()).await {
                    error!(
                        "{:<12} --> 경매 종료 정산 작업 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });

        // 수수료 정산 작업
        let pool = Arc::clone(&self.pool);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let mut interval = interval(tick);
            loop {
                interval.tick().await;
                if let Err(e) = settlement::settle_approved_proofs(&pool, notifier.as_ref()).await {
                    error!(
                        "{:<12} --> 수수료 정산 작업 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });

        // 신고 제재 작업
        let pool = Arc::clone(&self.pool);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let mut interval = interval(tick);
            loop {
                interval.tick().await;
                if let Err(e) = enforcement::enforce_report_threshold(&pool, notifier.as_ref()).await
                {
                    error!(
                        "{:<12} --> 신고 제재 작업 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });
    }

    /// 경매 상태 업데이트
    /// ACTIVE -> COMPLETED 전이는 정산 플래그와 함께 closer가 처리한다.
    async fn update_auction_statuses(pool: &PgPool) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        // SCHEDULED -> ACTIVE 상태 변경
        sqlx::query(
            "UPDATE auctions SET status = 'ACTIVE'
             WHERE status = 'SCHEDULED' AND start_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        debug!(
            "{:<12} --> 경매 상태가 성공적으로 업데이트되었습니다.",
            "Scheduler"
        );

        Ok(())
    }

    /// 주기 작업 실행 간격(JOB_INTERVAL_SECS, 기본 60초)
    fn job_interval_secs() -> u64 {
        std::env::var("JOB_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_JOB_INTERVAL_SECS)
    }
}

// endregion: --- Job Scheduler
