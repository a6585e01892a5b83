// region:    --- Imports
use crate::database::DatabaseManager;
use crate::notifier::MailerClient;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auth;
mod bidding;
mod commission;
mod database;
mod handlers;
mod moderation;
mod notifier;
mod query;
mod scheduler;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 스키마 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 메일 릴레이 클라이언트 생성
    let mailer = Arc::new(MailerClient::new());

    // 주기 작업 시작(상태 스윕, 종료 정산, 수수료 정산, 신고 제재)
    let job_scheduler = scheduler::JobScheduler::new(db_manager.get_pool(), mailer);
    job_scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/auctionitems", get(handlers::handle_get_auctions))
        .route("/auctionitem", post(handlers::handle_create_auction))
        .route(
            "/auctionitem/:id",
            get(handlers::handle_get_auction)
                .post(handlers::handle_bid)
                .delete(handlers::handle_delete_auction),
        )
        .route(
            "/auctionitem/republish/:id",
            put(handlers::handle_republish_auction),
        )
        .route("/report/report-auction", post(handlers::handle_report_auction))
        .route("/superadmin/reports", get(handlers::handle_get_reports))
        .route(
            "/superadmin/reports/:id/status",
            put(handlers::handle_review_report),
        )
        .route("/commission/proof", post(handlers::handle_submit_proof))
        .route(
            "/superadmin/commission-proofs",
            get(handlers::handle_get_proofs),
        )
        .route(
            "/superadmin/commission-proofs/:id/status",
            put(handlers::handle_review_proof),
        )
        .layer(cors)
        .with_state(db_manager);

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
