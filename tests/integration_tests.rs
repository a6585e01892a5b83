use auction_market::bidding::model::{Auction, Bid, User};
use auction_market::database::DatabaseManager;
use auction_market::query;
use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// 통합 테스트 실행 조건
/// - 서버가 JOB_INTERVAL_SECS=5로 기동되어 있어야 한다
/// - DATABASE_URL이 서버와 같은 PostgreSQL을 가리켜야 한다
fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// 트레이싱 초기화
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("트레이싱 구독자 설정 실패");
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 테스트 데이터베이스 초기화 유틸리티
/// 전체 스위트 실행 전에 단독으로 호출한다:
/// `cargo test reset_test_database -- --ignored`
#[tokio::test]
#[ignore = "테스트 데이터베이스를 전부 삭제하고 재생성합니다"]
async fn reset_test_database() {
    let db_manager = setup().await;
    db_manager.reset_database().await.expect("데이터베이스 재생성 실패");
}

/// 입찰 시나리오 테스트
/// 시작가 100: A가 150 입찰(수락), B가 120 입찰(거절), A가 200 재입찰(같은 행 갱신)
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다"]
async fn test_bid_ladder() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, "입찰테스트판매자", "USER").await;
    let bidder_a = create_test_user(&db_manager, "입찰자A", "USER").await;
    let bidder_b = create_test_user(&db_manager, "입찰자B", "USER").await;
    let auction = create_active_auction(&db_manager, seller.id, 100).await;

    // A가 150 입찰: 수락
    let (status, body) = place_bid(&client, auction.id, bidder_a.id, 150).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["currentBid"], 150);

    // B가 120 입찰: 현재가보다 낮아 거절
    let (status, body) = place_bid(&client, auction.id, bidder_b.id, 120).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "LOW_BID");

    // 거절된 입찰은 상태를 바꾸지 않는다
    let current = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.current_bid, 150);
    assert_eq!(current.highest_bidder, Some(bidder_a.id));

    // A가 200 재입찰: 기존 행이 갱신되고 새 행이 생기지 않는다
    let (status, body) = place_bid(&client, auction.id, bidder_a.id, 200).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["currentBid"], 200);

    let bids = query::handlers::get_auction_bids(&db_manager, auction.id)
        .await
        .unwrap();
    let a_bids: Vec<&Bid> = bids.iter().filter(|b| b.bidder_id == bidder_a.id).collect();
    assert_eq!(a_bids.len(), 1);
    assert_eq!(a_bids[0].amount, 200);

    let current = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.current_bid, 200);
}

/// 입찰 금액 누락 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다"]
async fn test_bid_without_amount() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, "금액누락판매자", "USER").await;
    let bidder = create_test_user(&db_manager, "금액누락입찰자", "USER").await;
    let auction = create_active_auction(&db_manager, seller.id, 100).await;

    let response = client
        .post(format!("{}/auctionitem/{}", base_url(), auction.id))
        .header("x-user-id", bidder.id.to_string())
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_AMOUNT");
}

/// 동시성 입찰 테스트
/// 동시에 들어온 입찰 중 커밋 시점에 현재가를 넘는 것만 수락된다
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다"]
async fn test_concurrent_bidding() {
    init_tracing();
    let db_manager = setup().await;

    let seller = create_test_user(&db_manager, "동시성판매자", "USER").await;
    let auction = create_active_auction(&db_manager, seller.id, 1000).await;

    let mut bidders = Vec::new();
    for i in 1..=30 {
        bidders.push(create_test_user(&db_manager, &format!("동시입찰자{}", i), "USER").await);
    }

    // 30개의 동시 입찰 생성
    let mut handles = vec![];
    for (i, bidder) in bidders.iter().enumerate() {
        let client = Client::new();
        let auction_id = auction.id;
        let bidder_id = bidder.id;
        let amount = 1000 + (i as i64 + 1) * 100;

        let handle = tokio::spawn(async move {
            let response = client
                .post(format!("{}/auctionitem/{}", base_url(), auction_id))
                .header("x-user-id", bidder_id.to_string())
                .json(&json!({ "amount": amount }))
                .send()
                .await
                .unwrap();
            response.status()
        });
        handles.push(handle);
    }

    let mut successful_bids = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            successful_bids += 1;
        } else {
            // 수락되지 못한 입찰은 금액 부족 또는 경합 패배여야 한다
            assert!(
                status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT,
                "예상치 못한 상태: {}",
                status
            );
        }
    }
    info!("성공한 입찰 수: {}", successful_bids);
    assert!(successful_bids >= 1);

    // 최종 현재가는 수락된 입찰 중 최고가와 일치해야 한다
    let current = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap()
        .unwrap();
    let highest = query::handlers::get_highest_bid(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(Some(current.current_bid), highest);
}

/// 경매 종료 정산 테스트(낙찰자 있음)
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다(JOB_INTERVAL_SECS=5)"]
async fn test_closer_settles_auction_with_winner() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, "정산테스트판매자", "USER").await;
    let bidder = create_test_user(&db_manager, "정산테스트입찰자", "USER").await;
    let auction = create_test_auction(
        &db_manager,
        seller.id,
        10000,
        Utc::now() - Duration::minutes(1),
        Utc::now() + Duration::seconds(3),
        "ACTIVE",
    )
    .await;

    let (status, _) = place_bid(&client, auction.id, bidder.id, 20000).await;
    assert_eq!(status, StatusCode::CREATED);

    // 종료 + 정산 틱 대기
    tokio::time::sleep(tokio::time::Duration::from_secs(12)).await;

    let settled = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap()
        .unwrap();
    assert!(settled.commission_calculated);
    assert_eq!(settled.status, "COMPLETED");
    assert_eq!(settled.highest_bidder, Some(bidder.id));

    // 낙찰자 통계와 판매자 수수료(낙찰가의 1%)
    let winner = query::handlers::get_user(&db_manager, bidder.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(winner.money_spent, 20000);
    assert_eq!(winner.auctions_won, 1);

    let seller_after = query::handlers::get_user(&db_manager, seller.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_after.unpaid_commission, 200);
}

/// 경매 종료 정산 테스트(입찰 없음)
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다(JOB_INTERVAL_SECS=5)"]
async fn test_closer_settles_auction_without_bids() {
    let db_manager = setup().await;

    let seller = create_test_user(&db_manager, "유찰테스트판매자", "USER").await;
    let auction = create_test_auction(
        &db_manager,
        seller.id,
        10000,
        Utc::now() - Duration::minutes(2),
        Utc::now() - Duration::minutes(1),
        "ACTIVE",
    )
    .await;

    tokio::time::sleep(tokio::time::Duration::from_secs(12)).await;

    let settled = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap()
        .unwrap();
    assert!(settled.commission_calculated);
    assert_eq!(settled.highest_bidder, None);

    // 수수료가 적립되지 않는다
    let seller_after = query::handlers::get_user(&db_manager, seller.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_after.unpaid_commission, 0);
}

/// 수수료 정산 클램프 테스트
/// 잔액 50에 80짜리 승인 증빙이 정산되면 잔액은 -30이 아니라 0이 된다
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다(JOB_INTERVAL_SECS=5)"]
async fn test_settlement_clamps_at_zero() {
    let db_manager = setup().await;

    let seller = create_test_user(&db_manager, "클램프테스트판매자", "USER").await;
    set_unpaid_commission(&db_manager, seller.id, 50).await;
    let proof_id = insert_approved_proof(&db_manager, seller.id, 80).await;

    tokio::time::sleep(tokio::time::Duration::from_secs(12)).await;

    let seller_after = query::handlers::get_user(&db_manager, seller.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_after.unpaid_commission, 0);

    let status = proof_status(&db_manager, proof_id).await;
    assert_eq!(status, "SETTLED");
}

/// 신고 임계값 테스트
/// 같은 사유 10건이면 삭제, 9건이면 유지
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다(JOB_INTERVAL_SECS=5)"]
async fn test_report_threshold_enforcement() {
    let db_manager = setup().await;

    let seller = create_test_user(&db_manager, "신고테스트판매자", "USER").await;
    let reporter = create_test_user(&db_manager, "신고자", "USER").await;
    let auction_x = create_active_auction(&db_manager, seller.id, 100).await;
    let auction_y = create_active_auction(&db_manager, seller.id, 100).await;

    // X: 같은 사유 10건 + 다른 사유 5건
    for _ in 0..10 {
        insert_report(&db_manager, auction_x.id, reporter.id, "Spam").await;
    }
    for _ in 0..5 {
        insert_report(&db_manager, auction_x.id, reporter.id, "Other").await;
    }
    // Y: 같은 사유 9건(임계값 미달)
    for _ in 0..9 {
        insert_report(&db_manager, auction_y.id, reporter.id, "Spam").await;
    }

    tokio::time::sleep(tokio::time::Duration::from_secs(12)).await;

    // X는 삭제되고 모든 신고가 RESOLVED
    let deleted = query::handlers::get_auction(&db_manager, auction_x.id)
        .await
        .unwrap();
    assert!(deleted.is_none());
    assert_eq!(unresolved_report_count(&db_manager, auction_x.id).await, 0);

    // Y는 그대로 남는다
    let kept = query::handlers::get_auction(&db_manager, auction_y.id)
        .await
        .unwrap();
    assert!(kept.is_some());
}

/// 경매 재등록 테스트
/// 정산 전에는 거절되고, 정산 후에는 입찰/현재가/낙찰자/플래그가 초기화된다.
/// 기본 정책에서는 판매자의 미납 수수료가 유지된다.
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다"]
async fn test_republish_resets_auction() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, "재등록판매자", "USER").await;
    let bidder = create_test_user(&db_manager, "재등록입찰자", "USER").await;
    let auction = create_active_auction(&db_manager, seller.id, 100).await;

    let (status, _) = place_bid(&client, auction.id, bidder.id, 150).await;
    assert_eq!(status, StatusCode::CREATED);

    let new_start = Utc::now() + Duration::hours(1);
    let new_end = Utc::now() + Duration::hours(2);

    // 정산 전 재등록은 거절
    let response = client
        .put(format!("{}/auctionitem/republish/{}", base_url(), auction.id))
        .header("x-user-id", seller.id.to_string())
        .json(&json!({ "startTime": new_start, "endTime": new_end }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_CLOSED");

    // 정산 완료 상태로 전환한 뒤 재등록
    mark_settled(&db_manager, auction.id).await;
    set_unpaid_commission(&db_manager, seller.id, 42).await;

    let response = client
        .put(format!("{}/auctionitem/republish/{}", base_url(), auction.id))
        .header("x-user-id", seller.id.to_string())
        .json(&json!({ "startTime": new_start, "endTime": new_end }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let republished = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(republished.current_bid, 100);
    assert_eq!(republished.highest_bidder, None);
    assert!(!republished.commission_calculated);
    assert_eq!(republished.status, "SCHEDULED");

    let bids = query::handlers::get_auction_bids(&db_manager, auction.id)
        .await
        .unwrap();
    assert!(bids.is_empty());

    // 기본 정책에서는 미납 수수료가 유지된다
    let seller_after = query::handlers::get_user(&db_manager, seller.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seller_after.unpaid_commission, 42);
}

/// 판매자당 동시 진행 경매 3건 제한 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다"]
async fn test_create_auction_cap() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, "상한테스트판매자", "USER").await;
    let start = Utc::now() + Duration::hours(1);
    let end = Utc::now() + Duration::hours(2);

    for i in 1..=3 {
        let response = client
            .post(format!("{}/auctionitem", base_url()))
            .header("x-user-id", seller.id.to_string())
            .json(&json!({
                "title": format!("상한 테스트 경매 {}", i),
                "startingBid": 100,
                "startTime": start,
                "endTime": end
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // 4번째 등록은 거절
    let response = client
        .post(format!("{}/auctionitem", base_url()))
        .header("x-user-id", seller.id.to_string())
        .json(&json!({
            "title": "상한 테스트 경매 4",
            "startingBid": 100,
            "startTime": start,
            "endTime": end
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ACTIVE_LIMIT");

    // 과거 시작 시간도 거절
    let response = client
        .post(format!("{}/auctionitem", base_url()))
        .header("x-user-id", seller.id.to_string())
        .json(&json!({
            "title": "과거 시작 경매",
            "startingBid": 100,
            "startTime": Utc::now() - Duration::hours(1),
            "endTime": end
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_TIME");
}

/// 납부할 수수료가 없으면 증빙 제출이 거절된다
#[tokio::test]
#[ignore = "실행 중인 서버와 PostgreSQL이 필요합니다"]
async fn test_proof_rejected_without_balance() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, "증빙테스트판매자", "USER").await;

    let response = client
        .post(format!("{}/commission/proof", base_url()))
        .header("x-user-id", seller.id.to_string())
        .json(&json!({
            "amount": 100,
            "comment": "계좌 이체 완료",
            "proofUrl": "https://images.example.com/proof.png"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NO_COMMISSION_DUE");
}

// region:    --- Test Helpers

/// 입찰 요청 전송
async fn place_bid(client: &Client, auction_id: i64, bidder_id: i64, amount: i64) -> (StatusCode, Value) {
    let response = client
        .post(format!("{}/auctionitem/{}", base_url(), auction_id))
        .header("x-user-id", bidder_id.to_string())
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body: Value = response.json().await.unwrap_or_else(|_| json!({}));
    (status, body)
}

/// 테스트용 사용자 생성
async fn create_test_user(db_manager: &DatabaseManager, username: &str, role: &str) -> User {
    let username = username.to_string();
    let role = role.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (username, email, role, created_at)
                     VALUES ($1, $2, $3, $4)
                     RETURNING *",
                )
                .bind(&username)
                .bind(format!("{}@test.example.com", username))
                .bind(&role)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 현재 진행 중인 테스트용 경매 생성
async fn create_active_auction(
    db_manager: &DatabaseManager,
    seller_id: i64,
    starting_bid: i64,
) -> Auction {
    create_test_auction(
        db_manager,
        seller_id,
        starting_bid,
        Utc::now() - Duration::minutes(1),
        Utc::now() + Duration::hours(2),
        "ACTIVE",
    )
    .await
}

/// 테스트용 경매 생성
async fn create_test_auction(
    db_manager: &DatabaseManager,
    seller_id: i64,
    starting_bid: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: &str,
) -> Auction {
    let status = status.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(
                    "INSERT INTO auctions
                     (title, description, starting_bid, current_bid, start_time, end_time,
                      created_by, status, created_at)
                     VALUES ($1, $2, $3, $3, $4, $5, $6, $7, $8)
                     RETURNING *",
                )
                .bind("통합 테스트 경매")
                .bind("통합 테스트를 위한 경매입니다.")
                .bind(starting_bid)
                .bind(start_time)
                .bind(end_time)
                .bind(seller_id)
                .bind(&status)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 경매를 정산 완료 상태로 전환
async fn mark_settled(db_manager: &DatabaseManager, auction_id: i64) {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "UPDATE auctions SET commission_calculated = TRUE, status = 'COMPLETED'
                     WHERE id = $1",
                )
                .bind(auction_id)
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();
}

/// 판매자 미납 수수료 설정
async fn set_unpaid_commission(db_manager: &DatabaseManager, user_id: i64, amount: i64) {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query("UPDATE users SET unpaid_commission = $1 WHERE id = $2")
                    .bind(amount)
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await
            })
        })
        .await
        .unwrap();
}

/// 승인 상태의 증빙 삽입
async fn insert_approved_proof(db_manager: &DatabaseManager, user_id: i64, amount: i64) -> i64 {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO commission_proofs (user_id, amount, proof_url, status, created_at)
                     VALUES ($1, $2, $3, 'APPROVED', $4)
                     RETURNING id",
                )
                .bind(user_id)
                .bind(amount)
                .bind("https://images.example.com/proof.png")
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 증빙 상태 조회
async fn proof_status(db_manager: &DatabaseManager, proof_id: i64) -> String {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, String>(
                    "SELECT status FROM commission_proofs WHERE id = $1",
                )
                .bind(proof_id)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 신고 삽입
async fn insert_report(db_manager: &DatabaseManager, auction_id: i64, reporter_id: i64, reason: &str) {
    let reason = reason.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "INSERT INTO reports (auction_id, reported_by, reason, status, created_at)
                     VALUES ($1, $2, $3, 'PENDING', $4)",
                )
                .bind(auction_id)
                .bind(reporter_id)
                .bind(&reason)
                .bind(Utc::now())
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();
}

/// 미해결 신고 수 조회
async fn unresolved_report_count(db_manager: &DatabaseManager, auction_id: i64) -> i64 {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM reports WHERE auction_id = $1 AND status != 'RESOLVED'",
                )
                .bind(auction_id)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

// endregion: --- Test Helpers
