/// 경매 조회
pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str = "SELECT * FROM auctions ORDER BY created_at DESC";

/// 경매 입찰 목록 조회(금액 내림차순)
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bidder_name, bidder_image, created_at, updated_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC
"#;

/// 최고 입찰가 조회
pub const GET_HIGHEST_BID: &str =
    "SELECT MAX(amount) as highest_bid FROM bids WHERE auction_id = $1";

/// 최고 입찰 조회(동액이면 먼저 제출한 입찰이 우선)
pub const GET_TOP_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bidder_name, bidder_image, created_at, updated_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, created_at ASC
    LIMIT 1
"#;

/// 입찰 존재 여부 조회
pub const HAS_BIDS: &str = "SELECT EXISTS (SELECT 1 FROM bids WHERE auction_id = $1)";

/// 판매자의 진행 중(정산 전, 종료 전) 경매 수 조회
pub const COUNT_OPEN_AUCTIONS: &str = r#"
    SELECT COUNT(*) FROM auctions
    WHERE created_by = $1 AND commission_calculated = FALSE AND end_time > $2
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT * FROM users WHERE id = $1";

/// 종료되었지만 아직 정산되지 않은 경매 조회
pub const GET_ENDED_UNSETTLED_AUCTIONS: &str =
    "SELECT * FROM auctions WHERE end_time <= $1 AND commission_calculated = FALSE";

/// 승인된 수수료 납부 증빙 조회
pub const GET_APPROVED_PROOFS: &str =
    "SELECT * FROM commission_proofs WHERE status = 'APPROVED' ORDER BY created_at ASC";

/// 모든 수수료 납부 증빙 조회
pub const GET_ALL_PROOFS: &str = "SELECT * FROM commission_proofs ORDER BY created_at DESC";

/// 집계 창 내 (경매, 사유)별 신고 수 조회
pub const GET_REPORT_GROUPS_IN_WINDOW: &str = r#"
    SELECT auction_id, reason, COUNT(*) AS report_count
    FROM reports
    WHERE created_at >= $1
    GROUP BY auction_id, reason
"#;

/// 모든 신고 조회
pub const GET_ALL_REPORTS: &str = "SELECT * FROM reports ORDER BY created_at DESC";
