/// 경매 등록
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (item_name, item_description, seller, starting_price, bid_increment, highest_bid, closes_at, status, version, created_at)
    VALUES ($1, $2, $3, $4, $5, $4, $6, 'OPEN', 0, $7)
    RETURNING id, item_name, item_description, seller, starting_price, bid_increment, highest_bid, highest_bidder, closes_at, status, version, created_at
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, item_name, item_description, seller, starting_price, bid_increment, highest_bid, highest_bidder, closes_at, status, version, created_at FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str =
    "SELECT id, item_name, item_description, seller, starting_price, bid_increment, highest_bid, highest_bidder, closes_at, status, version, created_at FROM auctions ORDER BY created_at DESC, id DESC";

/// 최고 입찰 투영 갱신 (낙관적 동시성: 버전 비교)
pub const UPDATE_HIGHEST_BID: &str = r#"
    UPDATE auctions
    SET highest_bid = $1, highest_bidder = $2, version = version + 1
    WHERE id = $3 AND version = $4 AND status = 'OPEN'
      AND (highest_bid < $1 OR (highest_bidder IS NULL AND highest_bid <= $1))
    RETURNING id, item_name, item_description, seller, starting_price, bid_increment, highest_bid, highest_bidder, closes_at, status, version, created_at
"#;

/// 경매 종료
pub const CLOSE_AUCTION: &str =
    "UPDATE auctions SET status = 'CLOSED', version = version + 1 WHERE id = $1 AND status = 'OPEN'";

/// 마감 시각이 지난 경매 종료
pub const CLOSE_EXPIRED_AUCTIONS: &str = r#"
    UPDATE auctions
    SET status = 'CLOSED', version = version + 1
    WHERE status = 'OPEN' AND closes_at <= $1
    RETURNING id, item_name, item_description, seller, starting_price, bid_increment, highest_bid, highest_bidder, closes_at, status, version, created_at
"#;

/// 경매 존재 여부
pub const AUCTION_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM auctions WHERE id = $1) AS found";

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, placed_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, bidder_id, amount, placed_at
"#;

/// 입찰 이력 조회
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at DESC, id DESC
"#;

/// 입찰 이력 페이지 조회
pub const GET_BID_HISTORY_PAGE: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at DESC, id DESC
    LIMIT $2 OFFSET $3
"#;

/// 스냅샷 읽기 (투영과 원장을 같은 시점으로 읽기 위함)
pub const SET_REPEATABLE_READ: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ";

/// 원장 기준 최고 입찰 조회
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, id DESC
    LIMIT 1
"#;

/// 입찰 수 조회
pub const COUNT_BIDS: &str = "SELECT COUNT(*) AS bid_count FROM bids WHERE auction_id = $1";
