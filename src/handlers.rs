// region:    --- Imports
use crate::auction::model::{AuctionId, NewAuction};
use crate::bidding::commands::BiddingService;
use crate::bidding::model::{BidHistoryQuery, PlaceBidCommand};
use crate::error::BiddingError;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Routes
/// 라우터 설정
pub fn routes(service: Arc<BiddingService>) -> Router {
    // 스토어프론트가 다른 오리진에서 제공되므로 cors 허용
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/bid", post(handle_bid))
        .route("/auctions", get(handle_get_auctions).post(handle_create_auction))
        .route("/auctions/:id", get(handle_get_auction))
        .route("/auctions/:id/close", post(handle_close_auction))
        .route("/auctions/:id/bids", get(handle_get_bid_history))
        .route("/auctions/:id/highest-bid", get(handle_get_highest_bid))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 64))
        .with_state(service)
}
// endregion: --- Routes

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State(service): State<Arc<BiddingService>>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, BiddingError> {
    let receipt = service.place_bid(cmd).await?;
    Ok((StatusCode::OK, Json(receipt)))
}

/// 경매 등록
pub async fn handle_create_auction(
    State(service): State<Arc<BiddingService>>,
    Json(new): Json<NewAuction>,
) -> Result<impl IntoResponse, BiddingError> {
    info!("{:<12} --> 경매 등록 요청: {}", "Command", new.item_name);
    let view = service.create_auction(new).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// 경매 종료 (관리자)
pub async fn handle_close_auction(
    State(service): State<Arc<BiddingService>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<impl IntoResponse, BiddingError> {
    info!("{:<12} --> 경매 종료 요청 id: {}", "Command", auction_id);
    let view = service.close_auction(auction_id).await?;
    Ok(Json(view))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

pub async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 모든 경매 조회
pub async fn handle_get_auctions(
    State(service): State<Arc<BiddingService>>,
) -> Result<impl IntoResponse, BiddingError> {
    Ok(Json(service.list_auctions().await?))
}

/// 경매 조회
pub async fn handle_get_auction(
    State(service): State<Arc<BiddingService>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<impl IntoResponse, BiddingError> {
    Ok(Json(service.get_auction(auction_id).await?))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(service): State<Arc<BiddingService>>,
    Path(auction_id): Path<AuctionId>,
    Query(page): Query<BidHistoryQuery>,
) -> Result<impl IntoResponse, BiddingError> {
    let history = service
        .bid_history(auction_id, page.offset, page.limit)
        .await?;
    Ok(Json(history))
}

/// 최고 입찰가 조회 (원장 기준, 투영 일관성 포함)
pub async fn handle_get_highest_bid(
    State(service): State<Arc<BiddingService>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<impl IntoResponse, BiddingError> {
    Ok(Json(service.verify_projection(auction_id).await?))
}

// endregion: --- Query Handlers
