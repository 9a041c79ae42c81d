// region:    --- Imports
use crate::auction::model::AuctionId;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Store Error
/// 저장소 계층 오류
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("경매를 찾을 수 없습니다: {0}")]
    NotFound(AuctionId),
    #[error("버전 충돌: {0}")]
    Conflict(AuctionId),
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
}
// endregion: --- Store Error

// region:    --- Rejection Reason
/// 입찰 거절 사유 (정책 거절, 자동 재시도 대상 아님)
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    #[error("경매가 이미 종료되었습니다.")]
    Closed,
    #[error("입찰 금액이 최소 입찰가보다 낮습니다.")]
    TooLow,
    #[error("입찰 금액이 입찰 단위에 맞지 않습니다.")]
    NotIncrementAligned,
    #[error("현재 최고 입찰자는 다시 입찰할 수 없습니다.")]
    SelfOutbid,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Closed => "CLOSED",
            RejectionReason::TooLow => "TOO_LOW",
            RejectionReason::NotIncrementAligned => "NOT_INCREMENT_ALIGNED",
            RejectionReason::SelfOutbid => "SELF_OUTBID",
        }
    }
}
// endregion: --- Rejection Reason

// region:    --- Bidding Error
/// 입찰 서비스 오류
#[derive(Debug, Error)]
pub enum BiddingError {
    #[error("경매를 찾을 수 없습니다: {0}")]
    NotFound(AuctionId),
    #[error("{reason}")]
    Rejected {
        reason: RejectionReason,
        minimum_bid: Option<i64>,
    },
    #[error("동시 입찰 충돌로 입찰이 처리되지 않았습니다. 다시 시도해 주세요.")]
    Conflict(AuctionId),
    #[error("일시적인 저장소 오류: {0}")]
    Transient(String),
    #[error("잘못된 경매 등록 요청: {0}")]
    InvalidAuction(String),
}

impl BiddingError {
    pub fn rejected(reason: RejectionReason) -> Self {
        BiddingError::Rejected {
            reason,
            minimum_bid: None,
        }
    }

    /// 정책 거절 사유 (해당하는 경우)
    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            BiddingError::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// 호출자가 재시도해도 되는 오류인지
    pub fn is_retryable(&self) -> bool {
        matches!(self, BiddingError::Conflict(_) | BiddingError::Transient(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            BiddingError::NotFound(_) => "NOT_FOUND",
            BiddingError::Rejected { reason, .. } => reason.code(),
            BiddingError::Conflict(_) => "CONFLICT",
            BiddingError::Transient(_) => "TRANSIENT",
            BiddingError::InvalidAuction(_) => "INVALID_AUCTION",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            BiddingError::NotFound(_) => StatusCode::NOT_FOUND,
            BiddingError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BiddingError::Conflict(_) => StatusCode::CONFLICT,
            BiddingError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            BiddingError::InvalidAuction(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StoreError> for BiddingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => BiddingError::NotFound(id),
            StoreError::Conflict(id) => BiddingError::Conflict(id),
            StoreError::Database(e) => {
                // 원인은 로그에만 남기고 호출자에게는 일반 메시지를 돌려준다
                error!("{:<12} --> 데이터베이스 오류: {}", "Store", e);
                BiddingError::Transient("저장소를 일시적으로 사용할 수 없습니다.".to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_bid: Option<i64>,
}

impl IntoResponse for BiddingError {
    fn into_response(self) -> Response {
        let minimum_bid = match &self {
            BiddingError::Rejected { minimum_bid, .. } => *minimum_bid,
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            minimum_bid,
        };
        (self.status(), Json(body)).into_response()
    }
}
// endregion: --- Bidding Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_are_not_leaked_to_clients() {
        let err = BiddingError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(err.is_retryable());
        assert_eq!(err.code(), "TRANSIENT");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.to_string().contains("pool"), "{}", err);
    }

    #[test]
    fn store_conflict_maps_to_409() {
        let err = BiddingError::from(StoreError::Conflict(7));
        assert!(matches!(err, BiddingError::Conflict(7)));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
