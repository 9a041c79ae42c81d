use super::model::{AuctionId, AuctionRecord, BidderId, NewAuction};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 경매 레코드 저장소
///
/// `update` 는 버전 비교 후 교체(CAS)로 동작하며, 같은 경매에 대한
/// 동시 입찰 중 하나만 성공한다. 서로 다른 경매는 서로를 막지 않는다.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn create(&self, new: NewAuction, now: DateTime<Utc>) -> Result<AuctionRecord, StoreError>;

    async fn get(&self, auction_id: AuctionId) -> Result<AuctionRecord, StoreError>;

    /// 등록 시각 역순
    async fn list(&self) -> Result<Vec<AuctionRecord>, StoreError>;

    /// 최고 입찰 투영 갱신. 버전이 다르면 `Conflict`
    async fn update(
        &self,
        auction_id: AuctionId,
        expected_version: i64,
        new_highest_bid: i64,
        new_highest_bidder: BidderId,
    ) -> Result<AuctionRecord, StoreError>;

    /// Open -> Closed 전이. 이번 호출로 전이했으면 true
    async fn close(&self, auction_id: AuctionId) -> Result<bool, StoreError>;

    /// closes_at 이 지난 Open 경매를 모두 종료하고 종료된 레코드를 반환
    async fn close_expired(&self, now: DateTime<Utc>) -> Result<Vec<AuctionRecord>, StoreError>;
}
