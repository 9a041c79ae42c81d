/// 경매 종료 스케줄러
/// 마감 시각이 지난 Open 경매를 주기적으로 Closed 로 전이시키고 종료 이벤트를 발행한다.
/// 입찰 검증은 마감 시각을 직접 비교하므로, 스케줄러가 늦어도 마감 이후 입찰은 수락되지 않는다.
// region:    --- Imports
use crate::bidding::commands::BiddingService;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Auction Scheduler
pub struct AuctionScheduler {
    service: Arc<BiddingService>,
    period: Duration,
}

impl AuctionScheduler {
    pub fn new(service: Arc<BiddingService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// 경매 종료 스케줄러 시작
    pub fn start(&self) -> JoinHandle<()> {
        let service = Arc::clone(&self.service);
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = Self::tick(&service).await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 번 실행. 종료된 경매 수를 반환한다.
    pub async fn run_once(&self) -> Result<usize, crate::error::BiddingError> {
        Self::tick(&self.service).await
    }

    async fn tick(service: &BiddingService) -> Result<usize, crate::error::BiddingError> {
        let closed = service.close_expired().await?;
        if !closed.is_empty() {
            debug!(
                "{:<12} --> 경매 {}건이 종료되었습니다.",
                "Scheduler",
                closed.len()
            );
        }
        Ok(closed.len())
    }
}
// endregion: --- Auction Scheduler

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::clock::{AuctionClock, ClockStatus, ManualClock};
    use crate::auction::model::NewAuction;
    use crate::bidding::model::PlaceBidCommand;
    use crate::bidding::validator::BidPolicy;
    use crate::error::RejectionReason;
    use crate::memory::InMemoryRepository;
    use crate::message_broker::LogPublisher;
    use chrono::Utc;

    #[tokio::test]
    async fn closes_auction_once_close_time_passes() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let service = Arc::new(BiddingService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(LogPublisher),
            AuctionClock::new(clock.clone(), chrono::Duration::minutes(5)),
            BidPolicy::default(),
            Duration::from_secs(1),
        ));
        let scheduler = AuctionScheduler::new(Arc::clone(&service), Duration::from_millis(10));

        let auction = service
            .create_auction(NewAuction {
                item_name: "Jam tangan".to_string(),
                item_description: String::new(),
                seller: "toko".to_string(),
                starting_price: 50000,
                bid_increment: 5000,
                closes_at: start + chrono::Duration::seconds(30),
            })
            .await
            .unwrap();

        assert_eq!(scheduler.run_once().await.unwrap(), 0);
        assert_eq!(
            service.get_auction(auction.id).await.unwrap().status,
            ClockStatus::ClosingSoon
        );

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(scheduler.run_once().await.unwrap(), 1);
        assert_eq!(scheduler.run_once().await.unwrap(), 0);

        let err = service
            .place_bid(PlaceBidCommand {
                auction_id: auction.id,
                bidder_id: 1,
                amount: 100000,
            })
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Closed));
    }
}
