/// 경매 시계
/// 서버 시간만을 기준으로 경매의 진행 상태를 판단한다.
// region:    --- Imports
use super::model::{AuctionRecord, AuctionStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

// endregion: --- Imports

// region:    --- Time Source
/// 신뢰할 수 있는 단일 시간 소스
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 수동으로 진행시키는 시계 (테스트용)
/// 설정한 시각을 정밀도 손실 없이 그대로 돌려준다.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    fn current(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.current();
        *now = *now + by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current() = to;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current()
    }
}
// endregion: --- Time Source

// region:    --- Auction Clock
/// 시계 기준 경매 상태
/// ClosingSoon 은 화면 표시용 힌트이며 입찰 수락 여부에는 영향이 없다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockStatus {
    Open,
    ClosingSoon,
    Closed,
}

impl ClockStatus {
    pub fn accepts_bids(&self) -> bool {
        !matches!(self, ClockStatus::Closed)
    }
}

#[derive(Clone)]
pub struct AuctionClock {
    source: Arc<dyn TimeSource>,
    closing_soon: Duration,
}

impl AuctionClock {
    pub fn new(source: Arc<dyn TimeSource>, closing_soon: Duration) -> Self {
        Self {
            source,
            closing_soon,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.source.now()
    }

    /// 경매 상태 판단
    pub fn status_of(&self, record: &AuctionRecord, now: DateTime<Utc>) -> ClockStatus {
        if record.status == AuctionStatus::Closed || now >= record.closes_at {
            return ClockStatus::Closed;
        }
        if record.closes_at - now <= self.closing_soon {
            ClockStatus::ClosingSoon
        } else {
            ClockStatus::Open
        }
    }

    /// 종료까지 남은 시간 (초, 음수 없음)
    pub fn remaining_secs(&self, record: &AuctionRecord, now: DateTime<Utc>) -> i64 {
        if record.status == AuctionStatus::Closed {
            return 0;
        }
        (record.closes_at - now).num_seconds().max(0)
    }
}
// endregion: --- Auction Clock

#[cfg(test)]
mod tests {
    use super::*;

    fn record(closes_at: DateTime<Utc>) -> AuctionRecord {
        AuctionRecord {
            id: 1,
            item_name: "Kinder Joy".to_string(),
            item_description: String::new(),
            seller: "seller".to_string(),
            starting_price: 13000,
            bid_increment: 1000,
            highest_bid: 13000,
            highest_bidder: None,
            closes_at,
            status: AuctionStatus::Open,
            version: 0,
            created_at: closes_at - Duration::hours(3),
        }
    }

    #[test]
    fn status_follows_close_time() {
        let now = Utc::now();
        let clock = AuctionClock::new(Arc::new(ManualClock::new(now)), Duration::minutes(5));

        let far = record(now + Duration::hours(2));
        assert_eq!(clock.status_of(&far, now), ClockStatus::Open);

        let soon = record(now + Duration::minutes(3));
        assert_eq!(clock.status_of(&soon, now), ClockStatus::ClosingSoon);
        assert!(clock.status_of(&soon, now).accepts_bids());

        // closes_at 과 같은 시각은 종료
        let exact = record(now);
        assert_eq!(clock.status_of(&exact, now), ClockStatus::Closed);
        assert_eq!(clock.remaining_secs(&exact, now), 0);
    }

    #[test]
    fn administratively_closed_is_closed() {
        let now = Utc::now();
        let clock = AuctionClock::new(Arc::new(SystemClock), Duration::minutes(5));
        let mut closed = record(now + Duration::hours(2));
        closed.status = AuctionStatus::Closed;
        assert_eq!(clock.status_of(&closed, now), ClockStatus::Closed);
        assert_eq!(clock.remaining_secs(&closed, now), 0);
    }

    #[test]
    fn manual_clock_keeps_full_precision() {
        let start = Utc::now();
        let source = ManualClock::new(start);
        assert_eq!(source.now(), start);

        source.advance(Duration::seconds(90));
        assert_eq!(source.now(), start + Duration::seconds(90));

        let exact = start + Duration::nanoseconds(1_234_567);
        source.set(exact);
        assert_eq!(source.now(), exact);
    }

    #[test]
    fn bid_at_exact_close_time_is_closed() {
        let start = Utc::now();
        let source = Arc::new(ManualClock::new(start));
        let clock = AuctionClock::new(source.clone(), Duration::minutes(5));
        let auction = record(start + Duration::hours(2));

        source.advance(Duration::hours(2));
        assert_eq!(clock.status_of(&auction, clock.now()), ClockStatus::Closed);

        source.set(auction.closes_at - Duration::nanoseconds(1));
        assert!(clock.status_of(&auction, clock.now()).accepts_bids());
    }
}
