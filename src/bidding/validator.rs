/// 입찰 검증
/// 규칙은 순서대로 평가하며 처음 실패한 규칙이 거절 사유가 된다.
/// 1. 종료된 경매
/// 2. 최소 입찰가 미만
/// 3. 입찰 단위 불일치 (설정 가능)
/// 4. 현재 최고 입찰자의 재입찰 (설정 가능)
// region:    --- Imports
use crate::auction::model::{AuctionRecord, AuctionStatus, BidderId};
use crate::error::RejectionReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Bid Policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidPolicy {
    /// 최고가 대비 차액이 입찰 단위의 배수여야 하는지
    pub require_increment_alignment: bool,
    /// 현재 최고 입찰자의 재입찰 금지
    pub forbid_self_outbid: bool,
    /// 첫 입찰은 시작가와 같은 금액부터 허용
    pub allow_opening_bid_at_start: bool,
}

impl Default for BidPolicy {
    fn default() -> Self {
        Self {
            require_increment_alignment: true,
            forbid_self_outbid: true,
            allow_opening_bid_at_start: true,
        }
    }
}

impl BidPolicy {
    /// 현재 상태에서 수락 가능한 최소 입찰가
    pub fn minimum_bid(&self, record: &AuctionRecord) -> i64 {
        if self.allow_opening_bid_at_start && record.has_no_bids() {
            record.starting_price
        } else {
            record.highest_bid.saturating_add(record.bid_increment)
        }
    }
}
// endregion: --- Bid Policy

// region:    --- Validate
/// 입찰 검증. 성공 시 수락할 금액을 반환한다.
pub fn validate(
    record: &AuctionRecord,
    bidder_id: BidderId,
    amount: i64,
    now: DateTime<Utc>,
    policy: &BidPolicy,
) -> Result<i64, RejectionReason> {
    if now >= record.closes_at || record.status == AuctionStatus::Closed {
        return Err(RejectionReason::Closed);
    }

    if amount < policy.minimum_bid(record) {
        return Err(RejectionReason::TooLow);
    }

    if policy.require_increment_alignment
        && (amount - record.highest_bid) % record.bid_increment != 0
    {
        return Err(RejectionReason::NotIncrementAligned);
    }

    if policy.forbid_self_outbid && record.highest_bidder == Some(bidder_id) {
        return Err(RejectionReason::SelfOutbid);
    }

    Ok(amount)
}
// endregion: --- Validate

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn auction(now: DateTime<Utc>) -> AuctionRecord {
        AuctionRecord {
            id: 7,
            item_name: "Kinder Joy".to_string(),
            item_description: "cokelat".to_string(),
            seller: "toko".to_string(),
            starting_price: 13000,
            bid_increment: 1000,
            highest_bid: 13000,
            highest_bidder: None,
            closes_at: now + Duration::hours(2),
            status: AuctionStatus::Open,
            version: 0,
            created_at: now,
        }
    }

    fn with_leader(mut record: AuctionRecord, amount: i64, bidder: BidderId) -> AuctionRecord {
        record.highest_bid = amount;
        record.highest_bidder = Some(bidder);
        record.version += 1;
        record
    }

    #[test]
    fn opening_bid_may_equal_starting_price() {
        let now = Utc::now();
        let record = auction(now);
        let policy = BidPolicy::default();
        assert_eq!(validate(&record, 1, 13000, now, &policy), Ok(13000));
        assert_eq!(validate(&record, 1, 12000, now, &policy), Err(RejectionReason::TooLow));
    }

    #[test]
    fn opening_bid_requires_increment_when_disabled() {
        let now = Utc::now();
        let record = auction(now);
        let policy = BidPolicy {
            allow_opening_bid_at_start: false,
            ..BidPolicy::default()
        };
        assert_eq!(validate(&record, 1, 13000, now, &policy), Err(RejectionReason::TooLow));
        assert_eq!(validate(&record, 1, 14000, now, &policy), Ok(14000));
    }

    #[test]
    fn below_highest_plus_increment_is_too_low() {
        let now = Utc::now();
        let record = with_leader(auction(now), 14000, 1);
        let policy = BidPolicy::default();
        for amount in [0, 13500, 14000, 14500, 14999] {
            assert_eq!(
                validate(&record, 2, amount, now, &policy),
                Err(RejectionReason::TooLow),
                "amount {}",
                amount
            );
        }
        assert_eq!(validate(&record, 2, 15000, now, &policy), Ok(15000));
    }

    #[test]
    fn misaligned_higher_bid_depends_on_policy() {
        let now = Utc::now();
        let record = with_leader(auction(now), 14000, 1);

        let strict = BidPolicy::default();
        assert_eq!(
            validate(&record, 2, 15500, now, &strict),
            Err(RejectionReason::NotIncrementAligned)
        );

        let lenient = BidPolicy {
            require_increment_alignment: false,
            ..strict
        };
        assert_eq!(validate(&record, 2, 15500, now, &lenient), Ok(15500));
    }

    #[test]
    fn closed_wins_over_every_other_rule() {
        let now = Utc::now();
        let record = with_leader(auction(now), 14000, 1);
        let policy = BidPolicy::default();

        let after_close = record.closes_at;
        assert_eq!(
            validate(&record, 2, 16000, after_close, &policy),
            Err(RejectionReason::Closed)
        );
        assert_eq!(
            validate(&record, 1, 100, after_close + Duration::days(1), &policy),
            Err(RejectionReason::Closed)
        );

        let mut closed = record.clone();
        closed.status = AuctionStatus::Closed;
        assert_eq!(validate(&closed, 2, 16000, now, &policy), Err(RejectionReason::Closed));
    }

    #[test]
    fn leader_cannot_outbid_themselves_unless_allowed() {
        let now = Utc::now();
        let record = with_leader(auction(now), 14000, 1);

        let policy = BidPolicy::default();
        assert_eq!(validate(&record, 1, 15000, now, &policy), Err(RejectionReason::SelfOutbid));

        let permissive = BidPolicy {
            forbid_self_outbid: false,
            ..policy
        };
        assert_eq!(validate(&record, 1, 15000, now, &permissive), Ok(15000));
    }

    #[test]
    fn minimum_bid_hint() {
        let now = Utc::now();
        let policy = BidPolicy::default();
        assert_eq!(policy.minimum_bid(&auction(now)), 13000);
        assert_eq!(policy.minimum_bid(&with_leader(auction(now), 15000, 3)), 16000);
    }
}
