//! Daily check-in: the engagement state machine.
//!
//! The checkin module provides:
//! - Eligibility checks with calendar-day and cooldown rules
//! - Streak continuity and periodic streak bonuses
//! - One ad bonus per check-in
//!
//! States are `Eligible ⇄ Claimed` per day, with an orthogonal
//! `AdBonusAvailable ⇄ AdBonusClaimed` scoped to the current check-in id.

pub mod engine;
pub mod types;

pub use types::{AdBonusAward, CheckInAward, CheckInPolicy, CheckInRejection, CheckInStatus};

pub use engine::{can_check_in, claim_ad_bonus, perform_check_in, streak_bonus};
