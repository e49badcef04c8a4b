use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

pub const DEFAULT_CANCELLATION_REASON: &str = "cancelled by requester";
pub const REVIEW_FLAG_THRESHOLD: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupStatus {
    Pending,
    Accepted,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub fn parse(value: &str) -> Option<PickupStatus> {
        match value {
            "pending" => Some(PickupStatus::Pending),
            "accepted" => Some(PickupStatus::Accepted),
            "scheduled" => Some(PickupStatus::Scheduled),
            "in_progress" => Some(PickupStatus::InProgress),
            "completed" => Some(PickupStatus::Completed),
            "cancelled" => Some(PickupStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Accepted => "accepted",
            PickupStatus::Scheduled => "scheduled",
            PickupStatus::InProgress => "in_progress",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PickupStatus::Completed | PickupStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: PickupStatus) -> bool {
        use PickupStatus::*;
        matches!(
            (self, target),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, Scheduled)
                | (Accepted, Cancelled)
                | (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    /// Statuses from which the requesting household may still back out.
    pub fn cancellable_by_requester(&self) -> bool {
        matches!(
            self,
            PickupStatus::Pending | PickupStatus::Accepted | PickupStatus::Scheduled
        )
    }
}

pub fn check_transition(from: PickupStatus, to: PickupStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "cannot transition pickup from {} to {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub fn parse(value: &str) -> Option<TimeSlot> {
        match value {
            "morning" => Some(TimeSlot::Morning),
            "afternoon" => Some(TimeSlot::Afternoon),
            "evening" => Some(TimeSlot::Evening),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
        }
    }
}

/// Earliest legal scheduled date is tomorrow; both dates are compared at
/// day granularity.
pub fn check_scheduled_date(scheduled: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if scheduled > today {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "scheduled_date must be at least one day in the future",
        ))
    }
}

/// Rounded total for a set of (weight in kg, points-per-kg rate) pairs.
pub fn compute_points(items: &[(f64, i32)]) -> i32 {
    let total: f64 = items
        .iter()
        .map(|(weight, rate)| weight * f64::from(*rate))
        .sum();
    total.round() as i32
}

pub fn total_weight(weights: &[f64]) -> f64 {
    weights.iter().sum()
}
