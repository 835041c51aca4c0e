//! Contract, payment and assignment statuses plus the renew/terminate rules.
//!
//! These are pure checks over a contract's current state. The API layer
//! loads the row under a lock, runs the check, then writes the transition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, FieldError};
use crate::types::Date;
use crate::validation::{parse_date, MIN_TERMINATION_REASON_LENGTH};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $all:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        /// Every stored text value, in declaration order.
        pub const $all: &[&str] = &[$( $text ),+];

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {} '{other}'. Must be one of: {}",
                        stringify!($name),
                        $all.join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Contract lifecycle status.
    ContractStatus, CONTRACT_STATUSES {
        #[default]
        Active = "ACTIVE",
        Expired = "EXPIRED",
        Terminated = "TERMINATED",
        Renewed = "RENEWED",
    }
}

text_enum! {
    /// Billing state of a contract, independent of its lifecycle.
    PaymentStatus, PAYMENT_STATUSES {
        #[default]
        Pending = "PENDING",
        Paid = "PAID",
        Overdue = "OVERDUE",
        Cancelled = "CANCELLED",
    }
}

text_enum! {
    /// Service assignment status. Only `ACTIVE` blocks contract termination
    /// and KPI deletion.
    AssignmentStatus, ASSIGNMENT_STATUSES {
        #[default]
        Active = "ACTIVE",
        Paused = "PAUSED",
        Completed = "COMPLETED",
    }
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

impl ContractStatus {
    /// Statuses reachable from `self`.
    ///
    /// - `ACTIVE`     -> `RENEWED`, `EXPIRED`, `TERMINATED`
    /// - `RENEWED`    -> `RENEWED`, `EXPIRED`, `TERMINATED`
    /// - `EXPIRED`    -> `RENEWED`, `TERMINATED`
    /// - `TERMINATED` -> (none)
    pub fn valid_transitions(self) -> &'static [ContractStatus] {
        use ContractStatus::*;
        match self {
            Active => &[Renewed, Expired, Terminated],
            Renewed => &[Renewed, Expired, Terminated],
            Expired => &[Renewed, Terminated],
            Terminated => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ContractStatus::Terminated
    }
}

/// Validate a status change requested through a plain update.
///
/// Setting the same status is a no-op and allowed (except on a terminated
/// contract). `TERMINATED` is only reachable through [`check_termination`],
/// which records a reason and date.
pub fn validate_status_change(
    current: ContractStatus,
    next: ContractStatus,
) -> Result<(), CoreError> {
    if current.is_terminal() {
        return Err(CoreError::PreconditionFailed(
            "Contract is terminated and can no longer be modified".into(),
        ));
    }
    if next == ContractStatus::Terminated {
        return Err(CoreError::PreconditionFailed(
            "Use the terminate operation to terminate a contract".into(),
        ));
    }
    if current == next || current.valid_transitions().contains(&next) {
        Ok(())
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "Cannot change contract status from {current} to {next}"
        )))
    }
}

/// `start_date < end_date`, checked after merging a partial update onto
/// the stored contract.
pub fn check_date_order(start_date: Date, end_date: Date) -> Result<(), CoreError> {
    if start_date < end_date {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(vec![FieldError::new(
            "endDate",
            "End date must be after start date",
        )]))
    }
}

// ---------------------------------------------------------------------------
// Renewal
// ---------------------------------------------------------------------------

/// The slice of a contract the lifecycle rules look at.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleState {
    pub status: ContractStatus,
    pub is_renewable: bool,
    pub end_date: Date,
}

/// Check whether a contract may be renewed to `new_end_date`.
///
/// The renewable flag and terminal status are checked before the date so a
/// non-renewable contract fails the same way whatever date is supplied.
/// The new end date must fall strictly after the current one.
pub fn check_renewal(state: &LifecycleState, new_end_date: Option<&str>) -> Result<Date, CoreError> {
    if !state.is_renewable {
        return Err(CoreError::PreconditionFailed(
            "Contract is not renewable".into(),
        ));
    }
    if state.status.is_terminal() {
        return Err(CoreError::PreconditionFailed(
            "Terminated contracts cannot be renewed".into(),
        ));
    }

    let raw = new_end_date
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("newEndDate is required".into()))?;
    let new_end = parse_date(raw)
        .ok_or_else(|| CoreError::Validation(format!("newEndDate '{raw}' is not a valid date")))?;

    if new_end <= state.end_date {
        return Err(CoreError::PreconditionFailed(format!(
            "New end date {new_end} must be after the current end date {}",
            state.end_date
        )));
    }
    Ok(new_end)
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// Check whether a contract may be terminated, returning the trimmed reason.
///
/// `active_assignments` is the number of service assignments on the
/// contract whose status is `ACTIVE`; any such assignment blocks termination.
pub fn check_termination(
    status: ContractStatus,
    reason: Option<&str>,
    active_assignments: i64,
) -> Result<String, CoreError> {
    let reason = reason.map(str::trim).unwrap_or_default();
    if reason.chars().count() < MIN_TERMINATION_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "reason must be at least {MIN_TERMINATION_REASON_LENGTH} characters"
        )));
    }
    if status.is_terminal() {
        return Err(CoreError::PreconditionFailed(
            "Contract is already terminated".into(),
        ));
    }
    if active_assignments > 0 {
        return Err(CoreError::Conflict(format!(
            "Contract has {active_assignments} active service assignment(s)"
        )));
    }
    Ok(reason.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(status: ContractStatus, is_renewable: bool) -> LifecycleState {
        LifecycleState {
            status,
            is_renewable,
            end_date: date(2025, 12, 31),
        }
    }

    // -- enums ---------------------------------------------------------------

    #[test]
    fn status_round_trips_through_text() {
        for s in CONTRACT_STATUSES {
            let parsed: ContractStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("active".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn status_serializes_screaming_case() {
        let json = serde_json::to_string(&PaymentStatus::Overdue).unwrap();
        assert_eq!(json, "\"OVERDUE\"");
    }

    // -- renewal -------------------------------------------------------------

    #[test]
    fn defaults_match_new_row_defaults() {
        assert_eq!(ContractStatus::default(), ContractStatus::Active);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(AssignmentStatus::default(), AssignmentStatus::Active);
    }

    #[test]
    fn renewal_moves_end_date_forward() {
        let new_end = check_renewal(&state(ContractStatus::Active, true), Some("2026-12-31")).unwrap();
        assert_eq!(new_end, date(2026, 12, 31));
    }

    #[test]
    fn renewal_accepts_rfc3339_dates() {
        let new_end =
            check_renewal(&state(ContractStatus::Renewed, true), Some("2026-06-30T00:00:00Z")).unwrap();
        assert_eq!(new_end, date(2026, 6, 30));
    }

    #[test]
    fn non_renewable_fails_regardless_of_date() {
        for input in [Some("2026-12-31"), Some("not a date"), Some(""), None] {
            assert_matches!(
                check_renewal(&state(ContractStatus::Active, false), input),
                Err(CoreError::PreconditionFailed(_))
            );
        }
    }

    #[test]
    fn terminated_contract_cannot_be_renewed() {
        assert_matches!(
            check_renewal(&state(ContractStatus::Terminated, true), Some("2026-12-31")),
            Err(CoreError::PreconditionFailed(_))
        );
    }

    #[test]
    fn renewal_requires_a_date() {
        assert_matches!(
            check_renewal(&state(ContractStatus::Active, true), None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            check_renewal(&state(ContractStatus::Active, true), Some("  ")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            check_renewal(&state(ContractStatus::Active, true), Some("31/12/2026")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn renewal_rejects_dates_not_after_current_end() {
        assert_matches!(
            check_renewal(&state(ContractStatus::Active, true), Some("2025-12-31")),
            Err(CoreError::PreconditionFailed(_))
        );
        assert_matches!(
            check_renewal(&state(ContractStatus::Active, true), Some("2025-01-01")),
            Err(CoreError::PreconditionFailed(_))
        );
    }

    // -- termination ---------------------------------------------------------

    #[test]
    fn termination_returns_trimmed_reason() {
        let reason = check_termination(ContractStatus::Active, Some("  budget cut "), 0).unwrap();
        assert_eq!(reason, "budget cut");
    }

    #[test]
    fn termination_requires_meaningful_reason() {
        assert_matches!(
            check_termination(ContractStatus::Active, None, 0),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            check_termination(ContractStatus::Active, Some(" ab "), 0),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn second_termination_is_a_precondition_failure() {
        assert_matches!(
            check_termination(ContractStatus::Terminated, Some("again"), 0),
            Err(CoreError::PreconditionFailed(_))
        );
    }

    #[test]
    fn active_assignments_block_termination() {
        assert_matches!(
            check_termination(ContractStatus::Active, Some("client left"), 2),
            Err(CoreError::Conflict(_))
        );
    }

    // -- status changes ------------------------------------------------------

    #[test]
    fn merged_dates_must_stay_ordered() {
        assert!(check_date_order(date(2025, 1, 1), date(2025, 1, 2)).is_ok());
        assert_matches!(
            check_date_order(date(2025, 1, 1), date(2025, 1, 1)),
            Err(CoreError::InvalidFields(ref f)) if f[0].field == "endDate"
        );
    }

    #[test]
    fn status_change_rules() {
        use ContractStatus::*;
        assert!(validate_status_change(Active, Expired).is_ok());
        assert!(validate_status_change(Active, Active).is_ok());
        assert!(validate_status_change(Expired, Renewed).is_ok());
        assert!(validate_status_change(Expired, Active).is_err());
        assert!(validate_status_change(Active, Terminated).is_err());
        assert!(validate_status_change(Terminated, Active).is_err());
        assert!(validate_status_change(Terminated, Terminated).is_err());
    }
}
