//! Side-effect fields computed from a partial update.
//!
//! Each function takes the caller's patch and returns it with the derived
//! fields filled in. Rules only look at what the payload carries, never at the
//! stored row, so the same function serves create and update. `now` is captured
//! once per request by the caller.

use chrono::{DateTime, Utc};

use crate::models::application::{ApplicationPatch, ApplicationStatus};
use crate::models::contact::ContactPatch;
use crate::models::event::{EventPatch, EventStatus};
use crate::models::learning::{LearningItemPatch, LearningStatus};
use crate::models::reminder::ReminderPatch;
use crate::models::task::TaskPatch;

/// Moving to APPLIED stamps `appliedDate` unless the payload dates it itself.
/// A `null` or blank date is not a date.
pub fn application(mut patch: ApplicationPatch, now: DateTime<Utc>) -> ApplicationPatch {
    if patch.status == Some(ApplicationStatus::Applied) && !supplied(&patch.applied_date) {
        patch.applied_date = Some(Some(now));
    }
    patch
}

/// Any status implying a message went out stamps `messagedDate`.
pub fn contact(mut patch: ContactPatch, now: DateTime<Utc>) -> ContactPatch {
    let messaged = patch.status.is_some_and(|status| status.implies_messaged());
    if messaged && !supplied(&patch.messaged_date) {
        patch.messaged_date = Some(Some(now));
    }
    patch
}

pub fn reminder(mut patch: ReminderPatch, now: DateTime<Utc>) -> ReminderPatch {
    patch.completed_at = completion(patch.is_completed, patch.completed_at, now);
    patch
}

pub fn task(mut patch: TaskPatch, now: DateTime<Utc>) -> TaskPatch {
    patch.completed_at = completion(patch.is_completed, patch.completed_at, now);
    patch
}

/// Completing an event always restamps it and forces COMPLETED.
pub fn event(mut patch: EventPatch, now: DateTime<Utc>) -> EventPatch {
    match patch.is_completed {
        Some(true) => {
            patch.completed_at = Some(Some(now));
            patch.status = Some(EventStatus::Completed);
        }
        Some(false) => patch.completed_at = Some(None),
        None => {}
    }
    patch
}

pub fn learning_item(mut patch: LearningItemPatch, now: DateTime<Utc>) -> LearningItemPatch {
    match patch.status {
        Some(LearningStatus::InProgress) if !supplied(&patch.started_at) => {
            patch.started_at = Some(Some(now));
        }
        Some(LearningStatus::Completed) => {
            patch.completed_at = Some(Some(now));
            patch.progress = Some(100);
        }
        _ => {}
    }
    patch
}

/// True when the payload carries an actual timestamp.
fn supplied(field: &Option<Option<DateTime<Utc>>>) -> bool {
    matches!(field, Some(Some(_)))
}

/// Pairs a completion timestamp with its flag. Clearing the flag always
/// clears the timestamp; setting it stamps `now` unless one was supplied.
fn completion(
    is_completed: Option<bool>,
    completed_at: Option<Option<DateTime<Utc>>>,
    now: DateTime<Utc>,
) -> Option<Option<DateTime<Utc>>> {
    match is_completed {
        Some(true) if supplied(&completed_at) => completed_at,
        Some(true) => Some(Some(now)),
        Some(false) => Some(None),
        None => completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contact::ContactStatus;
    use chrono::Duration;

    #[test]
    fn test_applied_status_stamps_applied_date() {
        let now = Utc::now();
        let patch = application(
            ApplicationPatch {
                status: Some(ApplicationStatus::Applied),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.applied_date, Some(Some(now)));
    }

    #[test]
    fn test_explicit_applied_date_wins() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);
        let patch = application(
            ApplicationPatch {
                status: Some(ApplicationStatus::Applied),
                applied_date: Some(Some(earlier)),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.applied_date, Some(Some(earlier)));
    }

    #[test]
    fn test_other_application_status_leaves_date_alone() {
        let patch = application(
            ApplicationPatch {
                status: Some(ApplicationStatus::InReview),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(patch.applied_date.is_none());
    }

    #[test]
    fn test_contact_messaged_statuses() {
        let now = Utc::now();
        for status in [
            ContactStatus::Messaged,
            ContactStatus::Replied,
            ContactStatus::MeetingScheduled,
        ] {
            let patch = contact(
                ContactPatch {
                    status: Some(status),
                    ..Default::default()
                },
                now,
            );
            assert_eq!(patch.messaged_date, Some(Some(now)), "{status}");
        }

        let patch = contact(
            ContactPatch {
                status: Some(ContactStatus::Connected),
                ..Default::default()
            },
            now,
        );
        assert!(patch.messaged_date.is_none());
    }

    #[test]
    fn test_task_completion_toggle() {
        let now = Utc::now();
        let done = task(
            TaskPatch {
                is_completed: Some(true),
                ..Default::default()
            },
            now,
        );
        assert_eq!(done.completed_at, Some(Some(now)));

        let undone = task(
            TaskPatch {
                is_completed: Some(false),
                completed_at: Some(Some(now)),
                ..Default::default()
            },
            now,
        );
        assert_eq!(undone.completed_at, Some(None));
    }

    #[test]
    fn test_task_supplied_completed_at_kept() {
        let now = Utc::now();
        let earlier = now - Duration::hours(2);
        let patch = task(
            TaskPatch {
                is_completed: Some(true),
                completed_at: Some(Some(earlier)),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.completed_at, Some(Some(earlier)));
    }

    #[test]
    fn test_reminder_follows_same_pairing() {
        let now = Utc::now();
        let patch = reminder(
            ReminderPatch {
                is_completed: Some(true),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.completed_at, Some(Some(now)));

        let untouched = reminder(ReminderPatch::default(), now);
        assert!(untouched.completed_at.is_none());
    }

    #[test]
    fn test_event_completion_forces_status_and_time() {
        let now = Utc::now();
        let patch = event(
            EventPatch {
                is_completed: Some(true),
                status: Some(EventStatus::Skipped),
                completed_at: Some(Some(now - Duration::days(1))),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.status, Some(EventStatus::Completed));
        assert_eq!(patch.completed_at, Some(Some(now)));
    }

    #[test]
    fn test_learning_completed_forces_progress() {
        let now = Utc::now();
        let patch = learning_item(
            LearningItemPatch {
                status: Some(LearningStatus::Completed),
                progress: Some(40),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.progress, Some(100));
        assert_eq!(patch.completed_at, Some(Some(now)));
    }

    #[test]
    fn test_learning_in_progress_stamps_started_at() {
        let now = Utc::now();
        let patch = learning_item(
            LearningItemPatch {
                status: Some(LearningStatus::InProgress),
                ..Default::default()
            },
            now,
        );
        assert_eq!(patch.started_at, Some(Some(now)));
        assert!(patch.completed_at.is_none());
    }

    #[test]
    fn test_null_or_blank_date_does_not_block_stamp() {
        let now = Utc::now();
        for raw in [
            serde_json::json!({ "status": "APPLIED", "appliedDate": null }),
            serde_json::json!({ "status": "APPLIED", "appliedDate": "" }),
        ] {
            let patch: ApplicationPatch = serde_json::from_value(raw).unwrap();
            assert_eq!(application(patch, now).applied_date, Some(Some(now)));
        }

        let patch: ContactPatch =
            serde_json::from_value(serde_json::json!({ "status": "REPLIED", "messagedDate": null }))
                .unwrap();
        assert_eq!(contact(patch, now).messaged_date, Some(Some(now)));

        let patch: LearningItemPatch =
            serde_json::from_value(serde_json::json!({ "status": "IN_PROGRESS", "startedAt": "" }))
                .unwrap();
        assert_eq!(learning_item(patch, now).started_at, Some(Some(now)));
    }

    #[test]
    fn test_completing_with_null_timestamp_still_stamps() {
        let now = Utc::now();
        let done = task(
            TaskPatch {
                is_completed: Some(true),
                completed_at: Some(None),
                ..Default::default()
            },
            now,
        );
        assert_eq!(done.completed_at, Some(Some(now)));

        let patch: ReminderPatch =
            serde_json::from_value(serde_json::json!({ "isCompleted": true, "completedAt": null }))
                .unwrap();
        assert_eq!(reminder(patch, now).completed_at, Some(Some(now)));
    }
}
