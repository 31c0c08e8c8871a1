use crate::model::{Reminder, Task};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

/// Fixed lead times before a reminder's instant, evaluated in descending
/// order so derived events come out furthest-first per reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOffset {
    DayBefore,
    HourBefore,
    FiveMinutesBefore,
    AtDueTime,
}

impl LeadOffset {
    pub const ALL: [LeadOffset; 4] = [
        LeadOffset::DayBefore,
        LeadOffset::HourBefore,
        LeadOffset::FiveMinutesBefore,
        LeadOffset::AtDueTime,
    ];

    pub fn duration(self) -> Duration {
        match self {
            Self::DayBefore => Duration::hours(24),
            Self::HourBefore => Duration::hours(1),
            Self::FiveMinutesBefore => Duration::minutes(5),
            Self::AtDueTime => Duration::ZERO,
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            Self::DayBefore => "due in 24 hours",
            Self::HourBefore => "due in 1 hour",
            Self::FiveMinutesBefore => "due in 5 minutes",
            Self::AtDueTime => "due now",
        }
    }
}

/// One notification to schedule. Derived fresh on every reschedule call and
/// never persisted; the dispatcher's own bookkeeping is the only record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireEvent {
    pub task_id: i64,
    pub source_instant: OffsetDateTime,
    pub lead: LeadOffset,
    pub fire_at: OffsetDateTime,
    pub tag: String,
    pub message: String,
}

/// All of a task's scheduled work shares this tag, so one cancel call
/// clears the whole group.
pub fn notification_tag(task_id: i64) -> String {
    format!("task_notification_{task_id}")
}

/// Resolve a reminder's `(date, time)` pair to an instant in `offset`.
/// Returns `None` when either part does not parse.
pub fn reminder_instant(reminder: &Reminder, offset: UtcOffset) -> Option<OffsetDateTime> {
    let date = Date::parse(reminder.date.trim(), DATE_FORMAT).ok()?;
    let time = Time::parse(reminder.time.trim(), TIME_FORMAT).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// Compute the fire-events for one task.
///
/// Pure: same inputs, same output. Reminders that fail to parse are
/// skipped. Events whose fire time is not strictly after `now` are
/// excluded; an event landing exactly on `now` would race the dispatcher,
/// so equality is dropped too. Reminder wall-clock values are interpreted
/// in `now`'s offset.
pub fn derive(task: &Task, reminders: &[Reminder], now: OffsetDateTime) -> Vec<FireEvent> {
    if task.is_completed {
        return Vec::new();
    }

    let mut events = Vec::new();
    for reminder in reminders {
        let Some(instant) = reminder_instant(reminder, now.offset()) else {
            tracing::debug!(
                reminder_id = reminder.id,
                task_id = reminder.task_id,
                date = %reminder.date,
                time = %reminder.time,
                "skipping reminder with unparsable date or time"
            );
            continue;
        };

        for lead in LeadOffset::ALL {
            let fire_at = instant - lead.duration();
            if fire_at <= now {
                continue;
            }
            events.push(FireEvent {
                task_id: task.id,
                source_instant: instant,
                lead,
                fire_at,
                tag: notification_tag(task.id),
                message: format!("{} is {}", task.title, lead.phrase()),
            });
        }
    }

    events
}
