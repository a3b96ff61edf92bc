//! Posting itinerary events to an external calendar

pub mod client;
pub mod credentials;
pub mod events;

pub use client::{CalendarService, GoogleCalendarClient, DEFAULT_CALENDAR_BASE_URL};
pub use credentials::{
    Credential, CredentialProvider, FileCredentialProvider, InMemoryCredentialProvider,
    StoredGrant,
};
pub use events::{extract_events, CalendarEvent, DaySlot};

use crate::error::TravelError;
use tracing::{info, warn};

/// Outcome of posting a batch of events
#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: usize,
    pub failures: Vec<(String, TravelError)>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Post every event, continuing past individual failures.
///
/// An authorization failure stops the batch since later events would fail
/// the same way.
pub async fn sync_plan(service: &dyn CalendarService, events: &[CalendarEvent]) -> SyncReport {
    let mut report = SyncReport::default();

    for event in events {
        match service.create_event(event).await {
            Ok(()) => report.created += 1,
            Err(err) => {
                warn!(
                    target: "trip_planner::calendar",
                    title = %event.title,
                    error = %err,
                    "failed to create event"
                );
                let stop = matches!(err, TravelError::Auth(_));
                report.failures.push((event.title.clone(), err));
                if stop {
                    break;
                }
            }
        }
    }

    info!(
        target: "trip_planner::calendar",
        created = report.created,
        failed = report.failures.len(),
        "calendar sync finished"
    );
    report
}
