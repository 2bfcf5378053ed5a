// ── Refresh application logic ──
//
// Applies freshly fetched row sets to the BoardStore. Rows that fail
// domain conversion are dropped with a warning; one malformed row must
// never block a refresh.

use chrono::Utc;
use tracing::warn;

use lifeline_api::rows::{ActivityRow, CrewRow, PersonnelRow, RequestRow};

use super::BoardStore;
use crate::model::{ActivityEntry, Crew, Personnel, ServiceRequest};

/// Convert rows, dropping and logging any that fail.
fn convert_rows<R, T>(table: &'static str, rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = crate::error::CoreError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(table, error = %e, "dropping malformed row");
                None
            }
        })
        .collect()
}

impl BoardStore {
    pub(crate) fn apply_requests(&self, rows: Vec<RequestRow>) {
        self.requests
            .replace_all(convert_rows::<_, ServiceRequest>("service_requests", rows));
    }

    pub(crate) fn apply_crews(&self, rows: Vec<CrewRow>) {
        self.crews.replace_all(convert_rows::<_, Crew>("crews", rows));
    }

    pub(crate) fn apply_personnel(&self, rows: Vec<PersonnelRow>) {
        self.personnel
            .replace_all(convert_rows::<_, Personnel>("users", rows));
    }

    pub(crate) fn apply_activity(&self, rows: Vec<ActivityRow>) {
        self.activity
            .replace_all(convert_rows::<_, ActivityEntry>("activity_log", rows));
    }

    /// Stamp the store after all four tables have been applied.
    pub(crate) fn mark_refreshed(&self) {
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    pub(crate) fn mark_feed_event(&self) {
        self.last_feed_event.send_replace(Some(Utc::now()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request_row(id: &str, status: &str) -> RequestRow {
        RequestRow {
            id: id.into(),
            service: "SAR".into(),
            priority: "high".into(),
            location: "Daymar".into(),
            description: None,
            status: status.into(),
            requester_id: None,
            requester_name: "Eli".into(),
            discord_username: None,
            assigned_crew_id: None,
            dispatcher_id: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let store = BoardStore::new();
        store.apply_requests(vec![
            request_row("r1", "pending"),
            request_row("r2", "not-a-status"),
            request_row("r3", "assigned"),
        ]);

        assert_eq!(store.request_count(), 2);
    }

    #[test]
    fn refresh_stamps_the_store() {
        let store = BoardStore::new();
        assert!(store.last_full_refresh().is_none());
        store.mark_refreshed();
        assert!(store.last_full_refresh().is_some());
        assert!(store.data_age().is_some());
    }
}
