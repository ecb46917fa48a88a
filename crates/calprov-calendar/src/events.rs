//! Event operations scoped to a calendar.

use tracing::instrument;

use crate::client::ApiSession;
use crate::error::CalendarError;
use crate::types::*;

/// Obtained from [`crate::CalendarClient::events`].
pub struct EventClient {
    session: ApiSession,
}

impl EventClient {
    pub(crate) fn new(session: ApiSession) -> Self {
        tracing::debug!("Event client initialized");
        Self { session }
    }

    #[instrument(skip(self, event), fields(name = ?event.name), level = "info")]
    pub async fn create(&self, calendar_id: &str, event: &NewEvent) -> Result<Event, CalendarError> {
        let payload = event
            .to_resource()
            .inspect_err(|e| tracing::error!("Error creating event: {}", e))?;
        tracing::info!(
            "Creating event: {}",
            payload.summary.as_deref().unwrap_or_default()
        );

        let created: Event = self
            .session
            .post(&self.session.url(&["calendars", calendar_id, "events"]), &payload)
            .await
            .inspect_err(|e| tracing::error!("Error creating event: {}", e))?;

        tracing::info!("Event {} successfully created", created.id);
        Ok(created)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        tracing::info!(
            "Deleting event with id: {} from calendar {}",
            event_id,
            calendar_id
        );

        self.session
            .delete(&self.event_url(calendar_id, event_id))
            .await
            .inspect_err(|e| tracing::error!("Error deleting event {}: {}", event_id, e))?;

        tracing::info!("Event {} successfully deleted", event_id);
        Ok(())
    }

    /// Id of the first event whose summary contains `query.name`.
    #[instrument(skip(self), level = "info")]
    pub async fn select(
        &self,
        calendar_id: &str,
        query: &EventQuery,
    ) -> Result<Option<String>, CalendarError> {
        tracing::info!("Selecting event by name: {}", query.name);

        let events = self
            .list_events(calendar_id)
            .await
            .inspect_err(|e| tracing::error!("Error selecting event: {}", e))?;

        let found = events.into_iter().find(|event| {
            event
                .summary
                .as_deref()
                .is_some_and(|summary| summary.contains(&query.name))
        });

        match found {
            Some(event) => {
                tracing::info!("Event {} selected", event.id);
                Ok(Some(event.id))
            }
            None => {
                tracing::warn!("Event with name {} not found", query.name);
                Ok(None)
            }
        }
    }

    /// Fetch, overlay `update`, and write back the full event.
    ///
    /// Start, end and reminders are sent back exactly as fetched.
    #[instrument(skip(self, update), level = "info")]
    pub async fn edit(
        &self,
        calendar_id: &str,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<Event, CalendarError> {
        tracing::info!("Editing event with id: {}", event_id);

        let updated = self
            .replace(&self.event_url(calendar_id, event_id), update)
            .await
            .inspect_err(|e| tracing::error!("Error editing event {}: {}", event_id, e))?;

        tracing::info!("Event {} successfully updated", event_id);
        Ok(updated)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn get(&self, calendar_id: &str, event_id: &str) -> Result<Event, CalendarError> {
        self.session
            .get(&self.event_url(calendar_id, event_id), &[])
            .await
            .inspect_err(|e| tracing::error!("Error retrieving event {}: {}", event_id, e))
    }

    async fn replace(&self, url: &str, update: &EventUpdate) -> Result<Event, CalendarError> {
        let mut event: Event = self.session.get(url, &[]).await?;
        update.apply(&mut event);
        self.session.put(url, &event).await
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        self.session
            .url(&["calendars", calendar_id, "events", event_id])
    }

    async fn list_events(&self, calendar_id: &str) -> Result<Vec<Event>, CalendarError> {
        let url = self.session.url(&["calendars", calendar_id, "events"]);
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let query: Vec<(&str, String)> = page_token
                .take()
                .map(|token| vec![("pageToken", token)])
                .unwrap_or_default();

            let page: EventListResponse = self.session.get(&url, &query).await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }
}
