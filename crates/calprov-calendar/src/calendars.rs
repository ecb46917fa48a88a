//! Calendar resource operations and sharing.

use calprov_core::ApiSettings;
use tracing::instrument;

use crate::client::ApiSession;
use crate::error::CalendarError;
use crate::events::EventClient;
use crate::types::*;

pub struct CalendarClient {
    session: ApiSession,
}

impl CalendarClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_session(ApiSession::new(access_token))
    }

    pub fn new_with_base_url(access_token: &str, base_url: &str) -> Self {
        Self::with_session(ApiSession::new_with_base_url(access_token, base_url))
    }

    pub fn from_settings(access_token: &str, settings: &ApiSettings) -> Result<Self, CalendarError> {
        Ok(Self::with_session(ApiSession::from_settings(
            access_token,
            settings,
        )?))
    }

    pub fn with_session(session: ApiSession) -> Self {
        tracing::debug!("Calendar client using {}", session.base_url());
        Self { session }
    }

    /// Event operations over the same session.
    pub fn events(&self) -> EventClient {
        EventClient::new(self.session.clone())
    }

    /// Create a calendar, then share it with every address in `share`.
    ///
    /// A sharing failure is returned as [`CalendarError::Share`]; the calendar
    /// itself stays created.
    #[instrument(skip(self, calendar), fields(name = ?calendar.name), level = "info")]
    pub async fn create(&self, calendar: &NewCalendar) -> Result<Calendar, CalendarError> {
        let payload = calendar.to_resource();
        tracing::info!("Creating calendar: {}", payload.summary);

        let created: Calendar = self
            .session
            .post(&self.session.url(&["calendars"]), &payload)
            .await
            .inspect_err(|e| tracing::error!("Error creating calendar: {}", e))?;

        tracing::info!("Calendar {} successfully created", created.id);

        self.share_all(&created.id, &calendar.share, calendar.role)
            .await?;
        Ok(created)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn delete(&self, calendar_id: &str) -> Result<(), CalendarError> {
        tracing::info!("Deleting calendar with id: {}", calendar_id);

        self.session
            .delete(&self.session.url(&["calendars", calendar_id]))
            .await
            .inspect_err(|e| tracing::error!("Error deleting calendar {}: {}", calendar_id, e))?;

        tracing::info!("Calendar {} successfully deleted", calendar_id);
        Ok(())
    }

    /// Id of the first calendar in the user's list whose name equals `query.name`.
    #[instrument(skip(self), level = "info")]
    pub async fn select(&self, query: &CalendarQuery) -> Result<Option<String>, CalendarError> {
        tracing::info!("Selecting calendar by name: {}", query.name);

        let calendars = self
            .list_calendars()
            .await
            .inspect_err(|e| tracing::error!("Error selecting calendar: {}", e))?;

        match calendars.into_iter().find(|c| c.summary == query.name) {
            Some(calendar) => {
                tracing::info!("Calendar {} selected", calendar.id);
                Ok(Some(calendar.id))
            }
            None => {
                tracing::warn!("Calendar with name {} not found", query.name);
                Ok(None)
            }
        }
    }

    /// Fetch, overlay `update`, and write back the full calendar.
    #[instrument(skip(self, update), level = "info")]
    pub async fn edit(
        &self,
        calendar_id: &str,
        update: &CalendarUpdate,
    ) -> Result<Calendar, CalendarError> {
        tracing::info!("Editing calendar with id: {}", calendar_id);

        let updated = self
            .replace(calendar_id, update)
            .await
            .inspect_err(|e| tracing::error!("Error updating calendar {}: {}", calendar_id, e))?;

        tracing::info!("Calendar {} successfully updated", calendar_id);

        self.share_all(calendar_id, &update.share, update.share_role)
            .await?;
        Ok(updated)
    }

    async fn replace(
        &self,
        calendar_id: &str,
        update: &CalendarUpdate,
    ) -> Result<Calendar, CalendarError> {
        let url = self.session.url(&["calendars", calendar_id]);
        let mut calendar: Calendar = self.session.get(&url, &[]).await?;
        update.apply(&mut calendar);
        self.session.put(&url, &calendar).await
    }

    /// Events starting from `range.from`, expanded and ordered by start time.
    #[instrument(skip(self), level = "info")]
    pub async fn event_list(
        &self,
        calendar_id: &str,
        range: &EventRange,
    ) -> Result<Vec<Event>, CalendarError> {
        tracing::info!("Retrieving event list for calendar {}", calendar_id);

        let mut query = vec![
            ("timeMin", range.from.to_rfc3339()),
            ("maxResults", range.limit.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(till) = range.till {
            query.push(("timeMax", till.to_rfc3339()));
        }

        let response: EventListResponse = self
            .session
            .get(&self.session.url(&["calendars", calendar_id, "events"]), &query)
            .await
            .inspect_err(|e| {
                tracing::error!("Error retrieving event list for calendar {}: {}", calendar_id, e)
            })?;

        tracing::info!(
            "Found {} events for calendar {}",
            response.items.len(),
            calendar_id
        );
        Ok(response.items)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn get(&self, calendar_id: &str) -> Result<Calendar, CalendarError> {
        tracing::info!("Retrieving information for calendar {}", calendar_id);

        let calendar = self
            .session
            .get(&self.session.url(&["calendars", calendar_id]), &[])
            .await
            .inspect_err(|e| {
                tracing::error!("Error retrieving information for calendar {}: {}", calendar_id, e)
            })?;

        tracing::info!("Information for calendar {} successfully retrieved", calendar_id);
        Ok(calendar)
    }

    /// Grant `role` on a calendar to `email`.
    ///
    /// Looks up the rule `user:<email>` and updates its role when it exists,
    /// inserting a new rule only when the lookup reports not found. The two
    /// requests are not atomic: a rule created by someone else between them
    /// can produce a duplicate insert.
    #[instrument(skip(self), level = "info")]
    pub async fn share(
        &self,
        calendar_id: &str,
        email: &str,
        role: AclRole,
    ) -> Result<AclRule, CalendarError> {
        tracing::info!("Sharing calendar {} with {} as {}", calendar_id, email, role);

        let rule = self.upsert_rule(calendar_id, email, role).await.inspect_err(|e| {
            tracing::error!("Error sharing calendar {} with {}: {}", calendar_id, email, e)
        })?;

        tracing::info!("Calendar {} shared with {} as {}", calendar_id, email, rule.role);
        Ok(rule)
    }

    async fn upsert_rule(
        &self,
        calendar_id: &str,
        email: &str,
        role: AclRole,
    ) -> Result<AclRule, CalendarError> {
        let scope = AclScope::user(email);
        let rule_url = self
            .session
            .url(&["calendars", calendar_id, "acl", &scope.rule_id()]);

        match self.session.get::<AclRule>(&rule_url, &[]).await {
            Ok(mut existing) => {
                tracing::debug!("Updating existing rule {}", existing.id);
                existing.role = role;
                let url = if existing.id.is_empty() {
                    rule_url
                } else {
                    self.session
                        .url(&["calendars", calendar_id, "acl", &existing.id])
                };
                self.session.put(&url, &existing).await
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("No rule for {}, inserting", email);
                self.session
                    .post(
                        &self.session.url(&["calendars", calendar_id, "acl"]),
                        &AclRule::for_user(email, role),
                    )
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn share_all(
        &self,
        calendar_id: &str,
        emails: &[String],
        role: AclRole,
    ) -> Result<(), CalendarError> {
        for email in emails {
            self.share(calendar_id, email, role)
                .await
                .map_err(|source| CalendarError::Share {
                    calendar_id: calendar_id.to_string(),
                    email: email.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    /// All entries of the user's calendar list, following page tokens.
    async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        let url = self.session.url(&["users", "me", "calendarList"]);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let query: Vec<(&str, String)> = page_token
                .take()
                .map(|token| vec![("pageToken", token)])
                .unwrap_or_default();

            let page: CalendarListResponse = self.session.get(&url, &query).await?;
            calendars.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(calendars)
    }
}
