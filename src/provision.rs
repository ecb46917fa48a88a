//! The provisioning run: two calendars, one event, then cleanup.

use anyhow::{Context, Result};
use calprov_auth::CredentialManager;
use calprov_calendar::{
    Alarm, Calendar, CalendarClient, CalendarQuery, CalendarUpdate, Event, EventUpdate,
    NewCalendar, NewEvent,
};
use calprov_core::Config;
use chrono::DateTime;

const WORK_CALENDAR: &str = "Work Calendar";
const PERSONAL_CALENDAR: &str = "Personal Calendar";
const CALENDAR_TIME_ZONE: &str = "GMT+03:00";

pub async fn run(config: &Config) -> Result<()> {
    let credentials = CredentialManager::for_google(&config.oauth)
        .await
        .context("failed to obtain credentials")?;

    let client = CalendarClient::from_settings(credentials.access_token(), &config.api)
        .context("failed to build calendar client")?;

    let created = create_calendars(&client).await?;
    let updated = select_and_edit_calendar(&client, WORK_CALENDAR).await?;
    create_and_edit_event(&client, &updated.id).await?;
    delete_calendars(&client, &created).await?;

    Ok(())
}

async fn create_calendars(client: &CalendarClient) -> Result<[Calendar; 2]> {
    let work = NewCalendar {
        description: Some("Calendar for work events".to_string()),
        timezone: Some(CALENDAR_TIME_ZONE.to_string()),
        ..NewCalendar::named(WORK_CALENDAR)
    };
    let personal = NewCalendar {
        description: Some("Calendar for personal events".to_string()),
        timezone: Some(CALENDAR_TIME_ZONE.to_string()),
        ..NewCalendar::named(PERSONAL_CALENDAR)
    };

    let work = client
        .create(&work)
        .await
        .context("calendar creation failed")?;
    let personal = client
        .create(&personal)
        .await
        .context("calendar creation failed")?;

    tracing::info!(
        "Successfully created calendars: {}, {}",
        work.id,
        personal.id
    );
    Ok([work, personal])
}

async fn select_and_edit_calendar(client: &CalendarClient, name: &str) -> Result<Calendar> {
    let calendar_id = client
        .select(&CalendarQuery {
            name: name.to_string(),
        })
        .await
        .context("calendar lookup failed")?
        .with_context(|| format!("calendar {} not found", name))?;

    tracing::info!("Selected calendar: {}", calendar_id);

    let update = CalendarUpdate {
        name: Some(format!("Updated {}", name)),
        description: Some(format!("Updated description for {}", name)),
        ..CalendarUpdate::default()
    };

    let updated = client
        .edit(&calendar_id, &update)
        .await
        .with_context(|| format!("failed to update calendar {}", calendar_id))?;

    tracing::info!("Successfully updated calendar: {}", updated.id);
    Ok(updated)
}

async fn create_and_edit_event(client: &CalendarClient, calendar_id: &str) -> Result<Event> {
    let events = client.events();

    let event = NewEvent {
        name: Some("Team Meeting".to_string()),
        description: Some("Discuss project progress".to_string()),
        alarms: vec![Alarm::popup("10")],
        ..NewEvent::new(
            DateTime::parse_from_rfc3339("2024-10-25T09:00:00+03:00")?,
            DateTime::parse_from_rfc3339("2024-10-25T10:00:00+03:00")?,
        )
    };

    let created = events
        .create(calendar_id, &event)
        .await
        .context("event creation failed")?;
    tracing::info!("Successfully created event: {}", created.id);

    let update = EventUpdate {
        name: Some("Updated Team Meeting".to_string()),
        description: Some("Updated discussion points for the project".to_string()),
    };

    let updated = events
        .edit(calendar_id, &created.id, &update)
        .await
        .with_context(|| format!("failed to update event {}", created.id))?;

    tracing::info!("Successfully updated event: {}", updated.id);
    Ok(updated)
}

async fn delete_calendars(client: &CalendarClient, calendars: &[Calendar]) -> Result<()> {
    for calendar in calendars {
        client
            .delete(&calendar.id)
            .await
            .with_context(|| format!("failed to delete calendar {}", calendar.id))?;
        tracing::info!("Successfully deleted calendar: {}", calendar.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use calprov_auth::{Credential, CredentialStore};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, dir: &std::path::Path) -> Config {
        let client_secret = dir.join("client_secret.json");
        std::fs::write(
            &client_secret,
            r#"{"installed": {"client_id": "id", "client_secret": "secret"}}"#,
        )
        .unwrap();

        let token_path = dir.join("creds.json");
        CredentialStore::new(&token_path)
            .save(&Credential {
                access_token: "stored_token".to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_at: chrono::Utc::now().timestamp() + 3600,
                scopes: vec![],
            })
            .unwrap();

        let mut config = Config::default();
        config.oauth.client_secret_path = client_secret;
        config.oauth.token_path = Some(token_path);
        config.api.base_url = server.uri();
        config
    }

    async fn mount_calendar_creation(server: &MockServer) {
        for (name, id) in [(WORK_CALENDAR, "work_id"), (PERSONAL_CALENDAR, "personal_id")] {
            Mock::given(method("POST"))
                .and(path("/calendars"))
                .and(body_partial_json(serde_json::json!({
                    "summary": name,
                    "timeZone": "GMT+03:00"
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": id,
                    "summary": name
                })))
                .expect(1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_full_run() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&server, dir.path());

        mount_calendar_creation(&server).await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "personal_id", "summary": PERSONAL_CALENDAR},
                    {"id": "work_id", "summary": WORK_CALENDAR}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/work_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "work_id",
                "summary": WORK_CALENDAR,
                "description": "Calendar for work events"
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/calendars/work_id"))
            .and(body_partial_json(serde_json::json!({
                "summary": "Updated Work Calendar",
                "description": "Updated description for Work Calendar"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "work_id",
                "summary": "Updated Work Calendar"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let event = serde_json::json!({
            "id": "event_1",
            "summary": "Team Meeting",
            "start": {"dateTime": "2024-10-25T09:00:00+03:00", "timeZone": "GMT+02:00"},
            "end": {"dateTime": "2024-10-25T10:00:00+03:00", "timeZone": "GMT+02:00"}
        });

        Mock::given(method("POST"))
            .and(path("/calendars/work_id/events"))
            .and(body_partial_json(serde_json::json!({
                "summary": "Team Meeting",
                "reminders": {"useDefault": false, "overrides": [{"method": "popup", "minutes": 10}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(event.clone()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/work_id/events/event_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(event.clone()))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/calendars/work_id/events/event_1"))
            .and(body_partial_json(serde_json::json!({"summary": "Updated Team Meeting"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(event))
            .expect(1)
            .mount(&server)
            .await;

        for id in ["work_id", "personal_id"] {
            Mock::given(method("DELETE"))
                .and(path(format!("/calendars/{}", id)))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;
        }

        run(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_calendar_stops_run() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&server, dir.path());

        mount_calendar_creation(&server).await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let err = run(&config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Work Calendar not found"));
    }
}
