#![allow(clippy::unwrap_used)]

use calprov_calendar::{
    CalendarClient, CalendarError, CalendarUpdate, EventRange, EventUpdate,
};
use chrono::DateTime;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CalendarClient {
    CalendarClient::new_with_base_url("test_token", &server.uri())
}

#[tokio::test]
async fn event_list_returns_items_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/mocked_calendar_id/events"))
        .and(query_param("timeMin", "2024-10-01T00:00:00+00:00"))
        .and(query_param("maxResults", "10"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "calendar#events",
            "items": [{
                "id": "event_1",
                "summary": "Team Meeting",
                "start": {"dateTime": "2024-10-25T09:00:00+03:00"},
                "end": {"dateTime": "2024-10-25T10:00:00+03:00"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let range = EventRange::starting(DateTime::parse_from_rfc3339("2024-10-01T00:00:00Z").unwrap());
    let events = client(&server)
        .event_list("mocked_calendar_id", &range)
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "event_1");
}

#[tokio::test]
async fn event_list_sends_upper_bound_when_given() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/cal/events"))
        .and(query_param("timeMax", "2024-10-31T00:00:00+00:00"))
        .and(query_param("maxResults", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let range = EventRange {
        from: DateTime::parse_from_rfc3339("2024-10-01T00:00:00Z").unwrap(),
        till: Some(DateTime::parse_from_rfc3339("2024-10-31T00:00:00Z").unwrap()),
        limit: 3,
    };

    let events = client(&server).event_list("cal", &range).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn event_list_failure_is_an_error_not_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let range = EventRange::starting(DateTime::parse_from_rfc3339("2024-10-01T00:00:00Z").unwrap());
    let result = client(&server).event_list("cal", &range).await;

    assert!(matches!(result, Err(CalendarError::TokenExpired)));
}

#[tokio::test]
async fn calendar_edit_preserves_untouched_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/cal_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "calendar#calendar",
            "etag": "\"e1\"",
            "id": "cal_1",
            "summary": "Work Calendar",
            "description": "Calendar for work events",
            "timeZone": "GMT+03:00",
            "conferenceProperties": {"allowedConferenceSolutionTypes": ["hangoutsMeet"]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/calendars/cal_1"))
        .and(body_json(serde_json::json!({
            "kind": "calendar#calendar",
            "etag": "\"e1\"",
            "id": "cal_1",
            "summary": "Updated Work Calendar",
            "description": "Calendar for work events",
            "timeZone": "GMT+03:00",
            "conferenceProperties": {"allowedConferenceSolutionTypes": ["hangoutsMeet"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cal_1",
            "summary": "Updated Work Calendar",
            "description": "Calendar for work events",
            "timeZone": "GMT+03:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = CalendarUpdate {
        name: Some("Updated Work Calendar".to_string()),
        ..CalendarUpdate::default()
    };

    let updated = client(&server).edit("cal_1", &update).await.unwrap();
    assert_eq!(updated.summary, "Updated Work Calendar");
}

#[tokio::test]
async fn calendar_edit_of_missing_calendar_does_not_write() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server)
        .edit("gone", &CalendarUpdate::default())
        .await;

    assert!(matches!(result, Err(CalendarError::NotFound(_))));
}

#[tokio::test]
async fn event_edit_keeps_timing_and_reminders() {
    let server = MockServer::start().await;

    let fetched = serde_json::json!({
        "id": "event_1",
        "status": "confirmed",
        "summary": "Team Meeting",
        "description": "Discuss project progress",
        "start": {"dateTime": "2024-10-25T09:00:00+03:00", "timeZone": "GMT+02:00"},
        "end": {"dateTime": "2024-10-25T10:00:00+03:00", "timeZone": "GMT+02:00"},
        "reminders": {"useDefault": false, "overrides": [{"method": "popup", "minutes": 10}]}
    });

    Mock::given(method("GET"))
        .and(path("/calendars/cal_1/events/event_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fetched))
        .mount(&server)
        .await;

    let expected = serde_json::json!({
        "id": "event_1",
        "status": "confirmed",
        "summary": "Updated Team Meeting",
        "description": "Updated discussion points for the project",
        "start": {"dateTime": "2024-10-25T09:00:00+03:00", "timeZone": "GMT+02:00"},
        "end": {"dateTime": "2024-10-25T10:00:00+03:00", "timeZone": "GMT+02:00"},
        "reminders": {"useDefault": false, "overrides": [{"method": "popup", "minutes": 10}]}
    });

    Mock::given(method("PUT"))
        .and(path("/calendars/cal_1/events/event_1"))
        .and(body_json(expected.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(expected))
        .expect(1)
        .mount(&server)
        .await;

    let update = EventUpdate {
        name: Some("Updated Team Meeting".to_string()),
        description: Some("Updated discussion points for the project".to_string()),
    };

    let updated = client(&server)
        .events()
        .edit("cal_1", "event_1", &update)
        .await
        .unwrap();

    assert_eq!(updated.summary.as_deref(), Some("Updated Team Meeting"));
    assert_eq!(updated.reminders.unwrap().overrides[0].minutes, 10);
}
