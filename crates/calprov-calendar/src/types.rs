//! Calendar API types and data structures.
//!
//! Resource records keep every field the service returns in `extra`, so a
//! fetched record can be sent back with a full update without losing data.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const DEFAULT_CALENDAR_NAME: &str = "New Calendar";
pub(crate) const DEFAULT_EVENT_NAME: &str = "New Event";
pub(crate) const DEFAULT_TIME_ZONE: &str = "GMT+02:00";
pub(crate) const DEFAULT_EVENT_LIMIT: u32 = 10;

/// Calendar resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event time: a zoned timestamp or an all-day date.
///
/// Timestamps stay in their RFC 3339 wire form so they round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn at(date_time: DateTime<FixedOffset>, time_zone: &str) -> Self {
        Self {
            date_time: Some(date_time.to_rfc3339()),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    #[serde(default)]
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: i64,
}

/// Access-control rule attached to a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclRule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub scope: AclScope,
    pub role: AclRole,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AclRule {
    pub fn for_user(email: &str, role: AclRole) -> Self {
        Self {
            id: String::new(),
            scope: AclScope::user(email),
            role,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclScope {
    #[serde(rename = "type")]
    pub scope_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl AclScope {
    pub fn user(email: &str) -> Self {
        Self {
            scope_type: "user".to_string(),
            value: Some(email.to_string()),
        }
    }

    /// Rule id the service assigns to this scope, e.g. `user:alice@example.com`.
    pub fn rule_id(&self) -> String {
        match &self.value {
            Some(value) => format!("{}:{}", self.scope_type, value),
            None => self.scope_type.clone(),
        }
    }
}

/// Access role granted by an ACL rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AclRole {
    None,
    FreeBusyReader,
    Reader,
    Writer,
    #[default]
    Owner,
}

impl AclRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclRole::None => "none",
            AclRole::FreeBusyReader => "freeBusyReader",
            AclRole::Reader => "reader",
            AclRole::Writer => "writer",
            AclRole::Owner => "owner",
        }
    }
}

impl std::fmt::Display for AclRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Request Types

/// Fields for a new calendar. Unset fields take the service defaults below.
#[derive(Debug, Clone, Default)]
pub struct NewCalendar {
    /// Defaults to "New Calendar"
    pub name: Option<String>,
    /// Defaults to an empty description
    pub description: Option<String>,
    /// Defaults to "GMT+02:00"
    pub timezone: Option<String>,
    /// Users to grant `role` on the created calendar
    pub share: Vec<String>,
    pub role: AclRole,
}

impl NewCalendar {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub(crate) fn to_resource(&self) -> Calendar {
        Calendar {
            summary: self
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_CALENDAR_NAME.to_string()),
            description: Some(self.description.clone().unwrap_or_default()),
            time_zone: Some(
                self.timezone
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string()),
            ),
            ..Calendar::default()
        }
    }
}

/// Changes applied by `CalendarClient::edit`. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CalendarUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub share: Vec<String>,
    pub share_role: AclRole,
}

impl CalendarUpdate {
    pub(crate) fn apply(&self, calendar: &mut Calendar) {
        if let Some(name) = &self.name {
            calendar.summary = name.clone();
        }
        let description = self
            .description
            .clone()
            .or_else(|| calendar.description.take())
            .unwrap_or_default();
        calendar.description = Some(description);
    }
}

/// Exact-name lookup of a calendar.
#[derive(Debug, Clone)]
pub struct CalendarQuery {
    pub name: String,
}

/// Substring lookup of an event by summary.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub name: String,
}

/// Time window for `CalendarClient::event_list`.
#[derive(Debug, Clone)]
pub struct EventRange {
    pub from: DateTime<FixedOffset>,
    pub till: Option<DateTime<FixedOffset>>,
    pub limit: u32,
}

impl EventRange {
    pub fn starting(from: DateTime<FixedOffset>) -> Self {
        Self {
            from,
            till: None,
            limit: DEFAULT_EVENT_LIMIT,
        }
    }
}

/// Reminder on a new event. `time` is minutes before start, as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub alarm_type: String,
    pub time: String,
}

impl Alarm {
    pub fn popup(minutes: impl Into<String>) -> Self {
        Self {
            alarm_type: "popup".to_string(),
            time: minutes.into(),
        }
    }
}

/// Fields for a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Defaults to "New Event"
    pub name: Option<String>,
    pub description: Option<String>,
    pub color_id: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Zone for both start and end, defaults to "GMT+02:00"
    pub timezone: Option<String>,
    pub alarms: Vec<Alarm>,
}

impl NewEvent {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            name: None,
            description: None,
            color_id: None,
            start,
            end,
            timezone: None,
            alarms: Vec::new(),
        }
    }

    /// Build the insert payload. Fails if an alarm time is not a whole number.
    pub(crate) fn to_resource(&self) -> Result<Event, crate::CalendarError> {
        let zone = self.timezone.as_deref().unwrap_or(DEFAULT_TIME_ZONE);

        let overrides = self
            .alarms
            .iter()
            .map(|alarm| {
                let minutes = alarm.time.trim().parse::<i64>().map_err(|_| {
                    crate::CalendarError::InvalidEventData(format!(
                        "alarm time must be an integer, got {:?}",
                        alarm.time
                    ))
                })?;
                Ok(ReminderOverride {
                    method: alarm.alarm_type.clone(),
                    minutes,
                })
            })
            .collect::<Result<Vec<_>, crate::CalendarError>>()?;

        Ok(Event {
            summary: Some(
                self.name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
            ),
            description: Some(self.description.clone().unwrap_or_default()),
            color_id: self.color_id.clone(),
            start: Some(EventDateTime::at(self.start, zone)),
            end: Some(EventDateTime::at(self.end, zone)),
            reminders: Some(Reminders {
                use_default: false,
                overrides,
            }),
            ..Event::default()
        })
    }
}

/// Changes applied by `EventClient::edit`. Timing and reminders are not editable.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl EventUpdate {
    pub(crate) fn apply(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.summary = Some(name.clone());
        }
        let description = self
            .description
            .clone()
            .or_else(|| event.description.take())
            .unwrap_or_default();
        event.description = Some(description);
    }
}

// API Response Types

/// API response for calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<Calendar>,
    pub next_page_token: Option<String>,
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<Event>,
    pub next_page_token: Option<String>,
}
