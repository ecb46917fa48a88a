//! Google Calendar REST client for calprov.
//!
//! Provides calendar, sharing and event operations over one authenticated session.

pub mod calendars;
pub mod client;
pub mod error;
pub mod events;
pub mod types;

pub use calendars::CalendarClient;
pub use client::ApiSession;
pub use error::CalendarError;
pub use events::EventClient;
pub use types::{
    AclRole, AclRule, AclScope, Alarm, Calendar, CalendarQuery, CalendarUpdate, Event,
    EventDateTime, EventQuery, EventRange, EventUpdate, NewCalendar, NewEvent, ReminderOverride,
    Reminders,
};
