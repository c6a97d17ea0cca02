//! Core of famsync: a shared family calendar and to-do list.
//!
//! Stored events may carry a recurrence rule; [`recurrence`] expands them into
//! the occurrences a view window needs. Recurring tasks form series that grow
//! one instance at a time as each is completed ([`series`]). Every mutation
//! goes through [`command`] and returns a new [`Household`] snapshot.

pub mod agent;
pub mod command;
pub mod config;
pub mod date_range;
pub mod error;
pub mod event;
pub mod household;
pub mod member;
pub mod recurrence;
pub mod series;
pub mod task;
pub mod time;
pub mod view;
pub mod visibility;

pub use command::{Applied, Command, Effect, IgnoreReason, MemberPatch};
pub use config::FamSyncConfig;
pub use date_range::DateRange;
pub use error::{FamSyncError, FamSyncResult};
pub use event::{CalendarEvent, EventPatch, NewEvent};
pub use household::Household;
pub use member::{Color, Member, MemberId};
pub use recurrence::{RecurrenceRule, RecurrenceSpec};
pub use task::{NewTask, TaskCategory, TaskPatch, ToDoTask};
pub use time::{Instant, WeekStart};
pub use view::{ViewDescriptor, ViewMode, ViewSnapshot};
