//! Scheduling core: collision detection, session storage and booking.
//!
//! A session occupies one teacher, one classroom and one or more groups for
//! a half-open window `[start, start + duration)`. Two sessions collide when
//! their windows overlap and they share any of those resources. Everything in
//! here is role-agnostic; callers resolve who is asking into a [`Scope`]
//! before reaching the repository.

pub mod booking;
pub mod change_requests;
pub mod collision;
pub mod comments;
pub mod error;
pub mod interval;
pub mod repository;
pub mod scope;
pub mod time;
pub mod view;

pub use booking::{BookingForm, BookingOutcome, BookingService, RawId};
pub use collision::{find_collision, has_collision, CollisionProbe};
pub use error::{Conflict, Dimension, ErrorKind, FieldErrors, ScheduleError};
pub use interval::{overlaps, TimeWindow};
pub use repository::NewSession;
pub use scope::{Actor, Scope, SessionFilter, Temporal};
pub use time::{local_date, parse_time_literal};
pub use view::{group_by_day, schedule_days, ScheduleDay, Scheduled};
