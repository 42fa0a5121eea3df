pub mod event;
pub mod participation;

pub use event::{Event, EventId, NewEvent};
pub use participation::{Participation, ParticipationId};
