mod decimal;
mod event;
mod timestamp;

pub use decimal::{fractional_digits, parse_decimal, render_fixed, MAX_FRACTIONAL_DIGITS};
pub use event::{Event, EventCategory};
pub use timestamp::{EventTimestamp, MAX_EVENT_YEAR, MIN_EVENT_YEAR};
