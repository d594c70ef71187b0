//! Primary values for tabview
//!
//! Every cell of a view holds one or more [`Value`]s. This crate defines the
//! value model, SQL three-valued logic ([`Ternary`]) and the lossless
//! coercions the comparison subsystem relies on.

mod coercion;
mod datetime;
mod ternary;
mod value;

pub use coercion::{
    to_boolean, to_datetime, to_float, to_integer, to_integer_strictly, to_string, to_ternary,
};
pub use datetime::{parse_datetime, Timezone, TimezoneParseError};
pub use ternary::Ternary;
pub use value::Value;
