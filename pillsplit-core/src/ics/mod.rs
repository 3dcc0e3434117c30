//! Reading custody blocks from, and writing reminders to, `.ics` files.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_entry;
