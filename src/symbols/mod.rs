//! Variables, global variables and constants, and the textual definition list they are parsed
//! from.

pub(crate) mod parse;
pub(crate) mod table;
