//! Textual instance format and results reports.
//!
//! # Instance format
//!
//! With three agent classes:
//!
//! ```text
//! n1 n2 n3
//! i: <agent preferences>              (n1 lines)
//! j: lower: upper: supervisor         (n2 lines)
//! k: lower: target: upper: <prefs>    (n3 lines)
//! ```
//!
//! With two agent classes each resource is its own supervisor:
//!
//! ```text
//! n1 n2
//! i: <agent preferences>              (n1 lines)
//! j: lower: upper: <prefs>            (n2 lines)
//! ```
//!
//! Tied entries are bracketed, as in `3 (1 2) 4`. Lines after the last
//! required one are ignored.

mod instance_format;
mod results;

pub use instance_format::{parse_instance, write_instance};
pub use results::{render_exact, render_oracle, Format};
