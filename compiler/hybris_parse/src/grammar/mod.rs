//! Grammar productions.
//!
//! - `stmt`: statements and control flow
//! - `item`: function, struct and class declarations
//! - `expr`: expressions with precedence climbing

mod expr;
mod item;
mod stmt;
