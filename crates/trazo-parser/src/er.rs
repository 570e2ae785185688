//! Entity-relationship notation.
//!
//! ```text
//! # users own many posts
//! [users] {bgcolor: "#d0e0d0"}
//! *id: int
//! email {label: "varchar, not null, unique"}
//!
//! [posts]
//! *id: int
//! +user_id {label: "int, FK(users)"}
//!
//! users ||--o{ posts
//! ```

pub mod ast;
mod lexer;
mod lower;
mod parser;
mod tokens;

pub use lower::lower;
pub use parser::parse;
