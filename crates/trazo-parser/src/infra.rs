//! Infrastructure notation: Python `diagrams`-style pseudo-code.
//!
//! ```text
//! from diagrams.aws.compute import EC2
//!
//! with Diagram("Web Service", direction="TB"):
//!     lb = ELB("lb")
//!     with Cluster("Workers"):
//!         workers = [EC2("w1"), EC2("w2")]
//!     lb >> Edge(label="http") >> workers
//! ```

pub mod ast;
mod lexer;
mod lower;
mod parser;
mod tokens;

pub use lower::lower;
pub use parser::parse;
