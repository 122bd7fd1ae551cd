//! # sqlscribe-results
//!
//! Recovers typed tables from whatever an executor hands back: typed rows,
//! named records, scalar lists, or result text.
//!
//! Result text is read by an ordered chain of formats:
//!
//! 1. empty text and "no rows" markers (`查询结果为空`, `No results`)
//! 2. bracketed serialized rows, e.g.
//!    `[('A', Decimal('12.50'), datetime.date(2024, 1, 5))]`, parsed by a
//!    bounded [`literal`] grammar with a lenient [`tokenizer`] behind it
//! 3. one `(v1, v2)` tuple per line
//! 4. comma-separated lines
//! 5. `|`- or tab-delimited tables
//! 6. plain lines, as a single `result` column
//!
//! Columns take the caller's hint names when every row is exactly as wide as
//! the hint, and `Column_1..Column_N` otherwise.
//!
//! ```
//! use sqlscribe_results::ResultParser;
//!
//! let parser = ResultParser::new();
//! let table = parser.parse(
//!     "[('A', Decimal('12.50')), ('B', Decimal('3.00'))]",
//!     &["Name".to_string(), "Price".to_string()],
//! );
//! assert_eq!(table.rows[1][1].as_str(), Some("3.00"));
//! ```

pub mod cells;
pub mod literal;
pub mod naming;
pub mod parser;
pub mod raw;
pub mod render;
pub mod tokenizer;

pub use literal::{Literal, LiteralError};
pub use parser::{ParseOutcome, ResultParser, TextFormat, TextRows, DEFAULT_EMPTY_MARKERS};
pub use raw::RawResult;
pub use render::{render_literal, render_raw, EMPTY_RESULT_TEXT};
