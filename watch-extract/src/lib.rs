//! # watch-extract
//!
//! Declarative content extraction for webwatch.
//!
//! Reduces fetched content to a [`DerivedValue`] through one of a closed set
//! of [`Command`]s: inner markup, text, match count or integer sum over a CSS
//! selector, the raw content itself, or a JSON document narrowed by a path.
//!
//! ## Design
//!
//! - Pure and synchronous: no I/O, identical inputs give identical outputs
//! - Selectors are evaluated with `scraper` on a full html5 parse
//! - Zero matches are ordinary values, never errors
//! - JSON parse failures degrade to an error payload instead of failing
//!
//! # Examples
//!
//! ```
//! use watch_extract::{extract, Command, DerivedValue};
//!
//! let value = extract("<ul><li>a</li><li>b</li></ul>", Command::Count, "li")?;
//! assert_eq!(value, DerivedValue::Count(2));
//! # Ok::<(), watch_extract::ExtractError>(())
//! ```

pub mod command;
pub mod error;
pub mod extract;
pub mod json_path;
pub mod value;

pub use command::Command;
pub use error::{ExtractError, Result};
pub use extract::{extract, extract_named};
pub use value::{DerivedValue, NumericSum};
