// LSI Line-Script Interpreter Library
//
// Core of an interpreter for an indentation-grouped, keyword-per-line
// scripting notation: segmentation, statement dispatch, the variable
// environment and loop conditions.

// Public modules
pub mod condition;
pub mod console;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod runner;
pub mod segmenter;
pub mod statement;
pub mod value;

// Re-export commonly used items
pub use console::Console;
pub use dispatcher::{Dispatcher, GroupReport, LineOutcome, Options};
pub use environment::Environment;
pub use error::{ErrorKind, LsiError, Span};
pub use segmenter::{segment, SourceLine, StatementGroup};
pub use statement::{Keyword, Statement, WhileLoop};
pub use value::Value;

// Re-export main functions
pub use runner::{run, RunSummary};
