//! miljo-core: pure pipeline logic for the Miljörapport generator.
//!
//! Everything here is side-effect free: the workbook grid model, sheet
//! discovery heuristics, per-category aggregation, the classification result
//! schema, prompt construction, the deterministic fallback classifier and the
//! report layout engine. File parsing, HTTP and PDF drawing live in the
//! sibling crates.

pub mod aggregate;
pub mod fallback;
pub mod grid;
pub mod layout;
pub mod locator;
pub mod prompt;
pub mod result;

pub use aggregate::{CategoryAggregate, aggregate_rows};
pub use fallback::fallback_classify;
pub use grid::{Cell, Sheet};
pub use layout::{Block, Page, build_blocks, paginate};
pub use locator::{FactorTable, LocateError, TransactionTable, locate};
pub use prompt::{build_prompt, extract_json, parse_model_response};
pub use result::{CategoryTotals, ClassificationResult, ClassifiedCategory, Summary};
