//! Price estimation and reconciliation for cleaning-service quotes.
//!
//! The crate derives a project price from several independent models and
//! cross-checks them. It offers tools to
//!
//! - describe project quantities by unit typology (`data` module),
//! - hold the tunable pricing constants and merge partial overrides (`config` module),
//! - price a project with four methods and rank the results (`estimation` module),
//! - apply a complexity surcharge to a batch of solutions (`complexity` module),
//! - split a chosen price over phases and typologies (`allocation` module), and
//! - search a parameter grid for the point where production cost and market
//!   price agree best (`convergence` module).
//!
//! Every pricing function is pure and total: degenerate inputs produce zero or
//! infinite figures rather than errors. The `quote` module ties the pieces
//! together and is the only place that returns [`QuoteError`].
//!
//! # Quick start
//!
//! ```no_run
//! use devis::config::Configuration;
//! use devis::data::{TypologyCount, TypologyKey};
//! use devis::quote::{Quote, QuoteRequest};
//! use devis::SolutionId;
//!
//! let counts = TypologyCount::builder()
//!     .count(TypologyKey::T2, 5)
//!     .count(TypologyKey::T3, 5)
//!     .build();
//! let request = QuoteRequest::default()
//!     .with_counts(counts)
//!     .with_phase_count(3)
//!     .with_phases(["Vitrerie", "OPR", "Livraison"]);
//!
//! let quote = Quote::new(Configuration::default()).expect("finite configuration");
//! let solutions = quote.solutions(&request);
//! let breakdown = quote
//!     .breakdown(&solutions, Some(SolutionId::Reco), &request)
//!     .expect("solution selected");
//! for item in &breakdown {
//!     println!("{}: {:.2}", item.id(), item.total_phase);
//! }
//! ```

pub mod allocation;
pub mod complexity;
pub mod config;
pub mod convergence;
pub mod data;
pub mod error;
pub mod estimation;
pub mod quote;

pub use allocation::{allocate, grand_total, BreakdownItem, PhaseOccurrence};
pub use complexity::{apply_multiplier, ComplexityParams};
pub use config::{ConfigOverrides, Configuration};
pub use convergence::{search, AxisRange, ConvergenceGrid, CostPoint};
pub use error::{QuoteError, Result};
pub use estimation::{estimate, ConvergenceMethod, Solution, SolutionId};
