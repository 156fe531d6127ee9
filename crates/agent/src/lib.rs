//! Policy engine runtime for the Smorti shopping assistant.
//!
//! Each turn runs the same constrained pipeline:
//! 1. **Language tracking** - decide the reply language (first turn or explicit switch only)
//! 2. **Classification** - exactly one intent per utterance
//! 3. **Fact gathering** (`runtime`) - catalog lookup under a timeout, product questions only
//! 4. **Drafting** (`drafting`) - catalog records, static rules, or creative text
//! 5. **Validation** - every claim grounded, substituted, or dropped
//! 6. **Rendering** (`render`) - fixed wording per language around the validated segments
//!
//! # Safety Principle
//!
//! Text generators are collaborators behind [`writer::CreativeWriter`]. They
//! never decide prices, specifications, links or contact details; those
//! come from the catalog or the static-rule table, and the grounding
//! validator removes anything else.

pub mod drafting;
pub mod render;
pub mod runtime;
pub mod writer;

pub use render::ResponseRenderer;
pub use runtime::{EngineSettings, PolicyEngine};
pub use writer::{CannedJokeWriter, CreativeRequest, CreativeWriter};
