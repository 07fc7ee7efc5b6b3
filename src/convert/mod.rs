//! Conversion orchestration
//!
//! The pipeline for format conversion and compression:
//!
//! ```text
//!   ToolProber ──► ToolAvailability ─┐
//!                                    ▼
//!   (target, options) ──► PlanBuilder ──► FallbackPlan
//!                                            │
//!                                            ▼
//!                                    FallbackExecutor ──► ExecutionReport
//! ```
//!
//! Availability is probed per request, plans are immutable once built, and
//! the executor tries candidates strictly in priority order with one
//! process at a time.

mod error;
mod executor;
mod invocation;
mod plan;
mod probe;

pub use error::{AttemptFailure, ConvertError};
pub use executor::{AttemptOutcome, AttemptRecord, ExecutionReport, FallbackExecutor};
pub use invocation::Invocation;
pub use plan::{
    Backend, CompressionPreset, ConversionTarget, FallbackPlan, ImageQuality, JobCandidate,
    PlanBuilder, TableMode,
};
pub use probe::{ToolAvailability, ToolProber};
