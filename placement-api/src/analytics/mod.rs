//! Analytics reports over students, companies and placements.
//!
//! Every report follows the same pipeline:
//!
//! 1. [`batch`] fires a fixed set of aggregate statements from [`queries`]
//!    concurrently and hands back their row sets positionally.
//! 2. [`metrics`] turns raw counts into rates, deltas and labels.
//! 3. [`projection`] (insights only) extrapolates "predictions" from weight
//!    tables plus optional random jitter.
//!
//! The three reports live in [`post_analysis`], [`pre_analysis`] and
//! [`insights`].

pub mod batch;
pub mod insights;
pub mod metrics;
pub mod post_analysis;
pub mod pre_analysis;
pub mod projection;
pub mod queries;
pub mod window;

pub use batch::{ConnectionSource, PooledSource};
pub use window::ReportWindow;

/// Failure of an analytics batch. Any single statement failing fails the
/// whole report; there are no partial results.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("no pooled database connection available for statement `{statement}`")]
    PoolUnavailable { statement: &'static str },
    #[error("statement `{statement}` failed: {source}")]
    Statement {
        statement: &'static str,
        #[source]
        source: diesel::result::Error,
    },
}
