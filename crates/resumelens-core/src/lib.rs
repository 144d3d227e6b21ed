//! Core types shared across resumelens: the canonical analysis record,
//! escaping helpers, score normalisation, and the error taxonomy.

pub mod error;
pub mod escape;
pub mod record;
pub mod score;

pub use error::{
    FallbackKind, FieldResolutionWarning, HighlightSkipped, MalformedResponse, PipelineError,
    SkipReason, UpstreamFailure, UpstreamKind,
};
pub use record::{
    CanonicalRecord, CareerPath, GroundingMetadata, HighlightEntry, HighlightKind, JobContext,
    MissingSkill, SectionFeedback,
};
pub use score::clamp_score;
