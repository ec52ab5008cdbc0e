// Analysis Pipeline: analyze_draft → generate_keywords → calculate_scores →
// format_output → done, with handle_error reachable from the first three.
// One AnalysisState per request, moved by value from stage to stage.

pub mod handlers;
pub mod runner;
pub mod state;

pub use runner::{AnalysisPipeline, BlogAnalysis, DraftAssessment};
pub use state::{AnalysisResult, ValidationError};
