pub mod config;
pub mod dedupe;
pub mod input;
pub mod matcher;
pub mod pipeline;
pub mod retry;
pub mod sanitizer;
pub mod session;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
    DedupeConfig, PipelineConfig, PipelineKind, SessionConfig, ENV_PREFIX,
};
pub use dedupe::{run_dedupe, DedupeError, DedupeReport};
pub use input::{InputError, Query, QueryKind, SanitizedQuery};
pub use matcher::{match_candidates, score_one, MatchResult, MatchSummary, ResultCap};
pub use pipeline::{
    prepare_session, run_pipeline, BrandNameJob, BrandSearchJob, DetailJob, JobOutput,
    KeywordSearchJob, PipelineError, PipelineRunner, QueryJob, RunSummary,
};
pub use retry::{BackoffPolicy, RetryController, RetryOutcome, RetryPolicy};
pub use sanitizer::sanitize;
pub use session::{
    AutomationSession, HttpSession, RawCandidate, RawDetail, SessionError, SessionProfile,
};
pub use store::{
    BrandNameRecord, DetailRecord, IncrementalWriter, Record, ResultRecord, WriteMode,
    WriterError,
};
