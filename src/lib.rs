pub mod classifier;
pub mod config;
pub mod errors;
pub mod evaluator;
pub mod events;
pub mod executor;
pub mod gate;
pub mod github;
pub mod labels;
pub mod models;
pub mod orchestrator;

pub use classifier::{classify, ClassifierThresholds, SuiteClass};
pub use config::{Config, TriggerMode};
pub use errors::TriggerError;
pub use evaluator::{CheckSuiteSource, CompletionEvaluator};
pub use events::InboundEvent;
pub use executor::{AgentProcessExecutor, ReviewExecutor};
pub use gate::{AcquireOutcome, DeduplicationGate, GateStatus};
pub use github::GitHubClient;
pub use labels::{LabelApi, ReviewLifecycleLabeler, StateLabel};
pub use models::*;
pub use orchestrator::{HistoryQuery, ReviewPublisher, ReviewTriggerOrchestrator};
