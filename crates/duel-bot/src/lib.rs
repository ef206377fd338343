pub mod config;
pub mod engine;
pub mod evaluator;
pub mod policy;
pub mod search;
pub mod worker;

pub use config::{ConfigError, EngineConfig, SearchBudget, SignalWeights, Stage, StageBands};
pub use engine::{CandidateEvaluation, Decision, Engine, EngineError};
pub use evaluator::{EvalNode, Evaluator};
pub use policy::{GreedyPolicy, Policy, PolicyContext, PolicyError, SearchPolicy};
pub use search::{MinimaxSearch, RoundRole, SearchNode, SearchStats};
pub use worker::{DecisionWorker, PendingDecision, WorkerError};
