//! Background thread that runs one engine decision while the caller keeps polling.

use crate::engine::{Decision, Engine, EngineError};
use duel_core::game::state::GameState;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("decision worker stopped before producing a result")]
    Disconnected,
}

/// Runs engine decisions off the caller's thread.
#[derive(Debug, Clone)]
pub struct DecisionWorker {
    engine: Arc<Engine>,
}

impl DecisionWorker {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Starts a decision on a background thread with its own seeded generator.
    pub fn spawn(&self, state: GameState, seed: u64) -> PendingDecision {
        let (sender, receiver) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let handle = thread::spawn(move || {
            let result = engine.decide_with_seed(&state, seed);
            // receiver may already be gone if the caller abandoned the decision
            let _ = sender.send(result);
        });
        PendingDecision {
            receiver,
            handle: Some(handle),
            result: None,
        }
    }
}

/// Handle to an in-flight decision. Dropping it abandons the result.
pub struct PendingDecision {
    receiver: Receiver<Result<Decision, EngineError>>,
    handle: Option<JoinHandle<()>>,
    result: Option<Result<Decision, WorkerError>>,
}

impl PendingDecision {
    /// Non-blocking check; returns true once a result is available.
    pub fn poll(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.result = Some(result.map_err(WorkerError::from));
                self.join();
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.result = Some(Err(WorkerError::Disconnected));
                self.join();
                true
            }
        }
    }

    /// Blocks until the decision is ready.
    pub fn wait(mut self) -> Result<Decision, WorkerError> {
        if let Some(result) = self.result.take() {
            return result;
        }
        let result = match self.receiver.recv() {
            Ok(result) => result.map_err(WorkerError::from),
            Err(_) => Err(WorkerError::Disconnected),
        };
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            event!(
                target: "duel_bot::decision",
                Level::WARN,
                "decision worker thread panicked"
            );
        }
    }
}
