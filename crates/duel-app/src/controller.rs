use duel_bot::engine::{Decision, Engine};
use duel_bot::worker::{DecisionWorker, PendingDecision, WorkerError};
use duel_core::game::match_state::{MatchResult, MatchState, PlayError, PlayOutcome};
use duel_core::game::state::{GameState, StateError};
use duel_core::model::card::Card;
use duel_core::model::card_set::CardSet;
use duel_core::model::history::PlayedHistory;
use duel_core::model::score::ScoreBoard;
use duel_core::model::seat::Seat;
use duel_core::model::trick::RoundRecord;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error(transparent)]
    View(#[from] StateError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("it is not the engine's turn")]
    NotEngineTurn,
}

/// Drives one human-versus-engine match. The human sits North.
pub struct GameController {
    match_state: MatchState,
    human: Seat,
    worker: DecisionWorker,
    last_round: Option<RoundRecord>,
}

impl GameController {
    pub fn new(seed: u64, human_leads: bool, engine: Engine) -> Self {
        let human = Seat::North;
        let first_leader = if human_leads { human } else { human.opponent() };
        Self {
            match_state: MatchState::with_seed(first_leader, seed),
            human,
            worker: DecisionWorker::new(engine),
            last_round: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.match_state.seed()
    }

    pub fn human(&self) -> Seat {
        self.human
    }

    pub fn engine_seat(&self) -> Seat {
        self.human.opponent()
    }

    pub fn status_text(&self) -> String {
        let scores = self.match_state.scores();
        format!(
            "Round {} • You {} – Engine {}",
            self.match_state.round_number(),
            scores.score(self.human),
            scores.score(self.engine_seat()),
        )
    }

    pub fn hand(&self, seat: Seat) -> CardSet {
        self.match_state.hand(seat)
    }

    pub fn expected_to_play(&self) -> Option<Seat> {
        self.match_state.expected_to_play()
    }

    /// Card already on the table in the current round, if any.
    pub fn led_card(&self) -> Option<Card> {
        self.match_state.current_trick().led_card()
    }

    pub fn view_for(&self, seat: Seat) -> Result<GameState, StateError> {
        self.match_state.view_for(seat)
    }

    pub fn play(&mut self, seat: Seat, card: Card) -> Result<PlayOutcome, PlayError> {
        let outcome = self.match_state.play_card(seat, card)?;
        if let PlayOutcome::RoundCompleted { record } = outcome {
            self.last_round = Some(record);
        }
        Ok(outcome)
    }

    pub fn take_last_round(&mut self) -> Option<RoundRecord> {
        self.last_round.take()
    }

    /// Hands the engine's view to the background worker.
    pub fn start_engine_decision(&self) -> Result<PendingDecision, ControllerError> {
        let view = self.engine_view()?;
        Ok(self.worker.spawn(view, self.decision_seed()))
    }

    /// Same decision as [`start_engine_decision`](Self::start_engine_decision), on this thread.
    pub fn decide_engine_move(&self) -> Result<Decision, ControllerError> {
        let view = self.engine_view()?;
        self.worker
            .engine()
            .decide_with_seed(&view, self.decision_seed())
            .map_err(|err| ControllerError::Worker(err.into()))
    }

    pub fn apply_decision(&mut self, decision: &Decision) -> Result<PlayOutcome, ControllerError> {
        let seat = self.engine_seat();
        Ok(self.play(seat, decision.card)?)
    }

    pub fn is_complete(&self) -> bool {
        self.match_state.is_complete()
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.match_state.result()
    }

    pub fn scores(&self) -> &ScoreBoard {
        self.match_state.scores()
    }

    pub fn history(&self) -> &PlayedHistory {
        self.match_state.history()
    }

    pub fn transcript(&self) -> Transcript {
        let scores = self.match_state.scores();
        Transcript {
            seed: self.seed(),
            human: self.human.as_str(),
            first_leader: self.match_state.first_leader().as_str(),
            rounds: self.history().iter().copied().collect(),
            human_points: scores.score(self.human),
            engine_points: scores.score(self.engine_seat()),
            result: self.result().map(|result| self.result_label(result)),
        }
    }

    pub fn result_label(&self, result: MatchResult) -> &'static str {
        match result {
            MatchResult::Winner(seat) if seat == self.human => "human",
            MatchResult::Winner(_) => "engine",
            MatchResult::Draw => "draw",
        }
    }

    fn engine_view(&self) -> Result<GameState, ControllerError> {
        if self.expected_to_play() != Some(self.engine_seat()) {
            return Err(ControllerError::NotEngineTurn);
        }
        Ok(self.match_state.view_for(self.engine_seat())?)
    }

    fn decision_seed(&self) -> u64 {
        self.seed()
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(self.match_state.round_number() as u64)
    }
}

/// Serializable record of a finished (or abandoned) match.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub seed: u64,
    pub human: &'static str,
    pub first_leader: &'static str,
    pub rounds: Vec<RoundRecord>,
    pub human_points: u32,
    pub engine_points: u32,
    pub result: Option<&'static str>,
}
