//! Parsing of the lines a human types at the prompt.

use duel_core::model::card::Card;
use duel_core::model::card_set::CardSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play(Card),
    Hand,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("type a card number, `h` for your hand or `q` to quit")]
    Empty,
    #[error("'{0}' is not a card number")]
    NotANumber(String),
    #[error("there is no card {0}; cards run from 1 to 30")]
    OutOfRange(u8),
    #[error("card {0} is not in your hand")]
    NotInHand(Card),
}

pub fn parse_command(line: &str, hand: CardSet) -> Result<Command, InputError> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => Err(InputError::Empty),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "h" | "hand" => Ok(Command::Hand),
        "?" | "help" => Ok(Command::Help),
        _ => {
            let value: u8 = trimmed
                .parse()
                .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
            let card = Card::new(value).ok_or(InputError::OutOfRange(value))?;
            if hand.contains(card) {
                Ok(Command::Play(card))
            } else {
                Err(InputError::NotInHand(card))
            }
        }
    }
}
