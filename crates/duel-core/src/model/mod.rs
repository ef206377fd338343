pub mod card;
pub mod card_set;
pub mod deck;
pub mod history;
pub mod score;
pub mod seat;
pub mod trick;
