//! Chance and community chest decks.
//!
//! A deck is a deque used as a stack: draws take the back (top), and a
//! resolved card goes back in at the front (bottom), so a deck of N cards
//! cycles with period N and never runs dry.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::Group;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    Chance,
    CommunityChest,
}

impl DeckKind {
    pub fn label(self) -> &'static str {
        match self {
            DeckKind::Chance => "Quantum Chance",
            DeckKind::CommunityChest => "Community Chest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardEffect {
    MoveTo { position: u8 },
    MoveToNearest { group: Group },
    MoveBy { steps: i8 },
    Collect { amount: i64 },
    Pay { amount: i64 },
    GoToJail,
    GetOutOfJailFree,
    PayPerBuilding { per_house: i64, per_hotel: i64 },
    PayEachPlayer { amount: i64 },
    CollectFromEachPlayer { amount: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub text: String,
    pub deck: DeckKind,
    pub effect: CardEffect,
}

fn card(deck: DeckKind, text: &str, effect: CardEffect) -> Card {
    Card {
        text: text.to_string(),
        deck,
        effect,
    }
}

pub fn chance_cards() -> Vec<Card> {
    use CardEffect::*;
    let c = |text, effect| card(DeckKind::Chance, text, effect);
    vec![
        c("Advance to GO. Collect 200.", MoveTo { position: 0 }),
        c("Advance to Illinois Avenue.", MoveTo { position: 24 }),
        c("Advance to St. Charles Place.", MoveTo { position: 11 }),
        c("Advance to Boardwalk.", MoveTo { position: 39 }),
        c("Take a trip to Reading Railroad.", MoveTo { position: 5 }),
        c("Advance to the nearest Utility. Pay ten times the dice roll if owned.", MoveToNearest { group: Group::Utility }),
        c("Advance to the nearest Railroad.", MoveToNearest { group: Group::Railroad }),
        c("Advance to the nearest Railroad.", MoveToNearest { group: Group::Railroad }),
        c("Go back three spaces.", MoveBy { steps: -3 }),
        c("Bank pays you a dividend of 50.", Collect { amount: 50 }),
        c("Your building loan matures. Collect 150.", Collect { amount: 150 }),
        c("Speeding fine. Pay 15.", Pay { amount: 15 }),
        c("Go directly to Jail. Do not pass GO.", GoToJail),
        c("Get out of Jail free.", GetOutOfJailFree),
        c("Make general repairs: pay 25 per house and 100 per hotel.", PayPerBuilding { per_house: 25, per_hotel: 100 }),
        c("You have been elected chairman of the board. Pay each player 50.", PayEachPlayer { amount: 50 }),
    ]
}

pub fn community_chest_cards() -> Vec<Card> {
    use CardEffect::*;
    let c = |text, effect| card(DeckKind::CommunityChest, text, effect);
    vec![
        c("Advance to GO. Collect 200.", MoveTo { position: 0 }),
        c("Bank error in your favor. Collect 200.", Collect { amount: 200 }),
        c("Doctor's fee. Pay 50.", Pay { amount: 50 }),
        c("From sale of stock you get 50.", Collect { amount: 50 }),
        c("Get out of Jail free.", GetOutOfJailFree),
        c("Go directly to Jail. Do not pass GO.", GoToJail),
        c("Holiday fund matures. Collect 100.", Collect { amount: 100 }),
        c("Income tax refund. Collect 20.", Collect { amount: 20 }),
        c("It is your birthday. Collect 10 from every player.", CollectFromEachPlayer { amount: 10 }),
        c("Life insurance matures. Collect 100.", Collect { amount: 100 }),
        c("Pay hospital fees of 100.", Pay { amount: 100 }),
        c("Pay school fees of 50.", Pay { amount: 50 }),
        c("Receive 25 consultancy fee.", Collect { amount: 25 }),
        c("Street repairs: pay 40 per house and 115 per hotel.", PayPerBuilding { per_house: 40, per_hotel: 115 }),
        c("You won second prize in a beauty contest. Collect 10.", Collect { amount: 10 }),
        c("You inherit 100.", Collect { amount: 100 }),
    ]
}

/// Uniformly shuffled deck of the given kind.
pub fn shuffled_deck<R: Rng + ?Sized>(kind: DeckKind, rng: &mut R) -> VecDeque<Card> {
    let mut cards = match kind {
        DeckKind::Chance => chance_cards(),
        DeckKind::CommunityChest => community_chest_cards(),
    };
    cards.shuffle(rng);
    cards.into()
}

/// Takes the top card. Callers return it with [`return_to_bottom`].
pub fn draw(deck: &mut VecDeque<Card>) -> Option<Card> {
    deck.pop_back()
}

pub fn return_to_bottom(deck: &mut VecDeque<Card>, card: Card) {
    deck.push_front(card);
}
