//! Game state aggregate and its parts.

use std::collections::{BTreeMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::{initial_properties, Group};
use super::cards::{shuffled_deck, Card, DeckKind};

pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    /// Signed: may dip below zero until bankruptcy is resolved.
    pub money: i64,
    pub position: u8,
    pub properties: Vec<u8>,
    pub in_jail: bool,
    pub jail_turns: u8,
    pub bankrupt: bool,
    pub jail_free_cards: u8,
}

impl PlayerState {
    pub fn new(id: &str, name: &str, color: &str, money: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            money,
            position: 0,
            properties: Vec::new(),
            in_jail: false,
            jail_turns: 0,
            bankrupt: false,
            jail_free_cards: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    Street {
        /// Rent by house count; index 5 is a hotel.
        rent: [i64; 6],
        house_price: i64,
        houses: u8,
    },
    Railroad,
    Utility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub group: Group,
    pub price: i64,
    pub owner: Option<PlayerId>,
    pub mortgaged: bool,
    pub mortgage_value: i64,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

impl Property {
    pub fn houses(&self) -> u8 {
        match self.kind {
            PropertyKind::Street { houses, .. } => houses,
            _ => 0,
        }
    }

    pub fn set_houses(&mut self, count: u8) {
        if let PropertyKind::Street { houses, .. } = &mut self.kind {
            *houses = count;
        }
    }

    pub fn house_price(&self) -> Option<i64> {
        match self.kind {
            PropertyKind::Street { house_price, .. } => Some(house_price),
            _ => None,
        }
    }

    pub fn is_owned_by(&self, player_id: &str) -> bool {
        self.owner.as_deref() == Some(player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bidder {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub property_id: u8,
    pub highest_bid: i64,
    pub highest_bidder: Option<Bidder>,
    pub seconds_left: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub from: PlayerId,
    pub to: PlayerId,
    pub offered_properties: Vec<u8>,
    pub requested_properties: Vec<u8>,
    pub offered_money: i64,
    pub requested_money: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<PlayerState>,
    pub current_player_index: usize,
    pub has_rolled: bool,
    pub last_dice: Option<(u8, u8)>,
    pub double_roll_count: u8,
    /// Top of each deck is the back of the deque.
    pub chance_deck: VecDeque<Card>,
    pub community_chest_deck: VecDeque<Card>,
    pub properties: BTreeMap<u8, Property>,
    pub auction: Option<Auction>,
    pub current_trade: Option<TradeProposal>,
    pub log: Vec<LogEntry>,
    pub game_started: bool,
    pub game_won: bool,
    pub winner: Option<PlayerId>,
}

impl GameState {
    /// Empty room with freshly shuffled decks.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            has_rolled: false,
            last_dice: None,
            double_roll_count: 0,
            chance_deck: shuffled_deck(DeckKind::Chance, rng),
            community_chest_deck: shuffled_deck(DeckKind::CommunityChest, rng),
            properties: initial_properties(),
            auction: None,
            current_trade: None,
            log: Vec::new(),
            game_started: false,
            game_won: false,
            winner: None,
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.log.push(LogEntry {
            timestamp,
            message: message.into(),
        });
    }

    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<&PlayerState> {
        self.players.get(self.current_player_index)
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player().map(|p| p.id.clone())
    }

    pub fn active_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter().filter(|p| !p.bankrupt)
    }

    pub fn deck_mut(&mut self, kind: DeckKind) -> &mut VecDeque<Card> {
        match kind {
            DeckKind::Chance => &mut self.chance_deck,
            DeckKind::CommunityChest => &mut self.community_chest_deck,
        }
    }

    /// Moves a property to `new_owner` (or the bank), keeping both the
    /// property record and the players' portfolios in agreement.
    pub fn transfer_property(&mut self, property_id: u8, new_owner: Option<&str>) {
        let Some(property) = self.properties.get_mut(&property_id) else {
            return;
        };
        let previous = property.owner.take();
        property.owner = new_owner.map(str::to_string);
        if let Some(prev_id) = previous {
            if let Some(prev) = self.player_mut(&prev_id) {
                prev.properties.retain(|&p| p != property_id);
            }
        }
        if let Some(next_id) = new_owner {
            if let Some(next) = self.player_mut(next_id) {
                if !next.properties.contains(&property_id) {
                    next.properties.push(property_id);
                }
            }
        }
    }
}

/// Lifecycle phase of a room, derived from the game flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl From<&GameState> for RoomStatus {
    fn from(state: &GameState) -> Self {
        if state.game_won {
            RoomStatus::Finished
        } else if state.game_started {
            RoomStatus::Playing
        } else {
            RoomStatus::Waiting
        }
    }
}

/// Targeted messages produced while applying an action, addressed to a
/// single player rather than the whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notice {
    BuyOrAuction {
        player_id: PlayerId,
        property_id: u8,
        name: String,
        price: i64,
    },
    CardDrawn {
        player_id: PlayerId,
        deck: DeckKind,
        text: String,
    },
    TradeProposed {
        player_id: PlayerId,
        trade: TradeProposal,
    },
}

impl Notice {
    /// Player the notice is addressed to.
    pub fn recipient(&self) -> &str {
        match self {
            Notice::BuyOrAuction { player_id, .. }
            | Notice::CardDrawn { player_id, .. }
            | Notice::TradeProposed { player_id, .. } => player_id,
        }
    }
}
