//! Square-landing and card resolution.
//!
//! Both resolvers report whether the acting player's turn ended on the
//! spot (go-to-jail). Ending the turn itself is left to the caller.

use super::board::{
    nearest_ahead, square_at, SquareKind, BOARD_SIZE, GO_POSITION, JAIL_POSITION,
};
use super::cards::{self, Card, CardEffect, DeckKind};
use super::economy::{check_bankruptcy, rent_owed, Arrival, Solvency};
use super::rules::Rules;
use super::types::{GameState, Notice};

/// Result of resolving a square or a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// The player keeps their turn.
    Stay,
    /// Resolution was turn-terminal.
    TurnEnded,
}

/// Mutable view over one room while a single action is applied.
pub struct Turn<'a> {
    pub state: &'a mut GameState,
    pub rules: &'a Rules,
    pub notices: &'a mut Vec<Notice>,
}

impl Turn<'_> {
    fn name_of(&self, player_id: &str) -> String {
        self.state
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| player_id.to_string())
    }

    fn position_of(&self, player_id: &str) -> u8 {
        self.state.player(player_id).map_or(GO_POSITION, |p| p.position)
    }

    fn adjust_money(&mut self, player_id: &str, delta: i64) {
        if let Some(player) = self.state.player_mut(player_id) {
            player.money += delta;
        }
    }

    /// Moves money from `payer` to `payee` (the bank when `None`) and
    /// settles the payer's solvency.
    pub fn pay(&mut self, payer: &str, payee: Option<&str>, amount: i64) -> Solvency {
        self.adjust_money(payer, -amount);
        if let Some(payee) = payee {
            self.adjust_money(payee, amount);
        }
        check_bankruptcy(self.state, payer)
    }

    /// Places the player on `target`, crediting the GO bonus once when
    /// `passes_go` is set.
    pub fn place(&mut self, player_id: &str, target: u8, passes_go: bool) {
        let go_bonus = self.rules.go_bonus;
        let name = self.name_of(player_id);
        let Some(player) = self.state.player_mut(player_id) else {
            return;
        };
        player.position = target % BOARD_SIZE;
        if passes_go {
            player.money += go_bonus;
            self.state.log(format!("{name} passed GO and collected {go_bonus}"));
        }
    }

    /// Moves forward `steps` squares, wrapping past GO.
    pub fn advance(&mut self, player_id: &str, steps: u8) {
        let from = self.position_of(player_id);
        let raw = u16::from(from) + u16::from(steps);
        self.place(player_id, (raw % u16::from(BOARD_SIZE)) as u8, raw >= u16::from(BOARD_SIZE));
    }

    pub fn send_to_jail(&mut self, player_id: &str) {
        let name = self.name_of(player_id);
        if let Some(player) = self.state.player_mut(player_id) {
            player.position = JAIL_POSITION;
            player.in_jail = true;
            player.jail_turns = 0;
        }
        self.state.double_roll_count = 0;
        self.state.log(format!("{name} was sent to jail"));
    }

    /// Applies the square at the player's current position.
    pub fn resolve_square(&mut self, player_id: &str, dice_total: i64, arrival: Arrival) -> Landing {
        let position = self.position_of(player_id);
        let square = square_at(position);
        let name = self.name_of(player_id);

        match square.kind {
            SquareKind::Property | SquareKind::Railroad | SquareKind::Utility => {
                self.land_on_property(player_id, position, dice_total, arrival);
                Landing::Stay
            }
            SquareKind::Tax => {
                let amount = square.tax.unwrap_or(0);
                self.state.log(format!("{name} paid {amount} in {}", square.name));
                self.pay(player_id, None, amount);
                Landing::Stay
            }
            SquareKind::GoToJail => {
                self.send_to_jail(player_id);
                Landing::TurnEnded
            }
            SquareKind::Chance => self.draw_card(player_id, DeckKind::Chance, dice_total),
            SquareKind::CommunityChest => {
                self.draw_card(player_id, DeckKind::CommunityChest, dice_total)
            }
            SquareKind::Go | SquareKind::Jail | SquareKind::FreeParking => Landing::Stay,
        }
    }

    fn land_on_property(&mut self, player_id: &str, position: u8, dice_total: i64, arrival: Arrival) {
        let Some(property) = self.state.properties.get(&position) else {
            tracing::warn!(position, "purchasable square has no property record");
            return;
        };
        let name = self.name_of(player_id);

        match property.owner.clone() {
            None => {
                self.notices.push(Notice::BuyOrAuction {
                    player_id: player_id.to_string(),
                    property_id: position,
                    name: property.name.clone(),
                    price: property.price,
                });
            }
            Some(owner) if owner == player_id => {}
            Some(_) if property.mortgaged => {
                let prop_name = property.name.clone();
                self.state
                    .log(format!("{name} landed on {prop_name}, which is mortgaged"));
            }
            Some(owner) => {
                let rent = rent_owed(self.state, property, &owner, dice_total, arrival);
                let prop_name = property.name.clone();
                let owner_name = self.name_of(&owner);
                self.state.log(format!(
                    "{name} paid {rent} rent to {owner_name} for {prop_name}"
                ));
                self.pay(player_id, Some(&owner), rent);
            }
        }
    }

    fn draw_card(&mut self, player_id: &str, deck: DeckKind, dice_total: i64) -> Landing {
        let Some(card) = cards::draw(self.state.deck_mut(deck)) else {
            tracing::warn!(?deck, "drew from an empty deck");
            return Landing::Stay;
        };
        let name = self.name_of(player_id);
        self.state
            .log(format!("{name} drew {}: {}", deck.label(), card.text));
        self.notices.push(Notice::CardDrawn {
            player_id: player_id.to_string(),
            deck,
            text: card.text.clone(),
        });

        let landing = self.resolve_card(player_id, &card, dice_total);
        cards::return_to_bottom(self.state.deck_mut(deck), card);
        landing
    }

    /// Applies a card's effect. Cards that move the player resolve the
    /// destination square as well.
    pub fn resolve_card(&mut self, player_id: &str, card: &Card, dice_total: i64) -> Landing {
        let from = self.position_of(player_id);
        match card.effect {
            CardEffect::MoveTo { position } => {
                self.place(player_id, position, position < from);
                self.resolve_square(player_id, dice_total, Arrival::Card)
            }
            CardEffect::MoveToNearest { group } => {
                let Some(target) = nearest_ahead(from, group) else {
                    return Landing::Stay;
                };
                self.place(player_id, target, target < from);
                self.resolve_square(player_id, dice_total, Arrival::Card)
            }
            CardEffect::MoveBy { steps } if steps >= 0 => {
                self.advance(player_id, steps as u8);
                self.resolve_square(player_id, dice_total, Arrival::Card)
            }
            CardEffect::MoveBy { steps } => {
                let back = steps.unsigned_abs() % BOARD_SIZE;
                self.place(player_id, (from + BOARD_SIZE - back) % BOARD_SIZE, false);
                self.resolve_square(player_id, dice_total, Arrival::Card)
            }
            CardEffect::Collect { amount } => {
                self.adjust_money(player_id, amount);
                Landing::Stay
            }
            CardEffect::Pay { amount } => {
                self.pay(player_id, None, amount);
                Landing::Stay
            }
            CardEffect::GoToJail => {
                self.send_to_jail(player_id);
                Landing::TurnEnded
            }
            CardEffect::GetOutOfJailFree => {
                if let Some(player) = self.state.player_mut(player_id) {
                    player.jail_free_cards += 1;
                }
                Landing::Stay
            }
            CardEffect::PayPerBuilding { per_house, per_hotel } => {
                let charge = self.building_charge(player_id, per_house, per_hotel);
                if charge > 0 {
                    let name = self.name_of(player_id);
                    self.state.log(format!("{name} paid {charge} for repairs"));
                }
                self.pay(player_id, None, charge);
                Landing::Stay
            }
            CardEffect::PayEachPlayer { amount } => {
                for other in self.other_active(player_id) {
                    self.adjust_money(player_id, -amount);
                    self.adjust_money(&other, amount);
                }
                check_bankruptcy(self.state, player_id);
                Landing::Stay
            }
            CardEffect::CollectFromEachPlayer { amount } => {
                for other in self.other_active(player_id) {
                    self.pay(&other, Some(player_id), amount);
                }
                Landing::Stay
            }
        }
    }

    fn other_active(&self, player_id: &str) -> Vec<String> {
        self.state
            .active_players()
            .filter(|p| p.id != player_id)
            .map(|p| p.id.clone())
            .collect()
    }

    /// A hotel is charged once at the hotel rate, never as five houses.
    fn building_charge(&self, player_id: &str, per_house: i64, per_hotel: i64) -> i64 {
        let Some(player) = self.state.player(player_id) else {
            return 0;
        };
        player
            .properties
            .iter()
            .filter_map(|pos| self.state.properties.get(pos))
            .map(|p| match p.houses() {
                5 => per_hotel,
                n => i64::from(n) * per_house,
            })
            .sum()
    }
}
