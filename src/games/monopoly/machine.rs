//! Turn and auction state machine for one room.
//!
//! ```text
//! WAITING_FOR_PLAYERS --START_GAME--> IN_PROGRESS --last survivor--> GAME_OVER
//!
//! IN_PROGRESS:  AWAITING_ROLL --ROLL_DICE--> (landing) --> AWAITING_END_TURN
//!                     ^                                          |
//!                     +------------- END_TURN (next player) -----+
//! ```
//!
//! An auction suspends rolling and ending the turn until its timer runs
//! out; a pending trade waits for its recipient without blocking play.
//!
//! House rules that differ from the classic game:
//! - doubles rolled in jail release the player without moving, and the
//!   player may roll again in the same turn;
//! - a card that moves the player onto a utility always charges ten times
//!   the dice, however many utilities the owner holds.

use serde::{Deserialize, Serialize};

use super::actions::GameAction;
use super::board::{group_positions, square_at};
use super::dice::{roll_transition, DiceSource, RollTransition};
use super::economy::{check_bankruptcy, has_monopoly, house_sale_value, unmortgage_cost, Arrival};
use super::error::GameError;
use super::resolver::{Landing, Turn};
use super::rules::{Rules, PLAYER_COLORS};
use super::types::{Auction, Bidder, GameState, Notice, PlayerState, Property, TradeProposal};

/// Coarse phase of a room, as shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    WaitingForPlayers,
    AwaitingRoll,
    AwaitingEndTurn,
    Auction,
    AwaitingTradeResponse,
    GameOver,
}

pub fn turn_phase(state: &GameState) -> TurnPhase {
    if state.game_won {
        TurnPhase::GameOver
    } else if !state.game_started {
        TurnPhase::WaitingForPlayers
    } else if state.auction.is_some() {
        TurnPhase::Auction
    } else if state.current_trade.is_some() {
        TurnPhase::AwaitingTradeResponse
    } else if state.has_rolled {
        TurnPhase::AwaitingEndTurn
    } else {
        TurnPhase::AwaitingRoll
    }
}

/// Result of one auction timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionTick {
    Idle,
    Running { seconds_left: u32 },
    Sold { property_id: u8, winner: String, price: i64 },
    Unsold { property_id: u8 },
}

pub struct MonopolyGame {
    rules: Rules,
    dice: Box<dyn DiceSource>,
}

impl MonopolyGame {
    pub fn new(rules: Rules, dice: Box<dyn DiceSource>) -> Self {
        Self { rules, dice }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Adds a player to a room that has not started yet.
    pub fn join(
        &self,
        state: &mut GameState,
        player_id: &str,
        name: &str,
        color: Option<&str>,
    ) -> Result<(), GameError> {
        if state.game_started {
            return Err(GameError::AlreadyStarted);
        }
        if state.players.len() >= self.rules.max_players {
            return Err(GameError::RoomFull {
                max: self.rules.max_players,
            });
        }
        if state.player(player_id).is_some() {
            return Err(GameError::AlreadyJoined(player_id.to_string()));
        }
        let color = color.map(str::to_string).unwrap_or_else(|| {
            PLAYER_COLORS
                .iter()
                .find(|c| state.players.iter().all(|p| p.color != **c))
                .unwrap_or(&PLAYER_COLORS[0])
                .to_string()
        });
        state.players.push(PlayerState::new(
            player_id,
            name,
            &color,
            self.rules.starting_money,
        ));
        state.log(format!("{name} joined the room"));
        Ok(())
    }

    /// Applies `action` on behalf of `player_id`. On error the state is
    /// untouched; on success the returned notices are addressed to single
    /// players.
    pub fn apply(
        &mut self,
        state: &mut GameState,
        player_id: &str,
        action: &GameAction,
    ) -> Result<Vec<Notice>, GameError> {
        let mut next = state.clone();
        let mut notices = Vec::new();
        self.dispatch(&mut next, player_id, action, &mut notices)?;
        settle_turn(&mut next);
        *state = next;
        tracing::debug!(player_id, action = action.name(), "action applied");
        Ok(notices)
    }

    fn dispatch(
        &mut self,
        state: &mut GameState,
        player_id: &str,
        action: &GameAction,
        notices: &mut Vec<Notice>,
    ) -> Result<(), GameError> {
        if let GameAction::StartGame = action {
            return self.start_game(state, player_id);
        }
        ensure_playing(state)?;

        match action {
            GameAction::Bid { amount } => return self.bid(state, player_id, *amount),
            GameAction::AcceptTrade => return self.accept_trade(state, player_id),
            GameAction::RejectTrade => return reject_trade(state, player_id),
            _ => ensure_current(state, player_id)?,
        }

        let mut turn = Turn {
            state,
            rules: &self.rules,
            notices,
        };
        match action {
            GameAction::RollDice => roll_dice(&mut turn, &mut *self.dice, player_id),
            GameAction::BuyProperty { property_id } => buy_property(&mut turn, player_id, *property_id),
            GameAction::StartAuction { property_id } => start_auction(&mut turn, player_id, *property_id),
            GameAction::BuyHouse { property_id } => buy_house(&mut turn, player_id, *property_id),
            GameAction::SellHouse { property_id } => sell_house(&mut turn, player_id, *property_id),
            GameAction::MortgageProperty { property_id } => mortgage(&mut turn, player_id, *property_id),
            GameAction::UnmortgageProperty { property_id } => unmortgage(&mut turn, player_id, *property_id),
            GameAction::PayJailFine => pay_jail_fine(&mut turn, player_id),
            GameAction::UseJailCard => use_jail_card(&mut turn, player_id),
            GameAction::EndTurn => end_turn(&mut turn, player_id),
            GameAction::ProposeTrade {
                to_player,
                offered_properties,
                requested_properties,
                offered_money,
                requested_money,
            } => propose_trade(
                &mut turn,
                TradeProposal {
                    from: player_id.to_string(),
                    to: to_player.clone(),
                    offered_properties: offered_properties.clone(),
                    requested_properties: requested_properties.clone(),
                    offered_money: *offered_money,
                    requested_money: *requested_money,
                },
            ),
            GameAction::StartGame
            | GameAction::Bid { .. }
            | GameAction::AcceptTrade
            | GameAction::RejectTrade => Ok(()),
        }
    }

    fn start_game(&self, state: &mut GameState, player_id: &str) -> Result<(), GameError> {
        if state.game_started {
            return Err(GameError::AlreadyStarted);
        }
        if state.player(player_id).is_none() {
            return Err(GameError::UnknownPlayer(player_id.to_string()));
        }
        if state.players[0].id != player_id {
            return Err(GameError::NotHost);
        }
        if state.players.len() < self.rules.min_players {
            return Err(GameError::NotEnoughPlayers {
                min: self.rules.min_players,
            });
        }
        state.game_started = true;
        state.current_player_index = 0;
        state.has_rolled = false;
        state.last_dice = None;
        state.double_roll_count = 0;
        let first = state.players[0].name.clone();
        state.log(format!("Game started with {} players", state.players.len()));
        state.log(format!("It is {first}'s turn"));
        tracing::info!(players = state.players.len(), "game started");
        Ok(())
    }

    fn bid(&self, state: &mut GameState, player_id: &str, amount: i64) -> Result<(), GameError> {
        let auction = state.auction.as_ref().ok_or(GameError::NoAuction)?;
        let bidder = state
            .player(player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
        if bidder.bankrupt {
            return Err(GameError::PlayerBankrupt);
        }
        if amount <= 0 {
            return Err(GameError::InvalidAmount);
        }
        if amount <= auction.highest_bid {
            return Err(GameError::BidTooLow {
                highest: auction.highest_bid,
            });
        }
        ensure_funds(bidder, amount)?;

        let name = bidder.name.clone();
        let property_id = auction.property_id;
        state.auction = Some(Auction {
            property_id,
            highest_bid: amount,
            highest_bidder: Some(Bidder {
                id: player_id.to_string(),
                name: name.clone(),
            }),
            seconds_left: self.rules.auction_seconds,
        });
        let prop = property_name(state, property_id);
        state.log(format!("{name} bid {amount} for {prop}"));
        Ok(())
    }

    /// Advances the auction countdown by one second, settling the auction
    /// when it reaches zero.
    pub fn auction_tick(&self, state: &mut GameState) -> AuctionTick {
        let Some(auction) = state.auction.as_mut() else {
            return AuctionTick::Idle;
        };
        auction.seconds_left = auction.seconds_left.saturating_sub(1);
        if auction.seconds_left > 0 {
            return AuctionTick::Running {
                seconds_left: auction.seconds_left,
            };
        }

        let Some(auction) = state.auction.take() else {
            return AuctionTick::Idle;
        };
        let property_id = auction.property_id;
        let prop = property_name(state, property_id);
        let had_bidder = auction.highest_bidder.is_some();
        let winner = auction
            .highest_bidder
            .filter(|b| state.player(&b.id).is_some_and(|p| !p.bankrupt));

        let outcome = match winner {
            Some(bidder) => {
                let price = auction.highest_bid;
                if let Some(player) = state.player_mut(&bidder.id) {
                    player.money -= price;
                }
                state.transfer_property(property_id, Some(&bidder.id));
                state.log(format!("{} won the auction for {prop} at {price}", bidder.name));
                check_bankruptcy(state, &bidder.id);
                AuctionTick::Sold {
                    property_id,
                    winner: bidder.id,
                    price,
                }
            }
            None => {
                if had_bidder {
                    tracing::warn!(property_id, "auction winner is no longer solvent");
                }
                state.log(format!("No bids for {prop}; it stays with the bank"));
                AuctionTick::Unsold { property_id }
            }
        };
        settle_turn(state);
        tracing::debug!(?outcome, "auction closed");
        outcome
    }

    fn accept_trade(&self, state: &mut GameState, player_id: &str) -> Result<(), GameError> {
        let trade = state.current_trade.clone().ok_or(GameError::NoTrade)?;
        if trade.to != player_id {
            return Err(GameError::NotTradeRecipient);
        }
        validate_trade(state, &trade)?;
        let (Some(from), Some(to)) = (state.player(&trade.from), state.player(&trade.to)) else {
            return Err(GameError::UnknownPlayer(trade.from.clone()));
        };
        ensure_funds(from, trade.offered_money)?;
        ensure_funds(to, trade.requested_money)?;
        let (from_name, to_name) = (from.name.clone(), to.name.clone());

        let delta = trade.requested_money - trade.offered_money;
        if let Some(from) = state.player_mut(&trade.from) {
            from.money += delta;
        }
        if let Some(to) = state.player_mut(&trade.to) {
            to.money -= delta;
        }
        for &pos in &trade.offered_properties {
            state.transfer_property(pos, Some(&trade.to));
        }
        for &pos in &trade.requested_properties {
            state.transfer_property(pos, Some(&trade.from));
        }
        state.current_trade = None;
        state.log(format!("{to_name} accepted the trade from {from_name}"));
        Ok(())
    }
}

fn ensure_playing(state: &GameState) -> Result<(), GameError> {
    if !state.game_started {
        return Err(GameError::NotStarted);
    }
    if state.game_won {
        return Err(GameError::GameOver);
    }
    Ok(())
}

fn ensure_current(state: &GameState, player_id: &str) -> Result<(), GameError> {
    let player = state
        .player(player_id)
        .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
    if player.bankrupt {
        return Err(GameError::PlayerBankrupt);
    }
    if state.current_player().map(|p| p.id.as_str()) != Some(player_id) {
        return Err(GameError::NotYourTurn);
    }
    Ok(())
}

fn ensure_funds(player: &PlayerState, needed: i64) -> Result<(), GameError> {
    if player.money < needed {
        return Err(GameError::InsufficientFunds {
            needed,
            available: player.money,
        });
    }
    Ok(())
}

fn property_name(state: &GameState, property_id: u8) -> String {
    state
        .properties
        .get(&property_id)
        .map_or_else(|| square_at(property_id).name.to_string(), |p| p.name.clone())
}

fn owned_property<'s>(
    state: &'s GameState,
    player_id: &str,
    property_id: u8,
) -> Result<&'s Property, GameError> {
    let property = state
        .properties
        .get(&property_id)
        .ok_or(GameError::UnknownProperty(property_id))?;
    if !property.is_owned_by(player_id) {
        return Err(GameError::NotOwner(property_id));
    }
    Ok(property)
}

fn player_name(state: &GameState, player_id: &str) -> String {
    state
        .player(player_id)
        .map_or_else(|| player_id.to_string(), |p| p.name.clone())
}

/// Hands the turn to the next active player.
fn advance_turn(state: &mut GameState) {
    if state.game_won || state.players.is_empty() {
        return;
    }
    let n = state.players.len();
    let next = (1..=n)
        .map(|step| (state.current_player_index + step) % n)
        .find(|&i| !state.players[i].bankrupt);
    let Some(next) = next else {
        return;
    };
    state.current_player_index = next;
    state.has_rolled = false;
    state.last_dice = None;
    state.double_roll_count = 0;
    let name = state.players[next].name.clone();
    state.log(format!("It is {name}'s turn"));
}

/// A bankrupt current player cannot act, so play moves on.
fn settle_turn(state: &mut GameState) {
    if state.game_started
        && !state.game_won
        && state.current_player().is_some_and(|p| p.bankrupt)
    {
        advance_turn(state);
    }
}

fn roll_dice(turn: &mut Turn<'_>, dice: &mut dyn DiceSource, player_id: &str) -> Result<(), GameError> {
    if turn.state.auction.is_some() {
        return Err(GameError::AuctionInProgress);
    }
    if turn.state.has_rolled {
        return Err(GameError::AlreadyRolled);
    }
    let Some(player) = turn.state.player(player_id) else {
        return Err(GameError::UnknownPlayer(player_id.to_string()));
    };
    let (name, in_jail, jail_turns) = (player.name.clone(), player.in_jail, player.jail_turns);

    let roll = dice.roll();
    turn.state.last_dice = Some((roll.0, roll.1));
    turn.state.log(format!("{name} rolled {} and {}", roll.0, roll.1));

    let transition = roll_transition(
        roll,
        in_jail,
        jail_turns,
        turn.state.double_roll_count,
        turn.rules.max_jail_turns,
    );
    match transition {
        RollTransition::LeaveJail => {
            release(turn.state, player_id);
            turn.state.has_rolled = false;
            turn.state.last_dice = None;
            turn.state.log(format!("{name} rolled doubles and left jail"));
        }
        RollTransition::StayInJail => {
            if let Some(p) = turn.state.player_mut(player_id) {
                p.jail_turns += 1;
            }
            turn.state.has_rolled = true;
            turn.state.log(format!("{name} stays in jail"));
        }
        RollTransition::ForcedFine => {
            release(turn.state, player_id);
            turn.state.has_rolled = true;
            let fine = turn.rules.jail_fine;
            turn.state
                .log(format!("{name} paid the {fine} jail fine after three failed attempts"));
            turn.pay(player_id, None, fine);
        }
        RollTransition::Speeding => {
            turn.state.log(format!("{name} rolled doubles three times in a row"));
            turn.send_to_jail(player_id);
            advance_turn(turn.state);
        }
        RollTransition::MoveAndRollAgain | RollTransition::Move => {
            if roll.is_double() {
                turn.state.double_roll_count += 1;
            }
            turn.advance(player_id, roll.total());
            let position = turn.state.player(player_id).map_or(0, |p| p.position);
            turn.state
                .log(format!("{name} moved to {}", square_at(position).name));
            match turn.resolve_square(player_id, i64::from(roll.total()), Arrival::Dice) {
                Landing::TurnEnded => advance_turn(turn.state),
                Landing::Stay => {
                    turn.state.has_rolled = transition == RollTransition::Move;
                }
            }
        }
    }
    Ok(())
}

fn release(state: &mut GameState, player_id: &str) {
    if let Some(p) = state.player_mut(player_id) {
        p.in_jail = false;
        p.jail_turns = 0;
    }
}

fn end_turn(turn: &mut Turn<'_>, player_id: &str) -> Result<(), GameError> {
    if turn.state.auction.is_some() {
        return Err(GameError::AuctionInProgress);
    }
    let in_jail = turn.state.player(player_id).is_some_and(|p| p.in_jail);
    let Some((a, b)) = turn.state.last_dice else {
        if in_jail {
            skip_jail_roll(turn, player_id);
            advance_turn(turn.state);
            return Ok(());
        }
        return Err(GameError::MustRollFirst);
    };

    let state = &mut *turn.state;
    if a == b && !in_jail {
        let name = player_name(state, player_id);
        state.has_rolled = false;
        state.last_dice = None;
        state.log(format!("{name} rolled doubles and goes again"));
    } else {
        advance_turn(state);
    }
    Ok(())
}

/// Ending a jail turn without rolling uses up one attempt; the last one
/// forces the fine.
fn skip_jail_roll(turn: &mut Turn<'_>, player_id: &str) {
    let name = player_name(turn.state, player_id);
    let Some(player) = turn.state.player_mut(player_id) else {
        return;
    };
    player.jail_turns += 1;
    if player.jail_turns < turn.rules.max_jail_turns {
        turn.state.log(format!("{name} stays in jail"));
        return;
    }
    release(turn.state, player_id);
    let fine = turn.rules.jail_fine;
    turn.state
        .log(format!("{name} paid the {fine} jail fine after three failed attempts"));
    turn.pay(player_id, None, fine);
}

fn buy_property(turn: &mut Turn<'_>, player_id: &str, property_id: Option<u8>) -> Result<(), GameError> {
    let state = &mut *turn.state;
    let player = state
        .player(player_id)
        .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
    let property_id = property_id.unwrap_or(player.position);
    let property = state
        .properties
        .get(&property_id)
        .ok_or(GameError::UnknownProperty(property_id))?;
    if state
        .auction
        .as_ref()
        .is_some_and(|a| a.property_id == property_id)
    {
        return Err(GameError::AuctionInProgress);
    }
    if property.owner.is_some() {
        return Err(GameError::AlreadyOwned(property_id));
    }
    ensure_funds(player, property.price)?;

    let (price, prop, name) = (property.price, property.name.clone(), player.name.clone());
    if let Some(p) = state.player_mut(player_id) {
        p.money -= price;
    }
    state.transfer_property(property_id, Some(player_id));
    state.log(format!("{name} bought {prop} for {price}"));
    Ok(())
}

fn start_auction(turn: &mut Turn<'_>, player_id: &str, property_id: Option<u8>) -> Result<(), GameError> {
    let state = &mut *turn.state;
    if state.auction.is_some() {
        return Err(GameError::AuctionInProgress);
    }
    let position = state.player(player_id).map_or(0, |p| p.position);
    let property_id = property_id.unwrap_or(position);
    let property = state
        .properties
        .get(&property_id)
        .ok_or(GameError::UnknownProperty(property_id))?;
    if property.owner.is_some() {
        return Err(GameError::AlreadyOwned(property_id));
    }
    let prop = property.name.clone();
    state.auction = Some(Auction {
        property_id,
        highest_bid: 0,
        highest_bidder: None,
        seconds_left: turn.rules.auction_seconds,
    });
    state.log(format!("Auction started for {prop}"));
    Ok(())
}

/// House counts of every street in `property`'s group.
fn group_houses(state: &GameState, property: &Property) -> Vec<u8> {
    group_positions(property.group)
        .iter()
        .filter_map(|pos| state.properties.get(pos))
        .map(Property::houses)
        .collect()
}

fn check_buildable(state: &GameState, player_id: &str, property: &Property, property_id: u8) -> Result<(), GameError> {
    if property.house_price().is_none() {
        return Err(GameError::NotAStreet(property_id));
    }
    if !has_monopoly(state, player_id, property.group) {
        return Err(GameError::NoMonopoly(property.group));
    }
    let group_mortgaged = group_positions(property.group)
        .iter()
        .any(|pos| state.properties.get(pos).is_some_and(|p| p.mortgaged));
    if group_mortgaged {
        return Err(GameError::GroupMortgaged(property.group));
    }
    Ok(())
}

fn buy_house(turn: &mut Turn<'_>, player_id: &str, property_id: u8) -> Result<(), GameError> {
    let state = &mut *turn.state;
    let property = owned_property(state, player_id, property_id)?;
    check_buildable(state, player_id, property, property_id)?;
    let houses = property.houses();
    if houses >= 5 {
        return Err(GameError::HotelLimit(property_id));
    }
    let fewest = group_houses(state, property).into_iter().min().unwrap_or(0);
    if houses > fewest {
        return Err(GameError::UnevenBuilding);
    }
    let cost = property.house_price().unwrap_or(0);
    let player = state
        .player(player_id)
        .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
    ensure_funds(player, cost)?;

    let (name, prop) = (player.name.clone(), property.name.clone());
    if let Some(p) = state.player_mut(player_id) {
        p.money -= cost;
    }
    if let Some(p) = state.properties.get_mut(&property_id) {
        p.set_houses(houses + 1);
    }
    let building = if houses + 1 == 5 { "a hotel" } else { "a house" };
    state.log(format!("{name} built {building} on {prop} for {cost}"));
    Ok(())
}

fn sell_house(turn: &mut Turn<'_>, player_id: &str, property_id: u8) -> Result<(), GameError> {
    let state = &mut *turn.state;
    let property = owned_property(state, player_id, property_id)?;
    if property.house_price().is_none() {
        return Err(GameError::NotAStreet(property_id));
    }
    if property.mortgaged {
        return Err(GameError::Mortgaged(property_id));
    }
    let houses = property.houses();
    if houses == 0 {
        return Err(GameError::NoHouses(property_id));
    }
    let most = group_houses(state, property).into_iter().max().unwrap_or(0);
    if houses < most {
        return Err(GameError::UnevenBuilding);
    }
    let refund = house_sale_value(property);
    let prop = property.name.clone();
    let name = player_name(state, player_id);

    if let Some(p) = state.player_mut(player_id) {
        p.money += refund;
    }
    if let Some(p) = state.properties.get_mut(&property_id) {
        p.set_houses(houses - 1);
    }
    state.log(format!("{name} sold a building on {prop} for {refund}"));
    Ok(())
}

fn mortgage(turn: &mut Turn<'_>, player_id: &str, property_id: u8) -> Result<(), GameError> {
    let state = &mut *turn.state;
    let property = owned_property(state, player_id, property_id)?;
    if property.mortgaged {
        return Err(GameError::Mortgaged(property_id));
    }
    if property.houses() > 0 {
        return Err(GameError::HasBuildings(property_id));
    }
    if property.house_price().is_some() && group_houses(state, property).iter().any(|&h| h > 0) {
        return Err(GameError::GroupHasBuildings(property.group));
    }
    let (value, prop) = (property.mortgage_value, property.name.clone());
    let name = player_name(state, player_id);

    if let Some(p) = state.player_mut(player_id) {
        p.money += value;
    }
    if let Some(p) = state.properties.get_mut(&property_id) {
        p.mortgaged = true;
    }
    state.log(format!("{name} mortgaged {prop} for {value}"));
    Ok(())
}

fn unmortgage(turn: &mut Turn<'_>, player_id: &str, property_id: u8) -> Result<(), GameError> {
    let state = &mut *turn.state;
    let property = owned_property(state, player_id, property_id)?;
    if !property.mortgaged {
        return Err(GameError::NotMortgaged(property_id));
    }
    let cost = unmortgage_cost(property, turn.rules);
    let prop = property.name.clone();
    let player = state
        .player(player_id)
        .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
    ensure_funds(player, cost)?;
    let name = player.name.clone();

    if let Some(p) = state.player_mut(player_id) {
        p.money -= cost;
    }
    if let Some(p) = state.properties.get_mut(&property_id) {
        p.mortgaged = false;
    }
    state.log(format!("{name} lifted the mortgage on {prop} for {cost}"));
    Ok(())
}

fn pay_jail_fine(turn: &mut Turn<'_>, player_id: &str) -> Result<(), GameError> {
    if !turn.state.player(player_id).is_some_and(|p| p.in_jail) {
        return Err(GameError::NotInJail);
    }
    let fine = turn.rules.jail_fine;
    let name = player_name(turn.state, player_id);
    release(turn.state, player_id);
    turn.state.log(format!("{name} paid {fine} to leave jail"));
    turn.pay(player_id, None, fine);
    Ok(())
}

fn use_jail_card(turn: &mut Turn<'_>, player_id: &str) -> Result<(), GameError> {
    let state = &mut *turn.state;
    let player = state
        .player_mut(player_id)
        .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
    if !player.in_jail {
        return Err(GameError::NotInJail);
    }
    if player.jail_free_cards == 0 {
        return Err(GameError::NoJailCard);
    }
    player.jail_free_cards -= 1;
    player.in_jail = false;
    player.jail_turns = 0;
    let name = player.name.clone();
    state.log(format!("{name} used a get-out-of-jail-free card"));
    Ok(())
}

/// Each listed property must belong to `owner`, carry no mortgage and no
/// buildings, and appear once.
fn validate_trade_side(state: &GameState, owner: &str, properties: &[u8]) -> Result<(), GameError> {
    for (i, pos) in properties.iter().enumerate() {
        if properties[..i].contains(pos) {
            return Err(GameError::InvalidTrade(format!("property {pos} listed twice")));
        }
        let property = state
            .properties
            .get(pos)
            .ok_or(GameError::UnknownProperty(*pos))?;
        if !property.is_owned_by(owner) {
            return Err(GameError::InvalidTrade(format!(
                "{} does not belong to {owner}",
                property.name
            )));
        }
        if property.mortgaged {
            return Err(GameError::Mortgaged(*pos));
        }
        if property.houses() > 0 {
            return Err(GameError::HasBuildings(*pos));
        }
    }
    Ok(())
}

fn validate_trade(state: &GameState, trade: &TradeProposal) -> Result<(), GameError> {
    if trade.from == trade.to {
        return Err(GameError::InvalidTrade("cannot trade with yourself".into()));
    }
    for id in [&trade.from, &trade.to] {
        let player = state
            .player(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.clone()))?;
        if player.bankrupt {
            return Err(GameError::InvalidTrade(format!("{id} is bankrupt")));
        }
    }
    if trade.offered_money < 0 || trade.requested_money < 0 {
        return Err(GameError::InvalidAmount);
    }
    if trade.offered_properties.is_empty()
        && trade.requested_properties.is_empty()
        && trade.offered_money == 0
        && trade.requested_money == 0
    {
        return Err(GameError::InvalidTrade("trade is empty".into()));
    }
    validate_trade_side(state, &trade.from, &trade.offered_properties)?;
    validate_trade_side(state, &trade.to, &trade.requested_properties)
}

fn propose_trade(turn: &mut Turn<'_>, trade: TradeProposal) -> Result<(), GameError> {
    if turn.state.current_trade.is_some() {
        return Err(GameError::TradePending);
    }
    validate_trade(turn.state, &trade)?;
    if let Some(from) = turn.state.player(&trade.from) {
        ensure_funds(from, trade.offered_money)?;
    }
    let from_name = player_name(turn.state, &trade.from);
    let to_name = player_name(turn.state, &trade.to);
    turn.state
        .log(format!("{from_name} proposed a trade to {to_name}"));
    turn.notices.push(Notice::TradeProposed {
        player_id: trade.to.clone(),
        trade: trade.clone(),
    });
    turn.state.current_trade = Some(trade);
    Ok(())
}

/// The recipient declines, or the proposer withdraws.
fn reject_trade(state: &mut GameState, player_id: &str) -> Result<(), GameError> {
    let trade = state.current_trade.as_ref().ok_or(GameError::NoTrade)?;
    if trade.to != player_id && trade.from != player_id {
        return Err(GameError::NotTradeRecipient);
    }
    let to_name = player_name(state, &trade.to);
    let withdrawn = trade.from == player_id;
    state.current_trade = None;
    if withdrawn {
        let name = player_name(state, player_id);
        state.log(format!("{name} withdrew the trade offer to {to_name}"));
    } else {
        state.log(format!("{to_name} rejected the trade"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::monopoly::dice::ScriptedDice;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game(rolls: &[(u8, u8)]) -> MonopolyGame {
        MonopolyGame::new(Rules::default(), Box::new(ScriptedDice::new(rolls)))
    }

    fn started(game: &mut MonopolyGame, ids: &[&str]) -> GameState {
        let mut state = GameState::new(&mut StdRng::seed_from_u64(5));
        for id in ids {
            game.join(&mut state, id, &id.to_uppercase(), None).unwrap();
        }
        game.apply(&mut state, ids[0], &GameAction::StartGame).unwrap();
        state
    }

    fn money(state: &GameState, id: &str) -> i64 {
        state.player(id).unwrap().money
    }

    #[test]
    fn test_join_limits() {
        let game = game(&[]);
        let mut state = GameState::new(&mut StdRng::seed_from_u64(1));
        for id in ["a", "b", "c", "d"] {
            game.join(&mut state, id, id, None).unwrap();
        }
        assert_eq!(
            game.join(&mut state, "e", "e", None),
            Err(GameError::RoomFull { max: 4 })
        );
        let colors: Vec<_> = state.players.iter().map(|p| p.color.as_str()).collect();
        assert_eq!(colors, PLAYER_COLORS.to_vec());
    }

    #[test]
    fn test_start_game_rules() {
        let mut game = game(&[]);
        let mut state = GameState::new(&mut StdRng::seed_from_u64(1));
        game.join(&mut state, "a", "A", None).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::StartGame),
            Err(GameError::NotEnoughPlayers { min: 2 })
        );
        game.join(&mut state, "b", "B", Some("purple")).unwrap();
        assert_eq!(
            game.apply(&mut state, "b", &GameAction::StartGame),
            Err(GameError::NotHost)
        );
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::RollDice),
            Err(GameError::NotStarted)
        );
        game.apply(&mut state, "a", &GameAction::StartGame).unwrap();
        assert_eq!(turn_phase(&state), TurnPhase::AwaitingRoll);
        assert_eq!(
            game.join(&mut state, "c", "C", None),
            Err(GameError::AlreadyStarted)
        );
    }

    #[test]
    fn test_roll_once_per_turn_and_turn_order() {
        let mut game = game(&[(1, 2), (2, 4)]);
        let mut state = started(&mut game, &["a", "b"]);
        assert_eq!(
            game.apply(&mut state, "b", &GameAction::RollDice),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::EndTurn),
            Err(GameError::MustRollFirst)
        );
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        assert_eq!(state.player("a").unwrap().position, 3);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::RollDice),
            Err(GameError::AlreadyRolled)
        );
        game.apply(&mut state, "a", &GameAction::EndTurn).unwrap();
        assert_eq!(state.current_player_id().as_deref(), Some("b"));
        assert!(!state.has_rolled);
    }

    #[test]
    fn test_doubles_repeat_the_turn() {
        let mut game = game(&[(3, 3), (1, 2)]);
        let mut state = started(&mut game, &["a", "b"]);
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        assert_eq!(state.player("a").unwrap().position, 6);
        assert!(!state.has_rolled);
        assert_eq!(state.double_roll_count, 1);
        game.apply(&mut state, "a", &GameAction::EndTurn).unwrap();
        assert_eq!(state.current_player_id().as_deref(), Some("a"));
        assert_eq!(state.double_roll_count, 1);
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        assert_eq!(state.player("a").unwrap().position, 9);
        assert!(state.has_rolled);
    }

    #[test]
    fn test_three_doubles_go_to_jail() {
        let mut game = game(&[(1, 1), (2, 2), (3, 3)]);
        let mut state = started(&mut game, &["a", "b"]);
        state.chance_deck.clear();
        state.community_chest_deck.clear();
        for _ in 0..3 {
            game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        }
        let a = state.player("a").unwrap();
        assert!(a.in_jail);
        assert_eq!(a.position, 10);
        assert_eq!(state.double_roll_count, 0);
        assert_eq!(state.current_player_id().as_deref(), Some("b"));
    }

    #[test]
    fn test_jail_doubles_release_without_moving() {
        let mut game = game(&[(5, 5), (1, 2)]);
        let mut state = started(&mut game, &["a", "b"]);
        {
            let a = state.player_mut("a").unwrap();
            a.in_jail = true;
            a.position = 10;
        }
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        let a = state.player("a").unwrap();
        assert!(!a.in_jail);
        assert_eq!(a.position, 10);
        assert!(!state.has_rolled);
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        assert_eq!(state.player("a").unwrap().position, 13);
    }

    #[test]
    fn test_third_failed_jail_roll_forces_fine() {
        let mut game = game(&[(1, 2), (1, 2), (1, 2)]);
        let mut state = started(&mut game, &["a", "b"]);
        {
            let a = state.player_mut("a").unwrap();
            a.in_jail = true;
            a.position = 10;
        }
        for expected in [1u8, 2] {
            game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
            assert_eq!(state.player("a").unwrap().jail_turns, expected);
            game.apply(&mut state, "a", &GameAction::EndTurn).unwrap();
            assert_eq!(state.current_player_id().as_deref(), Some("b"));
            state.current_player_index = 0;
        }
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        let a = state.player("a").unwrap();
        assert!(!a.in_jail);
        assert_eq!(a.jail_turns, 0);
        assert_eq!(a.money, 1450);
        assert_eq!(a.position, 10);
    }

    #[test]
    fn test_end_turn_in_jail_counts_as_failed_attempt() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        {
            let a = state.player_mut("a").unwrap();
            a.in_jail = true;
            a.position = 10;
        }
        for expected in [1u8, 2] {
            game.apply(&mut state, "a", &GameAction::EndTurn).unwrap();
            assert_eq!(state.player("a").unwrap().jail_turns, expected);
            assert!(state.player("a").unwrap().in_jail);
            assert_eq!(state.current_player_id().as_deref(), Some("b"));
            state.current_player_index = 0;
        }
        game.apply(&mut state, "a", &GameAction::EndTurn).unwrap();
        let a = state.player("a").unwrap();
        assert!(!a.in_jail);
        assert_eq!(a.jail_turns, 0);
        assert_eq!(a.money, 1450);
        assert_eq!(a.position, 10);
        assert_eq!(state.current_player_id().as_deref(), Some("b"));
    }

    #[test]
    fn test_jail_doubles_do_not_repeat_the_turn() {
        let mut game = game(&[(4, 4)]);
        let mut state = started(&mut game, &["a", "b"]);
        state.player_mut("a").unwrap().in_jail = true;
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        assert!(state.last_dice.is_none());
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::EndTurn),
            Err(GameError::MustRollFirst)
        );
        assert!(!state.log.iter().any(|e| e.message.contains("goes again")));
    }

    #[test]
    fn test_jail_card_and_fine() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::PayJailFine),
            Err(GameError::NotInJail)
        );
        state.player_mut("a").unwrap().in_jail = true;
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::UseJailCard),
            Err(GameError::NoJailCard)
        );
        state.player_mut("a").unwrap().jail_free_cards = 1;
        game.apply(&mut state, "a", &GameAction::UseJailCard).unwrap();
        let a = state.player("a").unwrap();
        assert!(!a.in_jail);
        assert_eq!(a.jail_free_cards, 0);

        state.player_mut("a").unwrap().in_jail = true;
        game.apply(&mut state, "a", &GameAction::PayJailFine).unwrap();
        assert_eq!(money(&state, "a"), 1450);
        assert!(!state.player("a").unwrap().in_jail);
    }

    #[test]
    fn test_buy_property_checks() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyProperty { property_id: Some(7) }),
            Err(GameError::UnknownProperty(7))
        );
        state.player_mut("a").unwrap().money = 50;
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyProperty { property_id: Some(1) }),
            Err(GameError::InsufficientFunds { needed: 60, available: 50 })
        );
        state.player_mut("a").unwrap().money = 1500;
        game.apply(&mut state, "a", &GameAction::BuyProperty { property_id: Some(1) }).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyProperty { property_id: Some(1) }),
            Err(GameError::AlreadyOwned(1))
        );
        assert_eq!(state.player("a").unwrap().properties, vec![1]);
    }

    fn with_brown_monopoly(game: &mut MonopolyGame) -> GameState {
        let mut state = started(game, &["a", "b"]);
        state.transfer_property(1, Some("a"));
        state.transfer_property(3, Some("a"));
        state
    }

    #[test]
    fn test_building_requires_monopoly() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        state.transfer_property(1, Some("a"));
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }),
            Err(GameError::NoMonopoly(crate::games::monopoly::board::Group::Brown))
        );
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 5 }),
            Err(GameError::NotOwner(5))
        );
    }

    #[test]
    fn test_building_evenly() {
        let mut game = game(&[]);
        let mut state = with_brown_monopoly(&mut game);
        game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }).unwrap();
        assert_eq!(money(&state, "a"), 1450);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }),
            Err(GameError::UnevenBuilding)
        );
        game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 3 }).unwrap();
        game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 3 }).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::SellHouse { property_id: 1 }),
            Err(GameError::UnevenBuilding)
        );
        game.apply(&mut state, "a", &GameAction::SellHouse { property_id: 3 }).unwrap();
        assert_eq!(money(&state, "a"), 1500 - 150 + 25);
        assert_eq!(state.properties[&3].houses(), 1);
    }

    #[test]
    fn test_hotel_is_the_limit() {
        let mut game = game(&[]);
        let mut state = with_brown_monopoly(&mut game);
        state.properties.get_mut(&1).unwrap().set_houses(5);
        state.properties.get_mut(&3).unwrap().set_houses(5);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }),
            Err(GameError::HotelLimit(1))
        );
    }

    #[test]
    fn test_mortgage_cycle() {
        let mut game = game(&[]);
        let mut state = with_brown_monopoly(&mut game);
        game.apply(&mut state, "a", &GameAction::MortgageProperty { property_id: 3 }).unwrap();
        assert_eq!(money(&state, "a"), 1530);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::MortgageProperty { property_id: 3 }),
            Err(GameError::Mortgaged(3))
        );
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }),
            Err(GameError::GroupMortgaged(crate::games::monopoly::board::Group::Brown))
        );
        game.apply(&mut state, "a", &GameAction::UnmortgageProperty { property_id: 3 }).unwrap();
        assert_eq!(money(&state, "a"), 1530 - 33);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::UnmortgageProperty { property_id: 3 }),
            Err(GameError::NotMortgaged(3))
        );

        game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::MortgageProperty { property_id: 1 }),
            Err(GameError::HasBuildings(1))
        );
    }

    #[test]
    fn test_houses_stay_sellable_and_block_group_mortgages() {
        let mut game = game(&[]);
        let mut state = with_brown_monopoly(&mut game);
        game.apply(&mut state, "a", &GameAction::BuyHouse { property_id: 1 }).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::MortgageProperty { property_id: 3 }),
            Err(GameError::GroupHasBuildings(crate::games::monopoly::board::Group::Brown))
        );
        assert!(!state.properties[&3].mortgaged);

        game.apply(&mut state, "a", &GameAction::SellHouse { property_id: 1 }).unwrap();
        assert_eq!(state.properties[&1].houses(), 0);
        game.apply(&mut state, "a", &GameAction::MortgageProperty { property_id: 3 }).unwrap();
        assert!(state.properties[&3].mortgaged);
    }

    #[test]
    fn test_selling_survives_a_broken_monopoly() {
        let mut game = game(&[]);
        let mut state = with_brown_monopoly(&mut game);
        state.properties.get_mut(&1).unwrap().set_houses(1);
        state.transfer_property(3, Some("b"));
        game.apply(&mut state, "a", &GameAction::SellHouse { property_id: 1 }).unwrap();
        assert_eq!(money(&state, "a"), 1525);
    }

    #[test]
    fn test_bid_validation() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        assert_eq!(
            game.apply(&mut state, "b", &GameAction::Bid { amount: 10 }),
            Err(GameError::NoAuction)
        );
        game.apply(&mut state, "a", &GameAction::StartAuction { property_id: Some(5) }).unwrap();
        assert_eq!(turn_phase(&state), TurnPhase::Auction);
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::RollDice),
            Err(GameError::AuctionInProgress)
        );
        game.apply(&mut state, "b", &GameAction::Bid { amount: 50 }).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::Bid { amount: 50 }),
            Err(GameError::BidTooLow { highest: 50 })
        );
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::Bid { amount: 5000 }),
            Err(GameError::InsufficientFunds { needed: 5000, available: 1500 })
        );
    }

    #[test]
    fn test_bid_resets_timer() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        game.apply(&mut state, "a", &GameAction::StartAuction { property_id: Some(5) }).unwrap();
        for _ in 0..4 {
            game.auction_tick(&mut state);
        }
        assert_eq!(state.auction.as_ref().unwrap().seconds_left, 6);
        game.apply(&mut state, "b", &GameAction::Bid { amount: 20 }).unwrap();
        assert_eq!(state.auction.as_ref().unwrap().seconds_left, 10);
    }

    #[test]
    fn test_auction_without_bids_logs_once() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        game.apply(&mut state, "a", &GameAction::StartAuction { property_id: Some(5) }).unwrap();
        for _ in 0..9 {
            assert!(matches!(game.auction_tick(&mut state), AuctionTick::Running { .. }));
        }
        assert_eq!(game.auction_tick(&mut state), AuctionTick::Unsold { property_id: 5 });
        assert_eq!(game.auction_tick(&mut state), AuctionTick::Idle);
        assert!(state.auction.is_none());
        assert!(state.properties[&5].owner.is_none());
        let no_bid_entries = state.log.iter().filter(|e| e.message.starts_with("No bids")).count();
        assert_eq!(no_bid_entries, 1);
    }

    #[test]
    fn test_end_turn_blocked_during_auction() {
        let mut game = game(&[(1, 2)]);
        let mut state = started(&mut game, &["a", "b"]);
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        game.apply(&mut state, "a", &GameAction::StartAuction { property_id: None }).unwrap();
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::EndTurn),
            Err(GameError::AuctionInProgress)
        );
    }

    #[test]
    fn test_trade_flow() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b", "c"]);
        state.transfer_property(1, Some("a"));
        state.transfer_property(5, Some("b"));
        let propose = GameAction::ProposeTrade {
            to_player: "b".into(),
            offered_properties: vec![1],
            requested_properties: vec![5],
            offered_money: 100,
            requested_money: 0,
        };
        assert_eq!(
            game.apply(&mut state, "b", &propose),
            Err(GameError::NotYourTurn)
        );
        let notices = game.apply(&mut state, "a", &propose).unwrap();
        assert!(matches!(notices.as_slice(), [Notice::TradeProposed { player_id, .. }] if player_id == "b"));
        assert_eq!(turn_phase(&state), TurnPhase::AwaitingTradeResponse);
        assert_eq!(game.apply(&mut state, "a", &propose), Err(GameError::TradePending));
        assert_eq!(
            game.apply(&mut state, "c", &GameAction::AcceptTrade),
            Err(GameError::NotTradeRecipient)
        );

        game.apply(&mut state, "b", &GameAction::AcceptTrade).unwrap();
        assert!(state.current_trade.is_none());
        assert!(state.properties[&1].is_owned_by("b"));
        assert!(state.properties[&5].is_owned_by("a"));
        assert_eq!(money(&state, "a"), 1400);
        assert_eq!(money(&state, "b"), 1600);
        assert_eq!(state.player("a").unwrap().properties, vec![5]);
        assert_eq!(state.player("b").unwrap().properties, vec![1]);
    }

    #[test]
    fn test_trade_rejects_mortgaged_or_foreign_property() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        state.transfer_property(1, Some("a"));
        state.properties.get_mut(&1).unwrap().mortgaged = true;
        let offer = |props: Vec<u8>| GameAction::ProposeTrade {
            to_player: "b".into(),
            offered_properties: props,
            requested_properties: vec![],
            offered_money: 0,
            requested_money: 0,
        };
        assert_eq!(game.apply(&mut state, "a", &offer(vec![1])), Err(GameError::Mortgaged(1)));
        assert!(matches!(
            game.apply(&mut state, "a", &offer(vec![3])),
            Err(GameError::InvalidTrade(_))
        ));
        assert!(matches!(
            game.apply(&mut state, "a", &offer(vec![])),
            Err(GameError::InvalidTrade(_))
        ));
    }

    #[test]
    fn test_reject_and_withdraw_trade() {
        let mut game = game(&[]);
        let mut state = started(&mut game, &["a", "b"]);
        let propose = GameAction::ProposeTrade {
            to_player: "b".into(),
            offered_properties: vec![],
            requested_properties: vec![],
            offered_money: 10,
            requested_money: 0,
        };
        game.apply(&mut state, "a", &propose).unwrap();
        game.apply(&mut state, "b", &GameAction::RejectTrade).unwrap();
        assert!(state.current_trade.is_none());
        assert_eq!(money(&state, "a"), 1500);

        game.apply(&mut state, "a", &propose).unwrap();
        game.apply(&mut state, "a", &GameAction::RejectTrade).unwrap();
        assert!(state.current_trade.is_none());
        assert_eq!(
            game.apply(&mut state, "b", &GameAction::RejectTrade),
            Err(GameError::NoTrade)
        );
    }

    #[test]
    fn test_bankrupt_current_player_passes_the_turn() {
        let mut game = game(&[(1, 3)]);
        let mut state = started(&mut game, &["a", "b", "c"]);
        state.player_mut("a").unwrap().money = 100;
        game.apply(&mut state, "a", &GameAction::RollDice).unwrap();
        let a = state.player("a").unwrap();
        assert!(a.bankrupt);
        assert!(!state.game_won);
        assert_eq!(state.current_player_id().as_deref(), Some("b"));
        assert_eq!(
            game.apply(&mut state, "a", &GameAction::Bid { amount: 1 }),
            Err(GameError::NoAuction)
        );
    }
}
