//! Bot policies for headless games.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::games::monopoly::actions::GameAction;
use crate::games::monopoly::board::group_positions;
use crate::games::monopoly::economy::{has_monopoly, unmortgage_cost};
use crate::games::monopoly::rules::Rules;
use crate::games::monopoly::types::{Auction, GameState, PlayerState, TradeProposal};

/// What a bot sees when asked to act.
pub struct Seat<'a> {
    pub state: &'a GameState,
    pub rules: &'a Rules,
    pub player_id: &'a str,
    /// Whether this player already proposed a trade during the current turn.
    pub traded_this_turn: bool,
}

impl Seat<'_> {
    pub fn me(&self) -> Option<&PlayerState> {
        self.state.player(self.player_id)
    }

    fn money(&self) -> i64 {
        self.me().map_or(0, |p| p.money)
    }

    /// Streets where one more house would be legal, ignoring funds.
    fn buildable(&self) -> Vec<(u8, i64)> {
        let Some(me) = self.me() else {
            return Vec::new();
        };
        me.properties
            .iter()
            .filter_map(|pos| self.state.properties.get(pos).map(|p| (*pos, p)))
            .filter_map(|(pos, p)| {
                let price = p.house_price()?;
                if !has_monopoly(self.state, self.player_id, p.group) || p.houses() >= 5 {
                    return None;
                }
                let siblings: Vec<_> = group_positions(p.group)
                    .iter()
                    .filter_map(|s| self.state.properties.get(s))
                    .collect();
                let fewest = siblings.iter().map(|s| s.houses()).min().unwrap_or(0);
                let clear = siblings.iter().all(|s| !s.mortgaged);
                (clear && p.houses() == fewest).then_some((pos, price))
            })
            .collect()
    }

    fn mortgaged(&self) -> Vec<u8> {
        self.me().map_or_else(Vec::new, |me| {
            me.properties
                .iter()
                .copied()
                .filter(|pos| self.state.properties.get(pos).is_some_and(|p| p.mortgaged))
                .collect()
        })
    }
}

/// A bot policy answers the four prompts a player can face.
pub trait BotStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Next action on the bot's own turn.
    fn choose_action(&self, seat: &Seat<'_>, rng: &mut StdRng) -> GameAction;

    /// Landed on an unowned property: `BUY_PROPERTY` or `START_AUCTION`.
    fn on_buy_prompt(&self, seat: &Seat<'_>, property_id: u8, price: i64, rng: &mut StdRng) -> GameAction;

    fn bid(&self, seat: &Seat<'_>, auction: &Auction, rng: &mut StdRng) -> Option<i64>;

    fn accept_trade(&self, seat: &Seat<'_>, trade: &TradeProposal, rng: &mut StdRng) -> bool;
}

/// Default moves shared by both policies: get out of jail, then roll.
fn roll_or_leave_jail(seat: &Seat<'_>) -> Option<GameAction> {
    let me = seat.me()?;
    if seat.state.has_rolled {
        return None;
    }
    if me.in_jail && me.jail_free_cards > 0 {
        return Some(GameAction::UseJailCard);
    }
    Some(GameAction::RollDice)
}

/// Acts at random among sensible moves.
pub struct RandomStrategy;

impl BotStrategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&self, seat: &Seat<'_>, rng: &mut StdRng) -> GameAction {
        if let Some(action) = roll_or_leave_jail(seat) {
            return action;
        }
        let mut options = vec![GameAction::EndTurn, GameAction::EndTurn, GameAction::EndTurn];
        if let Some(&(property_id, _)) = seat.buildable().choose(rng) {
            options.push(GameAction::BuyHouse { property_id });
        }
        if let Some(&property_id) = seat.mortgaged().choose(rng) {
            options.push(GameAction::UnmortgageProperty { property_id });
        }
        if !seat.traded_this_turn && rng.gen_bool(0.05) {
            let targets: Vec<_> = seat
                .state
                .properties
                .iter()
                .filter(|(_, p)| {
                    p.owner.as_deref().is_some_and(|o| o != seat.player_id)
                        && !p.mortgaged
                        && p.houses() == 0
                })
                .map(|(pos, p)| (*pos, p.owner.clone().unwrap_or_default(), p.price))
                .collect();
            if let Some((pos, owner, price)) = targets.choose(rng) {
                options.push(GameAction::ProposeTrade {
                    to_player: owner.clone(),
                    offered_properties: vec![],
                    requested_properties: vec![*pos],
                    offered_money: (*price).min(seat.money()),
                    requested_money: 0,
                });
            }
        }
        options.choose(rng).cloned().unwrap_or(GameAction::EndTurn)
    }

    fn on_buy_prompt(&self, _seat: &Seat<'_>, property_id: u8, _price: i64, rng: &mut StdRng) -> GameAction {
        if rng.gen_bool(0.7) {
            GameAction::BuyProperty {
                property_id: Some(property_id),
            }
        } else {
            GameAction::StartAuction {
                property_id: Some(property_id),
            }
        }
    }

    fn bid(&self, seat: &Seat<'_>, auction: &Auction, rng: &mut StdRng) -> Option<i64> {
        let price = seat
            .state
            .properties
            .get(&auction.property_id)
            .map_or(0, |p| p.price);
        let amount = auction.highest_bid + rng.gen_range(1..=40);
        (amount <= price && amount <= seat.money() && rng.gen_bool(0.4)).then_some(amount)
    }

    fn accept_trade(&self, _seat: &Seat<'_>, _trade: &TradeProposal, rng: &mut StdRng) -> bool {
        rng.gen_bool(0.5)
    }
}

/// Buys and builds while keeping a cash reserve; chases monopolies.
pub struct InvestorStrategy {
    pub reserve: i64,
}

impl Default for InvestorStrategy {
    fn default() -> Self {
        Self { reserve: 150 }
    }
}

impl InvestorStrategy {
    fn value_of(seat: &Seat<'_>, properties: &[u8]) -> i64 {
        properties
            .iter()
            .filter_map(|pos| seat.state.properties.get(pos))
            .map(|p| p.price)
            .sum()
    }

    /// A property that would complete one of our groups, with its owner.
    fn missing_piece(seat: &Seat<'_>) -> Option<(u8, String, i64)> {
        let me = seat.me()?;
        me.properties.iter().find_map(|pos| {
            let group = seat.state.properties.get(pos)?.group;
            let positions = group_positions(group);
            let missing: Vec<_> = positions
                .iter()
                .filter(|p| !me.properties.contains(*p))
                .collect();
            let [only] = missing.as_slice() else {
                return None;
            };
            let target = seat.state.properties.get(*only)?;
            let owner = target.owner.clone()?;
            (!target.mortgaged && target.houses() == 0).then_some((**only, owner, target.price))
        })
    }
}

impl BotStrategy for InvestorStrategy {
    fn name(&self) -> &str {
        "investor"
    }

    fn choose_action(&self, seat: &Seat<'_>, _rng: &mut StdRng) -> GameAction {
        let money = seat.money();
        if let Some(me) = seat.me() {
            if me.in_jail && !seat.state.has_rolled && me.jail_free_cards == 0 && money > 4 * seat.rules.jail_fine + self.reserve {
                return GameAction::PayJailFine;
            }
        }
        if let Some(action) = roll_or_leave_jail(seat) {
            return action;
        }
        if let Some((property_id, _)) = seat
            .buildable()
            .into_iter()
            .find(|(_, price)| money - price >= self.reserve)
        {
            return GameAction::BuyHouse { property_id };
        }
        for property_id in seat.mortgaged() {
            let cost = seat
                .state
                .properties
                .get(&property_id)
                .map_or(i64::MAX, |p| unmortgage_cost(p, seat.rules));
            if money - cost >= 2 * self.reserve {
                return GameAction::UnmortgageProperty { property_id };
            }
        }
        if !seat.traded_this_turn {
            if let Some((pos, owner, price)) = Self::missing_piece(seat) {
                let offer = price + price / 2;
                if money - offer >= self.reserve {
                    return GameAction::ProposeTrade {
                        to_player: owner,
                        offered_properties: vec![],
                        requested_properties: vec![pos],
                        offered_money: offer,
                        requested_money: 0,
                    };
                }
            }
        }
        GameAction::EndTurn
    }

    fn on_buy_prompt(&self, seat: &Seat<'_>, property_id: u8, price: i64, _rng: &mut StdRng) -> GameAction {
        if seat.money() - price >= self.reserve {
            GameAction::BuyProperty {
                property_id: Some(property_id),
            }
        } else {
            GameAction::StartAuction {
                property_id: Some(property_id),
            }
        }
    }

    fn bid(&self, seat: &Seat<'_>, auction: &Auction, _rng: &mut StdRng) -> Option<i64> {
        let price = seat
            .state
            .properties
            .get(&auction.property_id)
            .map_or(0, |p| p.price);
        let amount = auction.highest_bid + 10;
        let leading = auction
            .highest_bidder
            .as_ref()
            .is_some_and(|b| b.id == seat.player_id);
        (!leading && amount <= price && seat.money() - amount >= self.reserve).then_some(amount)
    }

    /// Accepts when what comes in is worth at least what goes out, and
    /// never gives up a piece of a group it already completes.
    fn accept_trade(&self, seat: &Seat<'_>, trade: &TradeProposal, _rng: &mut StdRng) -> bool {
        let breaks_monopoly = trade.requested_properties.iter().any(|pos| {
            seat.state
                .properties
                .get(pos)
                .is_some_and(|p| has_monopoly(seat.state, seat.player_id, p.group))
        });
        let incoming = Self::value_of(seat, &trade.offered_properties) + trade.offered_money;
        let outgoing = Self::value_of(seat, &trade.requested_properties) + trade.requested_money;
        !breaks_monopoly && incoming >= outgoing && seat.money() - trade.requested_money >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::monopoly::types::{Bidder, PlayerState};
    use rand::SeedableRng;

    fn state() -> GameState {
        let mut state = GameState::new(&mut StdRng::seed_from_u64(4));
        state.players.push(PlayerState::new("a", "A", "red", 1500));
        state.players.push(PlayerState::new("b", "B", "blue", 1500));
        state.game_started = true;
        state
    }

    fn seat<'a>(state: &'a GameState, rules: &'a Rules, player_id: &'a str) -> Seat<'a> {
        Seat {
            state,
            rules,
            player_id,
            traded_this_turn: false,
        }
    }

    #[test]
    fn test_investor_rolls_first_then_builds() {
        let rules = Rules::default();
        let mut state = state();
        state.transfer_property(1, Some("a"));
        state.transfer_property(3, Some("a"));
        let mut rng = StdRng::seed_from_u64(1);
        let bot = InvestorStrategy::default();

        assert_eq!(bot.choose_action(&seat(&state, &rules, "a"), &mut rng), GameAction::RollDice);
        state.has_rolled = true;
        assert_eq!(
            bot.choose_action(&seat(&state, &rules, "a"), &mut rng),
            GameAction::BuyHouse { property_id: 1 }
        );
    }

    #[test]
    fn test_investor_offers_for_missing_piece() {
        let rules = Rules::default();
        let mut state = state();
        state.transfer_property(1, Some("a"));
        state.transfer_property(3, Some("b"));
        state.has_rolled = true;
        let action = InvestorStrategy::default()
            .choose_action(&seat(&state, &rules, "a"), &mut StdRng::seed_from_u64(1));
        assert!(matches!(
            action,
            GameAction::ProposeTrade { ref to_player, ref requested_properties, offered_money: 90, .. }
                if to_player == "b" && requested_properties == &vec![3]
        ));
    }

    #[test]
    fn test_investor_does_not_outbid_itself() {
        let rules = Rules::default();
        let state = state();
        let auction = Auction {
            property_id: 5,
            highest_bid: 50,
            highest_bidder: Some(Bidder { id: "a".into(), name: "A".into() }),
            seconds_left: 10,
        };
        let bot = InvestorStrategy::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(bot.bid(&seat(&state, &rules, "a"), &auction, &mut rng), None);
        assert_eq!(bot.bid(&seat(&state, &rules, "b"), &auction, &mut rng), Some(60));
    }

    #[test]
    fn test_investor_trade_valuation() {
        let rules = Rules::default();
        let mut state = state();
        state.transfer_property(5, Some("b"));
        let trade = TradeProposal {
            from: "a".into(),
            to: "b".into(),
            offered_properties: vec![],
            requested_properties: vec![5],
            offered_money: 150,
            requested_money: 0,
        };
        let bot = InvestorStrategy::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!bot.accept_trade(&seat(&state, &rules, "b"), &trade, &mut rng));
        let better = TradeProposal { offered_money: 250, ..trade };
        assert!(bot.accept_trade(&seat(&state, &rules, "b"), &better, &mut rng));
    }
}
