//! Static board: 40 squares in fixed order plus the purchasable property
//! catalog built from it.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::types::{Property, PropertyKind};

pub const BOARD_SIZE: u8 = 40;
pub const GO_POSITION: u8 = 0;
pub const JAIL_POSITION: u8 = 10;
pub const GO_TO_JAIL_POSITION: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
    Railroad,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareKind {
    Go,
    Property,
    Railroad,
    Utility,
    Tax,
    Chance,
    CommunityChest,
    Jail,
    GoToJail,
    FreeParking,
}

#[derive(Debug, Clone, Serialize)]
pub struct Square {
    pub position: u8,
    pub name: &'static str,
    pub kind: SquareKind,
    pub group: Option<Group>,
    pub tax: Option<i64>,
}

/// Price data for a purchasable square.
#[derive(Debug, Clone, Copy)]
struct Deed {
    price: i64,
    /// Street rent by house count; empty for railroads and utilities.
    rent: Option<[i64; 6]>,
    house_price: i64,
}

const fn street(price: i64, rent: [i64; 6], house_price: i64) -> Option<Deed> {
    Some(Deed {
        price,
        rent: Some(rent),
        house_price,
    })
}

const fn station(price: i64) -> Option<Deed> {
    Some(Deed {
        price,
        rent: None,
        house_price: 0,
    })
}

type Row = (&'static str, SquareKind, Option<Group>, Option<i64>, Option<Deed>);

const LAYOUT: [Row; 40] = {
    use Group::*;
    use SquareKind as K;
    [
        ("GO", K::Go, None, None, None),
        ("Mediterranean Avenue", K::Property, Some(Brown), None, street(60, [2, 10, 30, 90, 160, 250], 50)),
        ("Community Chest", K::CommunityChest, None, None, None),
        ("Baltic Avenue", K::Property, Some(Brown), None, street(60, [4, 20, 60, 180, 320, 450], 50)),
        ("Income Tax", K::Tax, None, Some(200), None),
        ("Reading Railroad", K::Railroad, Some(Railroad), None, station(200)),
        ("Oriental Avenue", K::Property, Some(LightBlue), None, street(100, [6, 30, 90, 270, 400, 550], 50)),
        ("Quantum Chance", K::Chance, None, None, None),
        ("Vermont Avenue", K::Property, Some(LightBlue), None, street(100, [6, 30, 90, 270, 400, 550], 50)),
        ("Connecticut Avenue", K::Property, Some(LightBlue), None, street(120, [8, 40, 100, 300, 450, 600], 50)),
        ("Jail", K::Jail, None, None, None),
        ("St. Charles Place", K::Property, Some(Pink), None, street(140, [10, 50, 150, 450, 625, 750], 100)),
        ("Electric Company", K::Utility, Some(Utility), None, station(150)),
        ("States Avenue", K::Property, Some(Pink), None, street(140, [10, 50, 150, 450, 625, 750], 100)),
        ("Virginia Avenue", K::Property, Some(Pink), None, street(160, [12, 60, 180, 500, 700, 900], 100)),
        ("Pennsylvania Railroad", K::Railroad, Some(Railroad), None, station(200)),
        ("St. James Place", K::Property, Some(Orange), None, street(180, [14, 70, 200, 550, 750, 950], 100)),
        ("Community Chest", K::CommunityChest, None, None, None),
        ("Tennessee Avenue", K::Property, Some(Orange), None, street(180, [14, 70, 200, 550, 750, 950], 100)),
        ("New York Avenue", K::Property, Some(Orange), None, street(200, [16, 80, 220, 600, 800, 1000], 100)),
        ("Free Parking", K::FreeParking, None, None, None),
        ("Kentucky Avenue", K::Property, Some(Red), None, street(220, [18, 90, 250, 700, 875, 1050], 150)),
        ("Quantum Chance", K::Chance, None, None, None),
        ("Indiana Avenue", K::Property, Some(Red), None, street(220, [18, 90, 250, 700, 875, 1050], 150)),
        ("Illinois Avenue", K::Property, Some(Red), None, street(240, [20, 100, 300, 750, 925, 1100], 150)),
        ("B&O Railroad", K::Railroad, Some(Railroad), None, station(200)),
        ("Atlantic Avenue", K::Property, Some(Yellow), None, street(260, [22, 110, 330, 800, 975, 1150], 150)),
        ("Ventnor Avenue", K::Property, Some(Yellow), None, street(260, [22, 110, 330, 800, 975, 1150], 150)),
        ("Water Works", K::Utility, Some(Utility), None, station(150)),
        ("Marvin Gardens", K::Property, Some(Yellow), None, street(280, [24, 120, 360, 850, 1025, 1200], 150)),
        ("Go To Jail", K::GoToJail, None, None, None),
        ("Pacific Avenue", K::Property, Some(Green), None, street(300, [26, 130, 390, 900, 1100, 1275], 200)),
        ("North Carolina Avenue", K::Property, Some(Green), None, street(300, [26, 130, 390, 900, 1100, 1275], 200)),
        ("Community Chest", K::CommunityChest, None, None, None),
        ("Pennsylvania Avenue", K::Property, Some(Green), None, street(320, [28, 150, 450, 1000, 1200, 1400], 200)),
        ("Short Line", K::Railroad, Some(Railroad), None, station(200)),
        ("Quantum Chance", K::Chance, None, None, None),
        ("Park Place", K::Property, Some(DarkBlue), None, street(350, [35, 175, 500, 1100, 1300, 1500], 200)),
        ("Luxury Tax", K::Tax, None, Some(100), None),
        ("Boardwalk", K::Property, Some(DarkBlue), None, street(400, [50, 200, 600, 1400, 1700, 2000], 200)),
    ]
};

pub static BOARD: Lazy<Vec<Square>> = Lazy::new(|| {
    LAYOUT
        .iter()
        .enumerate()
        .map(|(i, &(name, kind, group, tax, _))| Square {
            position: i as u8,
            name,
            kind,
            group,
            tax,
        })
        .collect()
});

/// Square at a board position, wrapping positions past the last square.
pub fn square_at(position: u8) -> &'static Square {
    &BOARD[(position % BOARD_SIZE) as usize]
}

/// Board positions of every square in `group`, in board order.
pub fn group_positions(group: Group) -> Vec<u8> {
    BOARD
        .iter()
        .filter(|sq| sq.group == Some(group))
        .map(|sq| sq.position)
        .collect()
}

/// Fresh, unowned property map keyed by board position.
pub fn initial_properties() -> BTreeMap<u8, Property> {
    LAYOUT
        .iter()
        .enumerate()
        .filter_map(|(i, &(name, kind, group, _, deed))| {
            let deed = deed?;
            let group = group?;
            let kind = match (kind, deed.rent) {
                (SquareKind::Property, Some(rent)) => PropertyKind::Street {
                    rent,
                    house_price: deed.house_price,
                    houses: 0,
                },
                (SquareKind::Railroad, _) => PropertyKind::Railroad,
                (SquareKind::Utility, _) => PropertyKind::Utility,
                _ => return None,
            };
            Some((
                i as u8,
                Property {
                    name: name.to_string(),
                    group,
                    price: deed.price,
                    owner: None,
                    mortgaged: false,
                    mortgage_value: deed.price / 2,
                    kind,
                },
            ))
        })
        .collect()
}

/// Forward distance from `from` to `to` going around the board.
pub fn forward_distance(from: u8, to: u8) -> u8 {
    (to + BOARD_SIZE - from % BOARD_SIZE) % BOARD_SIZE
}

/// First square of `group` strictly ahead of `from`, scanning forward.
pub fn nearest_ahead(from: u8, group: Group) -> Option<u8> {
    group_positions(group)
        .into_iter()
        .filter(|&p| p != from)
        .min_by_key(|&p| forward_distance(from, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_shape() {
        assert_eq!(BOARD.len(), 40);
        assert_eq!(square_at(0).kind, SquareKind::Go);
        assert_eq!(square_at(JAIL_POSITION).kind, SquareKind::Jail);
        assert_eq!(square_at(GO_TO_JAIL_POSITION).kind, SquareKind::GoToJail);
        assert_eq!(square_at(7).name, "Quantum Chance");
        assert_eq!(square_at(4).tax, Some(200));
        assert_eq!(square_at(40).position, 0);
    }

    #[test]
    fn test_property_catalog() {
        let props = initial_properties();
        assert_eq!(props.len(), 28);
        assert_eq!(props[&1].price, 60);
        assert_eq!(props[&1].mortgage_value, 30);
        assert_eq!(props[&5].price, 200);
        assert!(matches!(props[&5].kind, PropertyKind::Railroad));
        assert!(matches!(props[&12].kind, PropertyKind::Utility));
        assert!(props.values().all(|p| p.owner.is_none() && !p.mortgaged));
    }

    #[test]
    fn test_group_sizes() {
        assert_eq!(group_positions(Group::Brown), vec![1, 3]);
        assert_eq!(group_positions(Group::LightBlue), vec![6, 8, 9]);
        assert_eq!(group_positions(Group::DarkBlue), vec![37, 39]);
        assert_eq!(group_positions(Group::Railroad), vec![5, 15, 25, 35]);
        assert_eq!(group_positions(Group::Utility), vec![12, 28]);
    }

    #[test]
    fn test_nearest_ahead_wraps() {
        assert_eq!(nearest_ahead(7, Group::Railroad), Some(15));
        assert_eq!(nearest_ahead(36, Group::Railroad), Some(5));
        assert_eq!(nearest_ahead(36, Group::Utility), Some(12));
        assert_eq!(nearest_ahead(22, Group::Utility), Some(28));
    }
}
