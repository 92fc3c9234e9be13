use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::error::RulesError;

/// Catalog key of a card, e.g. `fire-red-7`.
pub type CardKey = String;

/// Highest power a card can carry.
pub const MAX_POWER: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Snow,
}

impl Element {
    pub const ALL: [Element; 3] = [Element::Fire, Element::Water, Element::Snow];

    /// The element this one defeats.
    pub fn beats(self) -> Element {
        match self {
            Element::Fire => Element::Snow,
            Element::Snow => Element::Water,
            Element::Water => Element::Fire,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Snow => "snow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Orange,
        Color::Purple,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
            Color::Purple => "purple",
        }
    }
}

/// A single playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub element: Element,
    pub color: Color,
    pub power: u8,
}

impl Card {
    pub fn new(element: Element, color: Color, power: u8) -> Self {
        Self { element, color, power }
    }

    /// Catalog key of this card.
    pub fn key(&self) -> CardKey {
        self.to_string()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.element.as_str(), self.color.as_str(), self.power)
    }
}

impl FromStr for Card {
    type Err = RulesError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let unknown = || RulesError::UnknownCard(key.to_string());
        let mut parts = key.split('-');
        let (Some(element), Some(color), Some(power), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(unknown());
        };
        let element = Element::ALL
            .into_iter()
            .find(|e| e.as_str() == element)
            .ok_or_else(unknown)?;
        let color = Color::ALL
            .into_iter()
            .find(|c| c.as_str() == color)
            .ok_or_else(unknown)?;
        let power: u8 = power.parse().map_err(|_| unknown())?;
        if !(1..=MAX_POWER).contains(&power) {
            return Err(unknown());
        }
        Ok(Card::new(element, color, power))
    }
}

/// Three-way result of comparing two cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Versus {
    FirstWins,
    SecondWins,
    Tie,
}

/// Compare two cards: the element cycle decides first, then power.
pub fn compare(first: &Card, second: &Card) -> Versus {
    if first.element.beats() == second.element {
        Versus::FirstWins
    } else if second.element.beats() == first.element {
        Versus::SecondWins
    } else if first.power > second.power {
        Versus::FirstWins
    } else if second.power > first.power {
        Versus::SecondWins
    } else {
        Versus::Tie
    }
}

/// Every card the shop can hand out.
pub fn catalog() -> Vec<Card> {
    Element::ALL
        .into_iter()
        .flat_map(|element| {
            Color::ALL.into_iter().flat_map(move |color| {
                (1..=MAX_POWER).map(move |power| Card::new(element, color, power))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_cycle() {
        let fire = Card::new(Element::Fire, Color::Red, 2);
        let snow = Card::new(Element::Snow, Color::Blue, 12);
        let water = Card::new(Element::Water, Color::Green, 5);

        assert_eq!(compare(&fire, &snow), Versus::FirstWins);
        assert_eq!(compare(&snow, &water), Versus::FirstWins);
        assert_eq!(compare(&water, &fire), Versus::FirstWins);
        assert_eq!(compare(&snow, &fire), Versus::SecondWins);
    }

    #[test]
    fn test_same_element_uses_power() {
        let low = Card::new(Element::Water, Color::Red, 3);
        let high = Card::new(Element::Water, Color::Blue, 9);
        assert_eq!(compare(&low, &high), Versus::SecondWins);
        assert_eq!(compare(&high, &low), Versus::FirstWins);
        assert_eq!(compare(&low, &Card::new(Element::Water, Color::Purple, 3)), Versus::Tie);
    }

    #[test]
    fn test_key_parsing() {
        let card: Card = "snow-orange-11".parse().unwrap();
        assert_eq!(card, Card::new(Element::Snow, Color::Orange, 11));
        assert_eq!(card.key(), "snow-orange-11");

        assert!("snow-orange-13".parse::<Card>().is_err());
        assert!("lava-red-1".parse::<Card>().is_err());
        assert!("fire-red".parse::<Card>().is_err());
        assert!("fire-red-1-2".parse::<Card>().is_err());
    }

    #[test]
    fn test_catalog_is_complete() {
        let cards = catalog();
        assert_eq!(cards.len(), Element::ALL.len() * Color::ALL.len() * MAX_POWER as usize);
        assert!(cards.iter().all(|c| c.key().parse::<Card>().unwrap() == *c));
    }
}
