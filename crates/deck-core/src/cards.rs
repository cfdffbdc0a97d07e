//! Station cards: the renderable view of a station list.

use crate::favorites::FavoritesStore;
use crate::station::{Station, StationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    Icon(String),
    Initials(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationCard {
    pub id: StationId,
    pub cover: Cover,
    pub name: String,
    pub tags: String,
    pub favorite: bool,
}

pub fn render_cards(stations: &[Station], favorites: &FavoritesStore) -> Vec<StationCard> {
    stations
        .iter()
        .map(|station| StationCard {
            id: station.id.clone(),
            cover: cover_for(station),
            name: station.name.clone(),
            tags: station
                .tags
                .clone()
                .unwrap_or_else(|| "No tags".to_string()),
            favorite: favorites.is_favorite(&station.id),
        })
        .collect()
}

pub fn cover_for(station: &Station) -> Cover {
    match &station.icon_url {
        Some(url) => Cover::Icon(url.clone()),
        None => Cover::Initials(initials(&station.name)),
    }
}

/// First letter of each word, uppercased, at most three characters.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(3)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_are_capped_and_uppercased() {
        assert_eq!(initials("radio one"), "RO");
        assert_eq!(initials("all india radio news"), "AIR");
        assert_eq!(initials("Big  FM"), "BF");
        assert_eq!(initials(""), "?");
    }

    #[test]
    fn cards_reflect_membership_and_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let mut favorites = FavoritesStore::open(dir.path().join("f.json"));
        let plain = Station {
            id: StationId::new("a"),
            name: "Radio Mirchi".into(),
            stream_url: "http://a".into(),
            icon_url: None,
            tags: None,
            country: None,
        };
        let iconic = Station {
            id: StationId::new("b"),
            icon_url: Some("https://img/b.png".into()),
            tags: Some("pop".into()),
            ..plain.clone()
        };
        favorites.toggle(&iconic).unwrap();

        let cards = render_cards(&[plain, iconic], &favorites);
        assert_eq!(cards[0].cover, Cover::Initials("RM".into()));
        assert_eq!(cards[0].tags, "No tags");
        assert!(!cards[0].favorite);
        assert_eq!(cards[1].cover, Cover::Icon("https://img/b.png".into()));
        assert!(cards[1].favorite);
    }
}
