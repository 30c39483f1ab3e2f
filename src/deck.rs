//! Decks of user-written cards and the rotation that picks the next one.

use crate::constants::DEFAULT_TAG;
use rand::Rng;
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Card {
    pub statement: String,
    pub tags: Vec<String>,
    pub author: String,
}

impl Card {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Display form: the first tag only, or the default label.
    pub fn normalized(&self) -> Card {
        let tag = self
            .tags
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_TAG.to_string());
        Card {
            statement: self.statement.clone(),
            tags: vec![tag],
            author: self.author.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deck {
    pub id: String,
    pub title: String,
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(id: impl Into<String>, title: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cards,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardSelection {
    pub card: Card,
    pub index: usize,
}

/// Draw a card uniformly at random, never repeating `previous` when the deck
/// has more than one card. Empty or missing decks yield no card.
pub fn select_next<R: Rng + ?Sized>(
    deck: Option<&Deck>,
    previous: Option<usize>,
    rng: &mut R,
) -> Option<CardSelection> {
    let deck = deck?;
    let len = deck.cards.len();
    if len == 0 {
        return None;
    }
    let mut index = rng.gen_range(0..len);
    while len > 1 && Some(index) == previous {
        index = rng.gen_range(0..len);
    }
    Some(CardSelection {
        card: deck.cards[index].normalized(),
        index,
    })
}

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("no deck with id {0:?}")]
    UnknownDeck(String),
    #[error("deck store failed: {0}")]
    Store(String),
}

/// Persistence for user decks. The engine itself only ever sees one `Deck`.
pub trait DeckStore {
    fn load_decks(&self) -> Result<Vec<Deck>, DeckError>;
    fn save_decks(&mut self, decks: &[Deck]) -> Result<(), DeckError>;

    fn find(&self, id: &str) -> Result<Deck, DeckError> {
        self.load_decks()?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| DeckError::UnknownDeck(id.to_string()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryDeckStore {
    decks: Vec<Deck>,
}

impl MemoryDeckStore {
    pub fn new(decks: Vec<Deck>) -> Self {
        Self { decks }
    }
}

impl DeckStore for MemoryDeckStore {
    fn load_decks(&self) -> Result<Vec<Deck>, DeckError> {
        Ok(self.decks.clone())
    }

    fn save_decks(&mut self, decks: &[Deck]) -> Result<(), DeckError> {
        self.decks = decks.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck(n: usize) -> Deck {
        let cards = (0..n)
            .map(|i| Card::new(format!("statement {i}")).with_tags([format!("tag{i}"), "extra".into()]))
            .collect();
        Deck::new("d", "Deck", cards)
    }

    #[test]
    fn empty_or_missing_deck_yields_no_card() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_next(None, None, &mut rng).is_none());
        assert!(select_next(Some(&deck(0)), None, &mut rng).is_none());
    }

    #[test]
    fn never_repeats_previous_index() {
        let mut rng = StdRng::seed_from_u64(42);
        for size in 2..6 {
            let d = deck(size);
            let mut prev = None;
            for _ in 0..500 {
                let sel = select_next(Some(&d), prev, &mut rng).unwrap();
                assert_ne!(Some(sel.index), prev, "repeat in deck of {size}");
                assert!(sel.index < size);
                prev = Some(sel.index);
            }
        }
    }

    #[test]
    fn single_card_deck_always_returns_it() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = deck(1);
        let mut prev = None;
        for _ in 0..50 {
            let sel = select_next(Some(&d), prev, &mut rng).unwrap();
            assert_eq!(sel.index, 0);
            prev = Some(sel.index);
        }
    }

    #[test]
    fn tags_are_trimmed_to_the_first_or_default() {
        let tagged = Card::new("a").with_tags(["calm", "focus"]);
        assert_eq!(tagged.normalized().tags, vec!["calm".to_string()]);
        let bare = Card::new("b");
        assert_eq!(bare.normalized().tags, vec![DEFAULT_TAG.to_string()]);
    }

    #[test]
    fn memory_store_round_trips_and_finds() {
        let mut store = MemoryDeckStore::default();
        store.save_decks(&[deck(2)]).unwrap();
        assert_eq!(store.load_decks().unwrap().len(), 1);
        assert_eq!(store.find("d").unwrap().cards.len(), 2);
        assert!(matches!(store.find("nope"), Err(DeckError::UnknownDeck(_))));
    }
}
