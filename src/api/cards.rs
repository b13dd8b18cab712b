//! Payment Cards
//!
//! Card listing and short-reference resolution.

use super::client::AivenClient;
use super::http::ApiError;
use serde::Deserialize;

/// Payment card as returned by `/card`
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub card_id: String,
}

#[derive(Debug, Deserialize)]
struct CardList {
    #[serde(default)]
    cards: Vec<Card>,
}

pub struct CardsHandler<'a> {
    client: &'a AivenClient,
}

impl<'a> CardsHandler<'a> {
    pub(crate) fn new(client: &'a AivenClient) -> Self {
        Self { client }
    }

    /// List all cards visible to the token
    pub async fn list(&self) -> Result<Vec<Card>, ApiError> {
        let response = self.client.get(&self.client.url("card")).await?;
        let list: CardList = serde_json::from_value(response)?;
        Ok(list.cards)
    }

    /// Find a card by its canonical id or by a unique prefix of it
    pub async fn get(&self, card_id: &str) -> Result<Option<Card>, ApiError> {
        if card_id.is_empty() {
            return Ok(None);
        }

        let cards = self.list().await?;
        Ok(match_card(cards, card_id))
    }
}

/// Exact id wins; otherwise a prefix must match exactly one card.
pub(crate) fn match_card(cards: Vec<Card>, card_id: &str) -> Option<Card> {
    if let Some(card) = cards.iter().find(|c| c.card_id == card_id) {
        return Some(card.clone());
    }

    let mut candidates = cards.into_iter().filter(|c| c.card_id.starts_with(card_id));
    match (candidates.next(), candidates.next()) {
        (Some(card), None) => Some(card),
        _ => None,
    }
}

/// Resolve a possibly short card reference to the long card id.
///
/// An empty reference means "no card" and is never sent to the API. A
/// reference that matches no card is passed through unchanged so the API
/// reports the problem.
pub async fn get_long_card_id(
    client: &AivenClient,
    card_id: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let Some(card_id) = card_id.filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    match client.cards().get(card_id).await? {
        Some(card) => Ok(Some(card.card_id)),
        None => Ok(Some(card_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str) -> Card {
        Card {
            card_id: id.to_string(),
        }
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        let cards = vec![card("abc"), card("abcdef")];
        assert_eq!(match_card(cards, "abc").unwrap().card_id, "abc");
    }

    #[test]
    fn test_unique_prefix_resolves() {
        let cards = vec![card("1234-long-id"), card("9999-other")];
        assert_eq!(match_card(cards, "1234").unwrap().card_id, "1234-long-id");
    }

    #[test]
    fn test_ambiguous_prefix_does_not_resolve() {
        let cards = vec![card("12-a"), card("12-b")];
        assert!(match_card(cards, "12").is_none());
    }
}
