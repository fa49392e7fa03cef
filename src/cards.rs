use crate::error::DealError;
use crate::types::{Card, Suit, CARD_NUM, RANK_CHARS, SUIT_CHARS};

/// Parse a two-character card token such as `"AS"` or `"td"`.
pub fn parse_card(tok: &str) -> Result<Card, DealError> {
    let bytes = tok.as_bytes();
    if bytes.len() != 2 {
        return Err(DealError::UnknownCard(tok.to_string()));
    }
    let r = bytes[0].to_ascii_uppercase();
    let s = bytes[1].to_ascii_uppercase();
    let rank = RANK_CHARS.iter().position(|&c| c == r);
    let suit = SUIT_CHARS.iter().position(|&c| c == s);
    match (rank, suit) {
        (Some(rank), Some(suit)) => Ok(Card::new(Suit::from_index(suit as u8), rank as u8)),
        _ => Err(DealError::UnknownCard(tok.to_string())),
    }
}

/// Parse one pile written as concatenated card tokens (`"2C2H7C"`).
/// Whitespace between tokens is ignored.
pub fn parse_pile(line: &str) -> Result<Vec<Card>, DealError> {
    let compact: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() % 2 != 0 {
        return Err(DealError::UnknownCard(compact.into_iter().collect()));
    }
    compact
        .chunks(2)
        .map(|pair| parse_card(&pair.iter().collect::<String>()))
        .collect()
}

/// Render a pile in the same concatenated form `parse_pile` reads.
pub fn format_pile<'a, I>(cards: I) -> String
where
    I: IntoIterator<Item = &'a Card>,
{
    cards.into_iter().map(ToString::to_string).collect()
}

/// Check that the piles hold every card exactly once.
pub fn check_full_deck<'a, I>(piles: I) -> Result<(), DealError>
where
    I: IntoIterator<Item = &'a [Card]>,
{
    let mut seen = [false; CARD_NUM];
    let mut count = 0usize;
    for pile in piles {
        for &card in pile {
            let slot = &mut seen[card.id() as usize];
            if *slot {
                return Err(DealError::DuplicateCard(card));
            }
            *slot = true;
            count += 1;
        }
    }
    if count != CARD_NUM {
        return Err(DealError::CardCount { found: count });
    }
    Ok(())
}
