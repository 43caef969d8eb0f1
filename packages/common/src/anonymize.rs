//! Blind presentation of a response group.
//!
//! Responses to one question are shuffled and then labeled by their shuffled
//! position. The label never depends on which model produced the text, and the
//! position-to-label mapping is never stored: every read shuffles again.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// A response with its position-derived display label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Anonymized<T> {
    /// Zero-based position after shuffling.
    pub position: usize,
    /// "Model A", "Model B", ... derived from `position` only.
    pub label: String,
    pub item: T,
}

/// Display label for a shuffled position.
///
/// Positions past `Z` continue spreadsheet-style: `AA`, `AB`, ...
pub fn display_label(position: usize) -> String {
    let mut letters = Vec::new();
    let mut n = position + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("Model {}", letters.into_iter().collect::<String>())
}

/// Shuffle `items` with `rng` and label each by its new position.
pub fn anonymize_with<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<Anonymized<T>> {
    items.shuffle(rng);
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| Anonymized {
            position,
            label: display_label(position),
            item,
        })
        .collect()
}

/// Shuffle with the thread-local RNG.
pub fn anonymize<T>(items: Vec<T>) -> Vec<Anonymized<T>> {
    anonymize_with(items, &mut rand::rng())
}
