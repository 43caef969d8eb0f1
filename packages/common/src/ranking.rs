use std::collections::BTreeMap;

use thiserror::Error;

/// Outcome of a rank selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankChange {
    /// The response now holds this rank (new or changed).
    Set(i32),
    /// The response no longer holds a rank.
    Cleared,
    /// The response already held this rank.
    Unchanged(i32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("Response {0} is not part of this group")]
    UnknownResponse(i32),

    #[error("Rank must be between 1 and {max}")]
    InvalidRank { max: i32 },

    #[error("Rank {rank} is already assigned to another response")]
    RankTaken { rank: i32, holder: i32 },
}

/// One user's ranks over one group of sibling responses.
///
/// A rank is held by at most one response at a time; 1 is best.
#[derive(Clone, Debug, Default)]
pub struct RankingBoard {
    responses: Vec<i32>,
    ranks: BTreeMap<i32, i32>,
}

impl RankingBoard {
    pub fn new(responses: impl IntoIterator<Item = i32>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            ranks: BTreeMap::new(),
        }
    }

    /// Build a board from stored `(response_id, rank)` pairs.
    ///
    /// Pairs for responses outside the group are ignored.
    pub fn with_ranks(
        responses: impl IntoIterator<Item = i32>,
        stored: impl IntoIterator<Item = (i32, i32)>,
    ) -> Self {
        let mut board = Self::new(responses);
        for (response_id, rank) in stored {
            if board.contains(response_id) {
                board.ranks.insert(response_id, rank);
            }
        }
        board
    }

    pub fn contains(&self, response_id: i32) -> bool {
        self.responses.contains(&response_id)
    }

    pub fn rank_of(&self, response_id: i32) -> Option<i32> {
        self.ranks.get(&response_id).copied()
    }

    /// Response currently holding `rank`, if any.
    pub fn holder_of(&self, rank: i32) -> Option<i32> {
        self.ranks
            .iter()
            .find(|&(_, &r)| r == rank)
            .map(|(&id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// True when every response in the group holds a rank.
    pub fn is_complete(&self) -> bool {
        self.responses.iter().all(|id| self.ranks.contains_key(id))
    }

    fn check(&self, response_id: i32, rank: i32) -> Result<(), RankError> {
        if !self.contains(response_id) {
            return Err(RankError::UnknownResponse(response_id));
        }
        let max = self.responses.len() as i32;
        if rank < 1 || rank > max {
            return Err(RankError::InvalidRank { max });
        }
        if let Some(holder) = self.holder_of(rank)
            && holder != response_id
        {
            return Err(RankError::RankTaken { rank, holder });
        }
        Ok(())
    }

    /// Select `rank` for a response with toggle semantics.
    ///
    /// Re-selecting the rank the response already holds clears it. A rank held
    /// by a sibling is rejected and the board is left untouched.
    pub fn select(&mut self, response_id: i32, rank: i32) -> Result<RankChange, RankError> {
        self.check(response_id, rank)?;
        if self.rank_of(response_id) == Some(rank) {
            self.ranks.remove(&response_id);
            return Ok(RankChange::Cleared);
        }
        self.ranks.insert(response_id, rank);
        Ok(RankChange::Set(rank))
    }

    /// Assign `rank` to a response, overwriting any previous rank.
    pub fn assign(&mut self, response_id: i32, rank: i32) -> Result<RankChange, RankError> {
        self.check(response_id, rank)?;
        match self.ranks.insert(response_id, rank) {
            Some(previous) if previous == rank => Ok(RankChange::Unchanged(rank)),
            _ => Ok(RankChange::Set(rank)),
        }
    }

    /// Remove the rank of a response. Returns the rank it held.
    pub fn clear(&mut self, response_id: i32) -> Result<Option<i32>, RankError> {
        if !self.contains(response_id) {
            return Err(RankError::UnknownResponse(response_id));
        }
        Ok(self.ranks.remove(&response_id))
    }
}
