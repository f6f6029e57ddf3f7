//! Round-robin team assignment.

use event_core::{Location, PlayerId};

/// Players placed on one team by an assignment run.
///
/// Rosters are frozen: later changes to the team directory do not move
/// anyone.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamRoster {
    pub team: String,
    pub location: Location,
    pub members: Vec<PlayerId>,
}

/// Deal `members` over `team_count` teams, starting at team `start` and
/// wrapping around. Team sizes differ by at most one.
///
/// Returns one bucket per team; empty if `team_count` is zero.
pub fn assign_round_robin<T>(
    team_count: usize,
    members: impl IntoIterator<Item = T>,
    start: usize,
) -> Vec<Vec<T>> {
    if team_count == 0 {
        return Vec::new();
    }

    let mut buckets: Vec<Vec<T>> = (0..team_count).map(|_| Vec::new()).collect();
    let mut team = start % team_count;
    for member in members {
        buckets[team].push(member);
        team = (team + 1) % team_count;
    }
    buckets
}
