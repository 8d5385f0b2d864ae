//! Requirement matching.
//!
//! `Subset` checks each requirement independently. `Exact` needs a
//! distinct owned collectible per requirement, which is a bipartite
//! matching between requirements and collectibles; it is solved with
//! augmenting paths (Kuhn's algorithm). Recipes are a handful of slots, so
//! the quadratic bound does not matter.
//!
//! Inputs are sorted by collectible id, so the result depends only on what
//! is owned and never on pickup order.

use super::definition::{MatchPolicy, Requirement, SynergyDefinition};
use crate::runes::CollectibleDefinition;

/// How far a loadout is from satisfying a synergy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: usize,
    pub required: usize,
    /// Requirements left open by the best assignment, in recipe order.
    pub missing: Vec<Requirement>,
}

impl MatchResult {
    #[must_use]
    pub fn satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Match a synergy against the owned collectibles (one entry per distinct
/// collectible, sorted by id).
#[must_use]
pub fn match_synergy(synergy: &SynergyDefinition, owned: &[&CollectibleDefinition]) -> MatchResult {
    let requirements = &synergy.requirements;
    let open: Vec<bool> = match synergy.policy {
        MatchPolicy::Subset => requirements
            .iter()
            .map(|r| !owned.iter().any(|c| r.matches(c)))
            .collect(),
        MatchPolicy::Exact => {
            let assignment = exact_assignment(requirements, owned);
            assignment.iter().map(Option::is_none).collect()
        }
    };

    let missing: Vec<Requirement> = requirements
        .iter()
        .zip(&open)
        .filter(|(_, open)| **open)
        .map(|(r, _)| r.clone())
        .collect();

    MatchResult {
        matched: requirements.len() - missing.len(),
        required: requirements.len(),
        missing,
    }
}

/// Requirement index -> owned index for a maximum matching.
fn exact_assignment(requirements: &[Requirement], owned: &[&CollectibleDefinition]) -> Vec<Option<usize>> {
    let mut holder: Vec<Option<usize>> = vec![None; owned.len()];

    for requirement in 0..requirements.len() {
        let mut visited = vec![false; owned.len()];
        augment(requirement, requirements, owned, &mut visited, &mut holder);
    }

    let mut assignment = vec![None; requirements.len()];
    for (collectible, requirement) in holder.iter().enumerate() {
        if let Some(requirement) = requirement {
            assignment[*requirement] = Some(collectible);
        }
    }
    assignment
}

fn augment(
    requirement: usize,
    requirements: &[Requirement],
    owned: &[&CollectibleDefinition],
    visited: &mut [bool],
    holder: &mut [Option<usize>],
) -> bool {
    for (index, collectible) in owned.iter().enumerate() {
        if visited[index] || !requirements[requirement].matches(collectible) {
            continue;
        }
        visited[index] = true;

        let free = match holder[index] {
            None => true,
            Some(other) => augment(other, requirements, owned, visited, holder),
        };
        if free {
            holder[index] = Some(requirement);
            return true;
        }
    }
    false
}
