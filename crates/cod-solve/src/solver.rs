//! The install-job resolver.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::pool::{Pool, Solvable};
use crate::{Alternative, Result, SolveError};

/// The set of solvables a successful resolution decided to install.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    pub steps: Vec<Solvable>,
}

impl Transaction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn satisfied(installed: &[Solvable], chosen: &[Solvable], cap: &str) -> Result<bool> {
    for solvable in installed.iter().chain(chosen) {
        if solvable.satisfies(cap)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The installed solvable (if any) clashing with a candidate: either both
/// claim one of the candidate's exclusive capabilities, or the candidate
/// obsoletes it.
fn find_conflict<'a>(
    installed: &'a [Solvable],
    chosen: &'a [Solvable],
    candidate: &Solvable,
) -> Result<Option<(&'a Solvable, String)>> {
    for other in installed.iter().chain(chosen) {
        for cap in &candidate.conflicts {
            if other.satisfies(cap)? {
                return Ok(Some((other, cap.clone())));
            }
        }
        for cap in &candidate.obsoletes {
            if other.satisfies(cap)? {
                return Ok(Some((other, cap.clone())));
            }
        }
    }
    Ok(None)
}

/// Pick the best provider within one package name: highest EVR, ties
/// broken by arch and repo name for determinism.
fn best_candidate<'a>(candidates: &[&'a Solvable]) -> Result<&'a Solvable> {
    let mut best = candidates[0];
    let mut best_evr = best.evr()?;
    for &candidate in &candidates[1..] {
        let evr = candidate.evr()?;
        let newer = evr > best_evr
            || (evr == best_evr
                && (candidate.id.arch.as_str(), candidate.repo.as_str())
                    < (best.id.arch.as_str(), best.repo.as_str()));
        if newer {
            best = candidate;
            best_evr = evr;
        }
    }
    Ok(best)
}

/// Resolve install jobs for `caps` against `installed`.
///
/// Every capability must end up provided by an installed or newly chosen
/// solvable; chosen solvables drag their own requirements into the same
/// transaction. Ambiguity between distinct package names is refused.
///
/// # Errors
/// `SolveError::Problems` collects every unsatisfiable or conflicting job;
/// `SolveError::Alternatives` lists ambiguous jobs when nothing else
/// failed.
pub fn solve(pool: &Pool, installed: &[Solvable], caps: &[String]) -> Result<Transaction> {
    let jobs: BTreeSet<&String> = caps.iter().collect();
    let mut queue: VecDeque<String> = jobs.into_iter().cloned().collect();

    let mut chosen: Vec<Solvable> = Vec::new();
    let mut problems: Vec<String> = Vec::new();
    let mut alternatives: Vec<Alternative> = Vec::new();

    while let Some(cap) = queue.pop_front() {
        if satisfied(installed, &chosen, &cap)? {
            continue;
        }

        let candidates = pool.whatprovides(&cap)?;
        if candidates.is_empty() {
            problems.push(format!("nothing provides {cap}"));
            continue;
        }

        let names: BTreeSet<&str> = candidates.iter().map(|s| s.id.name.as_str()).collect();
        if names.len() > 1 {
            let mut choices: Vec<String> =
                candidates.iter().map(|s| s.id.to_string()).collect();
            choices.sort();
            alternatives.push(Alternative {
                capability: cap,
                choices,
            });
            continue;
        }

        let best = best_candidate(&candidates)?;
        if let Some((other, clash)) = find_conflict(installed, &chosen, best)? {
            problems.push(format!(
                "{} conflicts with installed {} (both provide {clash})",
                best.id, other.id
            ));
            continue;
        }

        debug!(package = %best.id, capability = %cap, "selected provider");
        queue.extend(best.requires.iter().cloned());
        chosen.push(best.clone());
    }

    if !problems.is_empty() {
        return Err(SolveError::Problems(problems));
    }
    if !alternatives.is_empty() {
        return Err(SolveError::Alternatives(alternatives));
    }
    Ok(Transaction { steps: chosen })
}
