//! Conflict resolution: one winning command per device per tick.
//!
//! Every candidate's branch actions are expanded into [`DeviceCommand`]s and
//! grouped by device. The command from the highest-priority rule wins; ties
//! go to the lowest [`RuleId`], and within one rule the last action for a
//! device wins. Every other command is reported as overridden.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::command::DeviceCommand;
use crate::id::RuleId;
use crate::rule::{Action, Branch};

/// A rule that matched and passed its cooldown in this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rule_id: RuleId,
    pub priority: u8,
    pub branch: Branch,
    pub actions: Vec<Action>,
}

/// The command a device will receive, and the rule it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub rule_id: RuleId,
    pub command: DeviceCommand,
}

/// A command that lost its device to another rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overridden {
    pub rule_id: RuleId,
    pub action: Action,
    pub winner: RuleId,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// One entry per device, ordered by device name.
    pub winners: Vec<Winner>,
    pub overridden: Vec<Overridden>,
}

impl Resolution {
    /// Winning commands issued on behalf of `rule_id`.
    pub fn winners_for(&self, rule_id: RuleId) -> impl Iterator<Item = &Winner> {
        self.winners.iter().filter(move |w| w.rule_id == rule_id)
    }

    /// Actions of `rule_id` that lost their device.
    pub fn overridden_for(&self, rule_id: RuleId) -> impl Iterator<Item = &Overridden> {
        self.overridden.iter().filter(move |o| o.rule_id == rule_id)
    }
}

struct Proposal<'a> {
    priority: u8,
    rule_id: RuleId,
    position: usize,
    action: &'a Action,
}

/// Reduce all candidates of one tick to one command per device.
///
/// The result depends only on the candidates' contents, never on their
/// order, so identical inputs always produce identical outputs.
#[must_use]
pub fn resolve(candidates: &[Candidate]) -> Resolution {
    let mut by_device: BTreeMap<&str, Vec<Proposal<'_>>> = BTreeMap::new();
    for candidate in candidates {
        for (position, action) in candidate.actions.iter().enumerate() {
            by_device
                .entry(action.device.as_str())
                .or_default()
                .push(Proposal {
                    priority: candidate.priority,
                    rule_id: candidate.rule_id,
                    position,
                    action,
                });
        }
    }

    let mut resolution = Resolution::default();
    for (_, mut proposals) in by_device {
        proposals.sort_by_key(|p| (Reverse(p.priority), p.rule_id, Reverse(p.position)));
        let mut proposals = proposals.into_iter();
        let Some(winner) = proposals.next() else {
            continue;
        };
        for loser in proposals {
            resolution.overridden.push(Overridden {
                rule_id: loser.rule_id,
                action: loser.action.clone(),
                winner: winner.rule_id,
            });
        }
        resolution.winners.push(Winner {
            rule_id: winner.rule_id,
            command: winner.action.to_command(),
        });
    }
    resolution
}
