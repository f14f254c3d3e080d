mod config;
use indexmap::IndexMap;
use log::{debug, info};

use std::{
    cmp::Reverse,
    collections::HashMap,
};

pub mod builder;
pub mod manual;

pub use crate::config::*;

// **** Private structures ****

// Invariant: all the preferences are in the opposite group, without duplicates.
#[derive(Eq, PartialEq, Debug, Clone)]
struct Participant {
    id: ParticipantId,
    preferences: Vec<ParticipantId>,
}

impl Participant {
    /// The 1-based rank of the other participant in this participant's list.
    fn rank_of(&self, other: &ParticipantId) -> Option<u32> {
        self.preferences
            .iter()
            .position(|p| p == other)
            .map(|idx| (idx + 1) as u32)
    }
}

// Invariant: `matched` and `rank_info` are either both set or both empty.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct MatchState {
    matched: Option<ParticipantId>,
    rank_info: Option<RankInfo>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct RegistryEntry {
    participant: Participant,
    state: MatchState,
}

/// All the participants of one run, in submission order.
#[derive(Debug, Clone)]
struct Registry {
    entries: IndexMap<ParticipantId, RegistryEntry>,
}

impl Registry {
    fn build(rows: &[ParticipantRow]) -> Registry {
        let mut entries: IndexMap<ParticipantId, RegistryEntry> = IndexMap::new();
        for row in rows.iter() {
            let id = row.participant_id();
            let opposite = row.group.opposite();
            if row.preferences.len() > MAX_PREFERENCES {
                debug!(
                    "Registry::build: {}: ignoring preferences beyond rank {}: {:?}",
                    id,
                    MAX_PREFERENCES,
                    &row.preferences[MAX_PREFERENCES..]
                );
            }
            let mut preferences: Vec<ParticipantId> = Vec::new();
            for number in row.preferences.iter().take(MAX_PREFERENCES).flatten() {
                let pref = ParticipantId::new(opposite, *number);
                if preferences.contains(&pref) {
                    debug!("Registry::build: {}: dropping duplicate {}", id, pref);
                } else {
                    preferences.push(pref);
                }
            }
            let entry = RegistryEntry {
                participant: Participant { id, preferences },
                state: MatchState::default(),
            };
            // An existing key keeps its position and gets the new content.
            if entries.insert(id, entry).is_some() {
                debug!("Registry::build: {} submitted twice, keeping the last row", id);
            }
        }
        Registry { entries }
    }

    fn is_matched(&self, id: &ParticipantId) -> bool {
        self.entries
            .get(id)
            .map(|e| e.state.matched.is_some())
            .unwrap_or(false)
    }

    /// The unmatched participants of the other group who list the target,
    /// with the rank they gave to the target.
    fn suitors_of(&self, target: &ParticipantId) -> HashMap<ParticipantId, u32> {
        self.entries
            .values()
            .filter(|e| e.participant.id.group != target.group && e.state.matched.is_none())
            .filter_map(|e| {
                e.participant
                    .rank_of(target)
                    .map(|rank| (e.participant.id, rank))
            })
            .collect()
    }

    /// Pairs the target and the suitor of the rank info. Both are updated together.
    fn commit(&mut self, rank_info: RankInfo) {
        assert!(
            !self.is_matched(&rank_info.target) && !self.is_matched(&rank_info.suitor),
            "Registry::commit: participant already matched: {:?}",
            rank_info
        );
        for (me, partner) in [
            (rank_info.target, rank_info.suitor),
            (rank_info.suitor, rank_info.target),
        ] {
            if let Some(e) = self.entries.get_mut(&me) {
                e.state = MatchState {
                    matched: Some(partner),
                    rank_info: Some(rank_info),
                };
            }
        }
    }
}

/// Runs the matching for the given participant rows.
///
/// Arguments:
/// * `rows` the rows submitted by the participants, in submission order. If
/// a participant appears several times, the last row is used.
/// * `rules` the rules for ordering participants of equal popularity.
///
/// The matching does not fail: a participant that cannot be paired is
/// simply reported as unmatched.
pub fn run_matching(rows: &[ParticipantRow], rules: &MatchRules) -> MatchingResult {
    info!("Processing {:?} rows, rules: {:?}", rows.len(), rules);

    let mut registry = Registry::build(rows);
    info!("Registered {:?} participants", registry.entries.len());
    for e in registry.entries.values() {
        debug!(
            "Participant: {} preferences: {:?}",
            e.participant.id, e.participant.preferences
        );
    }

    let popularity = compute_popularity(&registry);
    let processing_order = sort_by_popularity(&popularity, rules.tiebreak_mode);
    debug!("run_matching: processing order: {:?}", processing_order);

    let pairs = run_pairing(&mut registry, &processing_order);

    let rows = assemble_rows(&registry);
    let stats = compute_stats(&rows, pairs);
    info!("Matching done: {:?}", stats);
    MatchingResult {
        rows,
        processing_order,
        stats,
    }
}

/// Counts how many participants reference each registered participant.
///
/// The keys are in the order in which they were first referenced, scanning the
/// lists of group A then the lists of group B.
fn compute_popularity(registry: &Registry) -> IndexMap<ParticipantId, u32> {
    let mut popularity: IndexMap<ParticipantId, u32> = IndexMap::new();
    for group in [Group::A, Group::B] {
        for e in registry
            .entries
            .values()
            .filter(|e| e.participant.id.group == group)
        {
            for pref in e.participant.preferences.iter() {
                if registry.entries.contains_key(pref) {
                    *popularity.entry(*pref).or_insert(0) += 1;
                } else {
                    debug!(
                        "compute_popularity: {} references unknown participant {}",
                        e.participant.id, pref
                    );
                }
            }
        }
    }
    popularity
}

fn sort_by_popularity(
    popularity: &IndexMap<ParticipantId, u32>,
    tiebreak: TieBreakMode,
) -> Vec<PopularityEntry> {
    let mut order: Vec<PopularityEntry> = popularity
        .iter()
        .map(|(pid, score)| PopularityEntry {
            participant: *pid,
            score: *score,
        })
        .collect();
    match tiebreak {
        // The sort is stable: ties stay in first reference order.
        TieBreakMode::FirstReference => order.sort_by_key(|pe| Reverse(pe.score)),
        TieBreakMode::ParticipantOrder => order.sort_by_key(|pe| (Reverse(pe.score), pe.participant)),
        TieBreakMode::Random(seed) => order.sort_by_cached_key(|pe| {
            (
                Reverse(pe.score),
                participant_digest_crypto(&pe.participant, seed),
            )
        }),
    }
    order
}

/// A "random" sort key for a participant. Random in this context means hard
/// to guess in advance, while staying reproducible for a given seed.
fn participant_digest_crypto(participant: &ParticipantId, seed: u32) -> String {
    let data = format!("{:08}{}", seed, participant);
    sha256::digest(data.as_str())
}

/// Resolves the targets in order and returns the number of committed pairs.
fn run_pairing(registry: &mut Registry, processing_order: &[PopularityEntry]) -> u32 {
    let mut pairs: u32 = 0;
    for pe in processing_order.iter() {
        let target = pe.participant;
        let target_prefs: Vec<ParticipantId> = match registry.entries.get(&target) {
            None => continue,
            Some(e) if e.state.matched.is_some() => {
                debug!("run_pairing: {} already matched, skipping", target);
                continue;
            }
            Some(e) if e.participant.preferences.is_empty() => {
                debug!("run_pairing: {} has no preferences, skipping", target);
                continue;
            }
            Some(e) => e.participant.preferences.clone(),
        };

        let suitors = registry.suitors_of(&target);
        debug!(
            "run_pairing: target {} (popularity {}): suitors: {:?}",
            target, pe.score, suitors
        );

        // The first preferred participant that also wants the target.
        let choice = target_prefs
            .iter()
            .enumerate()
            .find_map(|(idx, pref)| suitors.get(pref).map(|rank| (idx, *pref, *rank)));

        match choice {
            Some((idx, suitor, suitor_rank)) => {
                let rank_info = RankInfo {
                    target,
                    target_rank: (idx + 1) as u32,
                    suitor,
                    suitor_rank,
                };
                debug!("run_pairing: pairing {} and {}: {}", target, suitor, rank_info);
                registry.commit(rank_info);
                pairs += 1;
            }
            None => {
                debug!("run_pairing: no mutual interest found for {}", target);
            }
        }
    }
    pairs
}

fn assemble_rows(registry: &Registry) -> Vec<MatchRow> {
    let mut rows: Vec<MatchRow> = registry
        .entries
        .values()
        .map(|e| MatchRow {
            participant: e.participant.id,
            partner: e.state.matched,
            rank_info: e.state.rank_info,
            tier: QualityTier::of(e.state.rank_info.as_ref()),
        })
        .collect();
    rows.sort_by_key(|r| r.participant);
    rows
}

fn compute_stats(rows: &[MatchRow], pairs: u32) -> MatchStats {
    let mut stats = MatchStats {
        participants: rows.len() as u32,
        pairs,
        ..MatchStats::default()
    };
    for r in rows.iter() {
        match r.tier {
            QualityTier::Unmatched => stats.unmatched += 1,
            QualityTier::MutualTopChoice => stats.mutual_top_choice += 1,
            QualityTier::PartialPreference => stats.partial_preference += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn a(number: u32) -> ParticipantId {
        ParticipantId::new(Group::A, number)
    }

    fn b(number: u32) -> ParticipantId {
        ParticipantId::new(Group::B, number)
    }

    fn row(group: Group, id: u32, prefs: &[u32]) -> ParticipantRow {
        ParticipantRow {
            group,
            id,
            preferences: prefs.iter().map(|x| Some(*x)).collect(),
        }
    }

    fn find(res: &MatchingResult, pid: ParticipantId) -> &MatchRow {
        res.rows.iter().find(|r| r.participant == pid).unwrap()
    }

    fn check_invariants(res: &MatchingResult) {
        for r in res.rows.iter() {
            match r.partner {
                Some(p) => {
                    assert_ne!(p.group, r.participant.group);
                    assert_eq!(find(res, p).partner, Some(r.participant));
                    assert!(r.rank_info.is_some());
                    assert!(!r.rank_label().is_empty());
                    assert_ne!(r.tier, QualityTier::Unmatched);
                }
                None => {
                    assert_eq!(r.rank_info, None);
                    assert_eq!(r.rank_label(), "");
                    assert_eq!(r.tier, QualityTier::Unmatched);
                }
            }
            assert_eq!(QualityTier::from_rank_text(&r.rank_label()), r.tier);
        }
    }

    // The form from the example event: 4 participants per group.
    fn event_rows() -> Vec<ParticipantRow> {
        vec![
            row(Group::A, 1, &[1, 3]),
            row(Group::A, 2, &[1]),
            row(Group::A, 3, &[2, 3, 1]),
            row(Group::A, 4, &[1]),
            row(Group::B, 1, &[2, 1]),
            row(Group::B, 2, &[3]),
            row(Group::B, 3, &[1]),
            row(Group::B, 4, &[]),
        ]
    }

    #[test]
    fn mutual_first_choice() {
        init();
        let res = run_matching(
            &[row(Group::A, 1, &[1]), row(Group::B, 1, &[1])],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        let r = find(&res, a(1));
        assert_eq!(r.partner, Some(b(1)));
        assert_eq!(r.tier, QualityTier::MutualTopChoice);
        assert_eq!(r.rank_label(), "(B1's rank 1, A1's rank 1)");
        assert_eq!(find(&res, b(1)).rank_label(), r.rank_label());
    }

    #[test]
    fn partial_preference() {
        init();
        let res = run_matching(
            &[
                row(Group::A, 1, &[1, 2]),
                row(Group::B, 1, &[2]),
                row(Group::B, 2, &[1]),
            ],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        let r = find(&res, a(1));
        assert_eq!(r.partner, Some(b(2)));
        assert_eq!(
            r.rank_info,
            Some(RankInfo {
                target: b(2),
                target_rank: 1,
                suitor: a(1),
                suitor_rank: 2
            })
        );
        assert_eq!(r.tier, QualityTier::PartialPreference);
        assert_eq!(find(&res, b(1)).tier, QualityTier::Unmatched);
        assert_eq!(find(&res, b(1)).partner_label(), UNMATCHED_LABEL);
    }

    #[test]
    fn unknown_reference_is_inert() {
        init();
        let res = run_matching(
            &[row(Group::A, 1, &[1]), row(Group::B, 1, &[2])],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        assert_eq!(find(&res, a(1)).tier, QualityTier::Unmatched);
        assert_eq!(find(&res, b(1)).tier, QualityTier::Unmatched);
        // A2 is not registered and does not get a score.
        assert_eq!(
            res.processing_order,
            vec![PopularityEntry {
                participant: b(1),
                score: 1
            }]
        );
    }

    #[test]
    fn target_already_taken() {
        init();
        // B1 is the most popular and takes A2 first. A1 wanted B1 only.
        let res = run_matching(
            &[
                row(Group::A, 1, &[1]),
                row(Group::A, 2, &[1]),
                row(Group::B, 1, &[2]),
            ],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        assert_eq!(find(&res, b(1)).partner, Some(a(2)));
        assert_eq!(find(&res, a(1)).tier, QualityTier::Unmatched);
    }

    #[test]
    fn matched_as_suitor_before_being_a_target() {
        init();
        let res = run_matching(
            &[row(Group::A, 1, &[1]), row(Group::B, 1, &[])],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        // B1 has no preference: it is considered but never resolved.
        assert_eq!(res.stats.pairs, 0);

        let res = run_matching(
            &[
                row(Group::A, 1, &[1]),
                row(Group::B, 1, &[2, 1]),
                row(Group::A, 2, &[]),
            ],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        // A1 comes after B1, which picks it from its own list.
        let order: Vec<ParticipantId> =
            res.processing_order.iter().map(|pe| pe.participant).collect();
        assert_eq!(order, vec![b(1), a(2), a(1)]);
        assert_eq!(find(&res, a(1)).partner, Some(b(1)));
        assert_eq!(find(&res, a(1)).rank_info.map(|ri| ri.target), Some(b(1)));
        assert_eq!(find(&res, a(1)).rank_label(), "(B1's rank 2, A1's rank 1)");
        // A2 is a target with an empty list: skipped, and nobody can pair with it.
        assert!(res.processing_order.iter().any(|pe| pe.participant == a(2)));
        assert_eq!(find(&res, a(2)).tier, QualityTier::Unmatched);
    }

    #[test]
    fn event_example() {
        init();
        let res = run_matching(&event_rows(), &MatchRules::DEFAULT_RULES);
        check_invariants(&res);
        let order: Vec<(ParticipantId, u32)> = res
            .processing_order
            .iter()
            .map(|pe| (pe.participant, pe.score))
            .collect();
        assert_eq!(
            order,
            vec![(b(1), 4), (b(3), 2), (a(1), 2), (b(2), 1), (a(2), 1), (a(3), 1)]
        );
        let partners: Vec<(String, String)> = res
            .rows
            .iter()
            .map(|r| (r.participant.to_string(), r.partner_label()))
            .collect();
        let expected: Vec<(String, String)> = [
            ("A1", "B3"),
            ("A2", "B1"),
            ("A3", "B2"),
            ("A4", "unmatched"),
            ("B1", "A2"),
            ("B2", "A3"),
            ("B3", "A1"),
            ("B4", "unmatched"),
        ]
        .iter()
        .map(|(x, y)| (x.to_string(), y.to_string()))
        .collect();
        assert_eq!(partners, expected);
        assert_eq!(find(&res, a(1)).rank_label(), "(B3's rank 1, A1's rank 2)");
        assert_eq!(
            res.stats,
            MatchStats {
                participants: 8,
                pairs: 3,
                mutual_top_choice: 4,
                partial_preference: 2,
                unmatched: 2,
            }
        );
    }

    #[test]
    fn popularity_is_decreasing() {
        init();
        for rules in [
            MatchRules::DEFAULT_RULES,
            MatchRules {
                tiebreak_mode: TieBreakMode::ParticipantOrder,
            },
            MatchRules {
                tiebreak_mode: TieBreakMode::Random(42),
            },
        ] {
            let res = run_matching(&event_rows(), &rules);
            check_invariants(&res);
            assert!(res
                .processing_order
                .windows(2)
                .all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn tiebreak_participant_order() {
        init();
        let res = run_matching(
            &event_rows(),
            &MatchRules {
                tiebreak_mode: TieBreakMode::ParticipantOrder,
            },
        );
        let order: Vec<ParticipantId> =
            res.processing_order.iter().map(|pe| pe.participant).collect();
        assert_eq!(order, vec![b(1), a(1), b(3), a(2), a(3), b(2)]);
        // A1 is now resolved before B3 and still ends with B3.
        assert_eq!(find(&res, a(1)).rank_label(), "(A1's rank 2, B3's rank 1)");
        assert_eq!(find(&res, a(1)).tier, QualityTier::PartialPreference);
    }

    #[test]
    fn tiebreak_random_is_reproducible() {
        init();
        let rules = MatchRules {
            tiebreak_mode: TieBreakMode::Random(7),
        };
        let res1 = run_matching(&event_rows(), &rules);
        let res2 = run_matching(&event_rows(), &rules);
        assert_eq!(res1, res2);
        assert_eq!(res1.processing_order[0].participant, b(1));
    }

    #[test]
    fn last_row_wins() {
        init();
        let res = run_matching(
            &[
                row(Group::A, 1, &[2]),
                row(Group::B, 1, &[1]),
                row(Group::B, 2, &[1]),
                row(Group::A, 1, &[1]),
            ],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        assert_eq!(res.stats.participants, 3);
        assert_eq!(find(&res, a(1)).partner, Some(b(1)));
        assert_eq!(find(&res, b(2)).tier, QualityTier::Unmatched);
    }

    #[test]
    fn blanks_duplicates_and_extra_ranks() {
        init();
        let res = run_matching(
            &[
                ParticipantRow {
                    group: Group::A,
                    id: 1,
                    preferences: vec![None, Some(2), Some(2), Some(1)],
                },
                row(Group::B, 1, &[1]),
                row(Group::B, 2, &[5]),
            ],
            &MatchRules::DEFAULT_RULES,
        );
        check_invariants(&res);
        // B1 sits at the fourth position and is not read. B2 is only counted once.
        assert_eq!(
            res.processing_order,
            vec![
                PopularityEntry {
                    participant: b(2),
                    score: 1
                },
                PopularityEntry {
                    participant: a(1),
                    score: 1
                },
            ]
        );
        assert_eq!(res.stats.pairs, 0);
    }

    #[test]
    fn empty_input() {
        init();
        let res = run_matching(&[], &MatchRules::DEFAULT_RULES);
        assert!(res.rows.is_empty());
        assert!(res.processing_order.is_empty());
        assert_eq!(res.stats, MatchStats::default());
    }

    #[test]
    fn tier_from_text() {
        assert_eq!(QualityTier::from_rank_text(""), QualityTier::Unmatched);
        assert_eq!(
            QualityTier::from_rank_text("(B1's rank 1, A1's rank 1)"),
            QualityTier::MutualTopChoice
        );
        assert_eq!(
            QualityTier::from_rank_text("(B1's rank 1, A1's rank 3)"),
            QualityTier::PartialPreference
        );
        let text = "(B1's rank 2, A1's rank 1)";
        assert_eq!(
            QualityTier::from_rank_text(text),
            QualityTier::from_rank_text(text)
        );
    }
}
