//! Pure scoring rules for the three mini-games.
//!
//! Every function here works on answer rows re-read from the store, never on
//! a client's local submissions, so the computed result reflects each
//! player's write regardless of arrival order.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{AlignmentAnswerEntity, PhraseGuessEntity, QuizAnswerEntity, TeamEntity};

/// Number of answer options every prompt offers.
pub const OPTION_COUNT: usize = 4;

/// Minimum share of a team's respondents on the modal answer to score.
pub const ALIGNMENT_THRESHOLD_PCT: u32 = 50;

/// Trivia: each team earns one point per correct answer from its members
/// this round. Answers without a team (unassigned players) are skipped.
pub fn quiz_round_points(answers: &[QuizAnswerEntity]) -> IndexMap<Uuid, i32> {
    let mut points = IndexMap::new();
    for answer in answers {
        if !answer.is_correct {
            continue;
        }
        let Some(team_id) = answer.team_id else {
            continue;
        };
        *points.entry(team_id).or_insert(0) += 1;
    }
    points
}

/// Phrase: exactly one team scores per round, the team of whichever guess
/// matched first (guesses arrive in submission order). `None` when every
/// clue was exhausted without a correct guess.
pub fn phrase_round_winner(guesses: &[PhraseGuessEntity]) -> Option<Uuid> {
    guesses
        .iter()
        .find(|guess| guess.is_correct)
        .and_then(|guess| guess.team_id)
}

/// Per-team outcome of an alignment round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentOutcome {
    /// Votes per option index.
    pub counts: Vec<u32>,
    /// Share of respondents on the modal answer, floored to whole percent.
    pub alignment_pct: u32,
    /// 1 when the share reaches the threshold, else 0.
    pub points: i32,
}

/// Alignment: a team scores when at least half of its respondents picked the
/// same option. The modal answer is found by a left-to-right max scan, so
/// ties resolve to the lowest option index.
pub fn alignment_round_outcomes(
    answers: &[AlignmentAnswerEntity],
) -> IndexMap<Uuid, AlignmentOutcome> {
    let mut per_team: IndexMap<Uuid, Vec<u32>> = IndexMap::new();
    for answer in answers {
        let Some(team_id) = answer.team_id else {
            continue;
        };
        per_team
            .entry(team_id)
            .or_default()
            .push(answer.selected_answer);
    }

    per_team
        .into_iter()
        .map(|(team_id, votes)| {
            let mut counts = vec![0u32; OPTION_COUNT];
            for vote in &votes {
                if let Some(slot) = counts.get_mut(*vote as usize) {
                    *slot += 1;
                }
            }
            let majority = majority_count(&counts);
            let total = votes.len() as u32;
            let alignment_pct = if total == 0 { 0 } else { majority * 100 / total };
            let points = i32::from(alignment_pct >= ALIGNMENT_THRESHOLD_PCT);
            (
                team_id,
                AlignmentOutcome {
                    counts,
                    alignment_pct,
                    points,
                },
            )
        })
        .collect()
}

/// Index of the modal answer; ties go to the lowest index.
pub fn majority_index(counts: &[u32]) -> usize {
    let mut best = 0;
    for (index, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = index;
        }
    }
    best
}

fn majority_count(counts: &[u32]) -> u32 {
    counts.get(majority_index(counts)).copied().unwrap_or(0)
}

/// The team currently leading; first creation wins exact ties so the result
/// is stable across re-reads.
pub fn leader(teams: &[TeamEntity]) -> Option<&TeamEntity> {
    let mut best: Option<&TeamEntity> = None;
    for team in teams {
        if best.map(|leader| team.score > leader.score).unwrap_or(true) {
            best = Some(team);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn quiz_answer(team: Option<Uuid>, correct: bool) -> QuizAnswerEntity {
        QuizAnswerEntity {
            room_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            team_id: team,
            round_number: 0,
            question_index: 0,
            selected_answer: 0,
            is_correct: correct,
            answered_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn alignment_answer(team: Uuid, selected: u32) -> AlignmentAnswerEntity {
        AlignmentAnswerEntity {
            room_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            team_id: Some(team),
            round_number: 0,
            question_index: 0,
            selected_answer: selected,
            locked_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn quiz_counts_correct_answers_per_team() {
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();
        // Team A: 2 of 3 correct. Team B: 0 of 3.
        let answers = vec![
            quiz_answer(Some(team_a), true),
            quiz_answer(Some(team_a), true),
            quiz_answer(Some(team_a), false),
            quiz_answer(Some(team_b), false),
            quiz_answer(Some(team_b), false),
            quiz_answer(Some(team_b), false),
        ];

        let points = quiz_round_points(&answers);
        assert_eq!(points.get(&team_a), Some(&2));
        assert_eq!(points.get(&team_b), None);
    }

    #[test]
    fn quiz_skips_unassigned_players() {
        let answers = vec![quiz_answer(None, true)];
        assert!(quiz_round_points(&answers).is_empty());
    }

    #[test]
    fn majority_tie_breaks_to_lowest_index() {
        assert_eq!(majority_index(&[2, 2, 1, 1]), 0);
        assert_eq!(majority_index(&[1, 3, 3, 0]), 1);
        assert_eq!(majority_index(&[0, 0, 0, 0]), 0);
    }

    #[test]
    fn alignment_scores_majorities_of_at_least_half() {
        let team = Uuid::new_v4();
        // [0, 0, 0, 1]: majority index 0 at 3/4 = 75%.
        let answers = vec![
            alignment_answer(team, 0),
            alignment_answer(team, 0),
            alignment_answer(team, 0),
            alignment_answer(team, 1),
        ];

        let outcomes = alignment_round_outcomes(&answers);
        let outcome = outcomes.get(&team).unwrap();
        assert_eq!(outcome.counts, vec![3, 1, 0, 0]);
        assert_eq!(outcome.alignment_pct, 75);
        assert_eq!(outcome.points, 1);
    }

    #[test]
    fn alignment_below_half_earns_nothing() {
        let team = Uuid::new_v4();
        // Perfect split across 4 options: 25% each.
        let answers = vec![
            alignment_answer(team, 0),
            alignment_answer(team, 1),
            alignment_answer(team, 2),
            alignment_answer(team, 3),
        ];

        let outcomes = alignment_round_outcomes(&answers);
        assert_eq!(outcomes.get(&team).unwrap().points, 0);
    }

    #[test]
    fn alignment_exact_half_scores() {
        let team = Uuid::new_v4();
        let answers = vec![
            alignment_answer(team, 2),
            alignment_answer(team, 2),
            alignment_answer(team, 0),
            alignment_answer(team, 1),
        ];

        let outcome = alignment_round_outcomes(&answers);
        let outcome = outcome.get(&team).unwrap();
        assert_eq!(outcome.alignment_pct, 50);
        assert_eq!(outcome.points, 1);
    }

    #[test]
    fn phrase_winner_is_first_correct_guess() {
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();
        let guess = |team: Uuid, correct: bool| PhraseGuessEntity {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            team_id: Some(team),
            round_number: 0,
            guess: "SOMETHING".into(),
            is_correct: correct,
            guessed_at: SystemTime::UNIX_EPOCH,
        };

        let guesses = vec![
            guess(team_a, false),
            guess(team_b, true),
            guess(team_a, true),
        ];
        assert_eq!(phrase_round_winner(&guesses), Some(team_b));
        assert_eq!(phrase_round_winner(&guesses[..1]), None);
    }
}
