//! Content packs: the denormalized question/phrase/prompt data snapshotted
//! onto a room at creation time.
//!
//! Packs are plain serializable data. Rounds draw from them deterministically
//! by `round_number % len`, so content cycles instead of exhausting.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A multiple-choice trivia question with exactly one correct option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct QuizQuestion {
    /// Prompt shown to every player.
    pub question: String,
    /// Answer options, indexed from 0.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
}

/// A phrase to guess plus the ordered clues revealed one at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SecretPhrase {
    /// The phrase itself; guesses are compared case-insensitively.
    pub phrase: String,
    /// Clues handed to rotating recipients, in reveal order.
    pub clues: Vec<String>,
}

/// An opinion prompt with no correct answer; teams score on agreement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AlignmentPrompt {
    /// Prompt shown to every player.
    pub question: String,
    /// Answer options, indexed from 0.
    pub options: Vec<String>,
}

/// Full content snapshot attached to a room when it is created.
///
/// The pack is stored denormalized on the room row and replaced wholesale on
/// config updates, never merged field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ContentPack {
    /// Display name of the pack.
    pub name: String,
    /// Questions for trivia rounds.
    #[serde(default)]
    pub quiz_questions: Vec<QuizQuestion>,
    /// Phrases for clue-rotation rounds.
    #[serde(default)]
    pub phrases: Vec<SecretPhrase>,
    /// Prompts for alignment rounds.
    #[serde(default)]
    pub alignment_prompts: Vec<AlignmentPrompt>,
}

impl ContentPack {
    /// Question for the given round, cycling through the pack.
    pub fn quiz_question(&self, round: u32) -> Option<&QuizQuestion> {
        cycle(&self.quiz_questions, round)
    }

    /// Phrase for the given round, cycling through the pack.
    pub fn phrase(&self, round: u32) -> Option<&SecretPhrase> {
        cycle(&self.phrases, round)
    }

    /// Alignment prompt for the given round, cycling through the pack.
    pub fn alignment_prompt(&self, round: u32) -> Option<&AlignmentPrompt> {
        cycle(&self.alignment_prompts, round)
    }
}

fn cycle<T>(items: &[T], round: u32) -> Option<&T> {
    if items.is_empty() {
        return None;
    }
    items.get(round as usize % items.len())
}

/// Warm-up questions asked during the group-pulse phase. These are fixed
/// rather than pack-specific: the pulse measures the group, not the topic.
pub fn pulse_questions() -> Vec<AlignmentPrompt> {
    vec![
        AlignmentPrompt {
            question: "How well do you know each other?".into(),
            options: string_options(&["Just met", "Somewhat", "Pretty well", "Very well"]),
        },
        AlignmentPrompt {
            question: "How comfortable do you feel speaking up?".into(),
            options: string_options(&["Nervous", "Cautious", "Comfortable", "Confident"]),
        },
        AlignmentPrompt {
            question: "Are you more competitive or collaborative?".into(),
            options: string_options(&[
                "Very competitive",
                "Competitive",
                "Collaborative",
                "Very collaborative",
            ]),
        },
    ]
}

/// Fallback pack used when room creation supplies no content of its own.
pub fn default_pack() -> ContentPack {
    ContentPack {
        name: "General".into(),
        quiz_questions: vec![
            QuizQuestion {
                question: "What is the capital of France?".into(),
                options: string_options(&["London", "Paris", "Berlin", "Madrid"]),
                correct: 1,
            },
            QuizQuestion {
                question: "Which planet is closest to the Sun?".into(),
                options: string_options(&["Venus", "Mars", "Mercury", "Earth"]),
                correct: 2,
            },
            QuizQuestion {
                question: "Who wrote Romeo and Juliet?".into(),
                options: string_options(&["Dickens", "Shakespeare", "Austen", "Hemingway"]),
                correct: 1,
            },
            QuizQuestion {
                question: "Which ocean is the largest?".into(),
                options: string_options(&["Atlantic", "Indian", "Arctic", "Pacific"]),
                correct: 3,
            },
        ],
        phrases: vec![
            SecretPhrase {
                phrase: "PIZZA PARTY".into(),
                clues: string_options(&[
                    "Round food",
                    "Italian dish",
                    "Cheese topping",
                    "Group gathering",
                    "Birthday celebration",
                    "Pepperoni option",
                ]),
            },
            SecretPhrase {
                phrase: "COFFEE BREAK".into(),
                clues: string_options(&[
                    "Morning drink",
                    "Caffeine boost",
                    "Work pause",
                    "Brown beverage",
                    "Rest period",
                    "Espresso time",
                ]),
            },
        ],
        alignment_prompts: vec![
            AlignmentPrompt {
                question: "Best season?".into(),
                options: string_options(&["Spring", "Summer", "Fall", "Winter"]),
            },
            AlignmentPrompt {
                question: "Pizza or Tacos?".into(),
                options: string_options(&["Pizza", "Tacos", "Both!", "Neither"]),
            },
            AlignmentPrompt {
                question: "Morning or Night person?".into(),
                options: string_options(&["Morning", "Night", "Both", "Neither"]),
            },
            AlignmentPrompt {
                question: "Cats or Dogs?".into(),
                options: string_options(&["Cats", "Dogs", "Both", "Neither"]),
            },
        ],
    }
}

fn string_options(options: &[&str]) -> Vec<String> {
    options.iter().map(|option| (*option).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_cycles_instead_of_exhausting() {
        let pack = default_pack();
        let len = pack.quiz_questions.len() as u32;

        let first = pack.quiz_question(0).unwrap();
        let wrapped = pack.quiz_question(len).unwrap();
        assert_eq!(first, wrapped);

        let second = pack.quiz_question(1).unwrap();
        let wrapped = pack.quiz_question(len + 1).unwrap();
        assert_eq!(second, wrapped);
    }

    #[test]
    fn empty_sections_yield_no_content() {
        let pack = ContentPack {
            name: "empty".into(),
            quiz_questions: vec![],
            phrases: vec![],
            alignment_prompts: vec![],
        };
        assert!(pack.quiz_question(0).is_none());
        assert!(pack.phrase(3).is_none());
        assert!(pack.alignment_prompt(7).is_none());
    }
}
