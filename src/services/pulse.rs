//! Group-pulse warm-up engine: a short fixed questionnaire everyone answers
//! before the main game. Results are per-question answer distributions;
//! no team ever scores here.

use uuid::Uuid;

use crate::{
    content,
    dao::models::PulseResponseEntity,
    dao::room_store::{NewPulseResponse, RoomStore},
    error::ServiceError,
    services::quiz::require_room_player,
    state::SharedState,
};

/// Distribution of answers for one warm-up question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseQuestionResult {
    /// Which question.
    pub question_index: u32,
    /// The question text.
    pub question: String,
    /// Votes per option index.
    pub counts: Vec<u32>,
    /// Total respondents for this question.
    pub total: u32,
}

/// Record a player's warm-up vote; answering again replaces the earlier one.
pub async fn submit_response(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
    question_index: u32,
    answer_index: u32,
) -> Result<(), ServiceError> {
    let questions = content::pulse_questions();
    let question = questions
        .get(question_index as usize)
        .ok_or_else(|| ServiceError::InvalidInput(format!("no question {question_index}")))?;
    if answer_index as usize >= question.options.len() {
        return Err(ServiceError::InvalidInput(format!(
            "option {answer_index} is out of range"
        )));
    }

    require_room_player(state, room_id, player_id).await?;

    state
        .store()
        .upsert_pulse_response(NewPulseResponse {
            room_id,
            player_id,
            question_index,
            answer_index,
        })
        .await?;
    Ok(())
}

/// Aggregate every vote in the room into per-question distributions.
pub async fn results(
    state: &SharedState,
    room_id: Uuid,
) -> Result<Vec<PulseQuestionResult>, ServiceError> {
    let responses = state.store().list_pulse_responses(room_id).await?;
    Ok(aggregate(&responses))
}

fn aggregate(responses: &[PulseResponseEntity]) -> Vec<PulseQuestionResult> {
    content::pulse_questions()
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let mut counts = vec![0u32; question.options.len()];
            let mut total = 0;
            for response in responses {
                if response.question_index as usize != index {
                    continue;
                }
                if let Some(slot) = counts.get_mut(response.answer_index as usize) {
                    *slot += 1;
                    total += 1;
                }
            }
            PulseQuestionResult {
                question_index: index as u32,
                question: question.question.clone(),
                counts,
                total,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn response(question_index: u32, answer_index: u32) -> PulseResponseEntity {
        PulseResponseEntity {
            room_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            question_index,
            answer_index,
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn aggregate_counts_per_question() {
        let responses = vec![
            response(0, 1),
            response(0, 1),
            response(0, 3),
            response(1, 0),
        ];

        let results = aggregate(&responses);
        assert_eq!(results.len(), content::pulse_questions().len());
        assert_eq!(results[0].counts, vec![0, 2, 0, 1]);
        assert_eq!(results[0].total, 3);
        assert_eq!(results[1].counts, vec![1, 0, 0, 0]);
        assert_eq!(results[2].total, 0);
    }
}
