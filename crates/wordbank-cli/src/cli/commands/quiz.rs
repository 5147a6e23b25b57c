//! Daily quiz command handler.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use wordbank_core::AppContext;
use wordbank_core::store::AnswerOutcome;

pub async fn run(ctx: &AppContext, answers: &[usize], cancel: &CancellationToken) -> Result<()> {
    ctx.fetch_daily_quiz(cancel)
        .await
        .context("load daily quiz")?;
    let questions = ctx.store().select(|s| s.game.daily_quiz.clone());
    if questions.is_empty() {
        println!("No quiz today");
        return Ok(());
    }

    if answers.is_empty() {
        for (n, question) in questions.iter().enumerate() {
            println!("{}. {} ({})", n + 1, question.prompt, question.word);
            for (i, option) in question.options.iter().enumerate() {
                println!("   [{i}] {option}");
            }
        }
        return Ok(());
    }

    for (question, &choice) in questions.iter().zip(answers) {
        let verdict = match ctx.answer_question(&question.id, choice) {
            AnswerOutcome::Correct => "correct".to_string(),
            AnswerOutcome::Incorrect { answer_index } => question
                .options
                .get(answer_index)
                .map_or_else(|| "incorrect".to_string(), |o| format!("incorrect, answer: {o}")),
            AnswerOutcome::InvalidChoice => format!("no option [{choice}]"),
            other => format!("{other:?}"),
        };
        println!("{}: {verdict}", question.word);
    }

    match ctx.finish_quiz() {
        Some(score) => println!("Score: {}/{}", score.correct, score.total),
        None => {
            if let Some(score) = ctx.store().select(|s| s.game.quiz.as_ref().map(|q| q.score())) {
                println!("Answered {} of {} questions", score.answered, score.total);
            }
        }
    }
    Ok(())
}
