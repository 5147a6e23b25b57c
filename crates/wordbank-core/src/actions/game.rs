//! Domain/game slice actions.

use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wordbank_types::{Category, Page, Question, StatsPatch, WordList};

use super::AppContext;
use crate::api::{ApiError, ApiRequest, endpoints};
use crate::store::{AnswerOutcome, Entity, GameSlice, QuizProgress, QuizScore};

/// What to do with the slice when a fetch fails (other than cancellation).
#[derive(Clone, Copy)]
enum OnFailure {
    KeepStale,
    BundledCategories,
}

impl AppContext {
    /// Shared fetch pattern: loading flag, envelope decode, generation check,
    /// apply or fall back, clear flag.
    async fn fetch_into<T, F>(
        &self,
        entity: Entity,
        req: ApiRequest,
        on_failure: OnFailure,
        cancel: &CancellationToken,
        apply: F,
    ) -> Result<(), ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(&mut GameSlice, T),
    {
        let generation = self.store.update(|s| s.game.begin(entity));
        let result = self.api.auth_fetch_json::<T>(&req, cancel).await;

        self.store.update(move |s| {
            if !s.game.finish(entity, generation) {
                debug!(?entity, generation, "dropping stale response");
                return result.map(|_| ());
            }
            match result {
                Ok(payload) => {
                    apply(&mut s.game, payload);
                    s.game.error = None;
                    Ok(())
                }
                Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
                Err(e) => {
                    warn!(?entity, path = req.path(), "fetch failed: {e}");
                    s.game.error = Some(e.user_message());
                    if let OnFailure::BundledCategories = on_failure {
                        s.game.fall_back_to_bundled_categories();
                    }
                    Err(e)
                }
            }
        })
    }

    /// Loads all categories, falling back to the bundled dataset on failure.
    ///
    /// # Errors
    /// Returns the fetch error; state already holds the fallback data.
    pub async fn fetch_categories(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.fetch_into(
            Entity::Categories,
            ApiRequest::get(endpoints::CATEGORIES),
            OnFailure::BundledCategories,
            cancel,
            |game, categories: Vec<Category>| game.categories = categories,
        )
        .await
    }

    /// Loads one category.
    ///
    /// # Errors
    /// Returns the fetch error; stale state is kept.
    pub async fn fetch_category(&self, id: &str, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.fetch_into(
            Entity::Category,
            ApiRequest::get(endpoints::category(id)),
            OnFailure::KeepStale,
            cancel,
            |game, category: Category| game.category = Some(category),
        )
        .await
    }

    /// Loads one page of word lists, replacing the lists and pagination.
    ///
    /// # Errors
    /// Returns the fetch error; stale state is kept.
    pub async fn fetch_word_lists(
        &self,
        page: u32,
        per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::get(endpoints::LISTS)
            .with_query("page", page)
            .with_query("per_page", per_page);
        self.fetch_into(
            Entity::WordLists,
            req,
            OnFailure::KeepStale,
            cancel,
            |game, page: Page<WordList>| {
                game.word_lists = page.items;
                game.pagination = Some(page.page_info);
            },
        )
        .await
    }

    /// Loads a single word list.
    ///
    /// # Errors
    /// Returns the fetch error; stale state is kept.
    pub async fn fetch_list(&self, id: &str, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.fetch_into(
            Entity::List,
            ApiRequest::get(endpoints::list(id)),
            OnFailure::KeepStale,
            cancel,
            |game, list: WordList| game.list = Some(list),
        )
        .await
    }

    /// Loads one page of the word lists in a category.
    ///
    /// # Errors
    /// Returns the fetch error; stale state is kept.
    pub async fn fetch_lists_by_category(
        &self,
        category_id: &str,
        page: u32,
        per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::get(endpoints::lists_by_category(category_id))
            .with_query("page", page)
            .with_query("per_page", per_page);
        self.fetch_into(
            Entity::ListsByCategory,
            req,
            OnFailure::KeepStale,
            cancel,
            |game, page: Page<WordList>| {
                game.lists_by_category = page.items;
                game.lists_by_category_pagination = Some(page.page_info);
            },
        )
        .await
    }

    /// Loads today's quiz and starts a fresh attempt at it.
    ///
    /// # Errors
    /// Returns the fetch error; stale state is kept.
    pub async fn fetch_daily_quiz(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.fetch_into(
            Entity::DailyQuiz,
            ApiRequest::get(endpoints::DAILY_QUIZ),
            OnFailure::KeepStale,
            cancel,
            |game, questions: Vec<Question>| {
                game.quiz = Some(QuizProgress::new(questions.clone()));
                game.daily_quiz = questions;
            },
        )
        .await
    }

    /// Adds a word list to the user's bank.
    ///
    /// # Errors
    /// Returns the API error; it is also surfaced as `game.error`.
    pub async fn add_list_to_bank(
        &self,
        list_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let generation = self.store.update(|s| s.game.begin(Entity::Bank));
        let req = ApiRequest::post(endpoints::USER_LISTS, json!({ "listId": list_id }));
        let result = self.api.auth_fetch_ack(&req, cancel).await;

        self.store.update(|s| {
            s.game.finish(Entity::Bank, generation);
            match &result {
                Ok(()) | Err(ApiError::Cancelled) => {}
                Err(e) => {
                    warn!(list_id, "failed to add list to bank: {e}");
                    s.game.error = Some(e.user_message());
                }
            }
        });
        result
    }

    /// Records an answer in the current quiz.
    pub fn answer_question(&self, question_id: &str, choice: usize) -> AnswerOutcome {
        self.store.update(|s| match s.game.quiz.as_mut() {
            Some(quiz) => quiz.answer(question_id, choice),
            None => AnswerOutcome::NoQuiz,
        })
    }

    /// Restarts the quiz from the last fetched daily questions.
    pub fn reset_quiz(&self) {
        self.store.update(|s| {
            s.game.quiz = Some(QuizProgress::new(s.game.daily_quiz.clone()));
        });
    }

    /// Closes a completed quiz and folds its score into the cached stats.
    ///
    /// Returns `None` while questions remain unanswered. Stats are updated
    /// locally only, like [`AppContext::update_stats`].
    pub fn finish_quiz(&self) -> Option<QuizScore> {
        let score = self.store.update(|s| {
            let quiz = s.game.quiz.take_if(|quiz| quiz.is_complete())?;
            Some(quiz.score())
        })?;

        let patch = self.store.select(|s| {
            s.auth.stats().map(|stats| StatsPatch {
                quizzes_taken: Some(stats.quizzes_taken.saturating_add(1)),
                correct_answers: Some(stats.correct_answers.saturating_add(score.correct)),
                ..StatsPatch::default()
            })
        });
        if let Some(patch) = patch {
            self.update_stats(&patch);
        }
        Some(score)
    }

    /// Dismisses the fetch error banner.
    pub fn clear_game_error(&self) {
        self.store.update(|s| s.game.error = None);
    }
}
