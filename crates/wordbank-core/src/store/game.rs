//! Domain/game slice: fetched word lists, categories and the daily quiz.

use tracing::warn;
use wordbank_types::{Category, PageInfo, Question, WordList};

use super::quiz::QuizProgress;

/// Entities fetched into the game slice. Each has its own loading flag and
/// request generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Categories,
    Category,
    WordLists,
    List,
    ListsByCategory,
    DailyQuiz,
    Bank,
}

impl Entity {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        match self {
            Entity::Categories => 0,
            Entity::Category => 1,
            Entity::WordLists => 2,
            Entity::List => 3,
            Entity::ListsByCategory => 4,
            Entity::DailyQuiz => 5,
            Entity::Bank => 6,
        }
    }
}

/// Per-entity loading flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    flags: [bool; Entity::COUNT],
}

impl LoadingFlags {
    pub fn is_loading(&self, entity: Entity) -> bool {
        self.flags[entity.index()]
    }

    pub fn any(&self) -> bool {
        self.flags.iter().any(|loading| *loading)
    }

    fn set(&mut self, entity: Entity, loading: bool) {
        self.flags[entity.index()] = loading;
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameSlice {
    pub categories: Vec<Category>,
    pub category: Option<Category>,
    pub word_lists: Vec<WordList>,
    /// Pagination of the last `fetch_word_lists`, replaced on every fetch.
    pub pagination: Option<PageInfo>,
    pub list: Option<WordList>,
    pub lists_by_category: Vec<WordList>,
    pub lists_by_category_pagination: Option<PageInfo>,
    pub daily_quiz: Vec<Question>,
    pub quiz: Option<QuizProgress>,
    pub loading: LoadingFlags,
    /// Banner message from the last failed fetch.
    pub error: Option<String>,
    generations: [u64; Entity::COUNT],
}

impl GameSlice {
    /// Marks `entity` as loading and returns the generation of this request.
    pub(crate) fn begin(&mut self, entity: Entity) -> u64 {
        self.loading.set(entity, true);
        let generation = &mut self.generations[entity.index()];
        *generation += 1;
        *generation
    }

    /// Completes a request. Returns false if a newer request for the same
    /// entity has started since, in which case its result must be dropped
    /// and the loading flag stays set for the newer request.
    pub(crate) fn finish(&mut self, entity: Entity, generation: u64) -> bool {
        if self.generations[entity.index()] != generation {
            return false;
        }
        self.loading.set(entity, false);
        true
    }

    /// Replaces categories with the bundled dataset.
    pub(crate) fn fall_back_to_bundled_categories(&mut self) {
        self.categories = bundled_categories();
    }
}

/// The category dataset compiled into the binary.
pub fn bundled_categories() -> Vec<Category> {
    serde_json::from_str(wordbank_assets::CATEGORIES_JSON).unwrap_or_else(|e| {
        warn!("bundled categories are invalid: {e}");
        Vec::new()
    })
}
