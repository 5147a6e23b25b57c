//! Endpoint paths, relative to the configured base URL.

pub const ME: &str = "/users/me";
pub const ME_PREFERENCES: &str = "/users/me/preferences";
pub const LOGIN: &str = "/users/login";
pub const REGISTER: &str = "/users/register";
pub const REFRESH_TOKEN: &str = "/users/refresh-token";
pub const USER_LISTS: &str = "/users/lists";
pub const LISTS: &str = "/lists";
pub const CATEGORIES: &str = "/lists/categories";
pub const DAILY_QUIZ: &str = "/quizzes/daily-quiz";

pub fn list(id: &str) -> String {
    format!("{LISTS}/{id}")
}

pub fn category(id: &str) -> String {
    format!("{CATEGORIES}/{id}")
}

pub fn lists_by_category(id: &str) -> String {
    format!("{LISTS}/by-category/{id}")
}
