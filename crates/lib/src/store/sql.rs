//! # Schema SQL
//!
//! Table definitions for everything that hangs off a user. The `users` table
//! itself is owned by `core-access` and is created first.

use core_access::CREATE_USERS_TABLE_SQL;

pub const CREATE_USER_PROFILES_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS user_profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        hobbies TEXT,
        dislikes TEXT,
        favorite_music TEXT,
        favorite_movies TEXT,
        personality_type TEXT,
        stress_handling TEXT,
        humor_preference TEXT,
        long_term_goals TEXT,
        decision_making TEXT,
        assistant_personality TEXT,
        wants_deep_conversations INTEGER NOT NULL DEFAULT 1
    );
";

pub const CREATE_SURVEY_QUESTIONS_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS survey_questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_text TEXT NOT NULL,
        category TEXT NOT NULL
    );
";

pub const CREATE_SURVEY_RESPONSES_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS survey_responses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        question_id INTEGER NOT NULL REFERENCES survey_questions(id),
        response_text TEXT NOT NULL,
        UNIQUE (user_id, question_id)
    );
";

/// Every statement needed to bring an empty database up to date, in dependency order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_USERS_TABLE_SQL,
    CREATE_USER_PROFILES_TABLE_SQL,
    CREATE_SURVEY_QUESTIONS_TABLE_SQL,
    CREATE_SURVEY_RESPONSES_TABLE_SQL,
];

/// The column list shared by every profile SELECT; `Profile::try_from(&Row)` relies on this order.
pub const PROFILE_COLUMNS: &str = "id, user_id, name, description, hobbies, dislikes, \
    favorite_music, favorite_movies, personality_type, stress_handling, humor_preference, \
    long_term_goals, decision_making, assistant_personality, wants_deep_conversations";
