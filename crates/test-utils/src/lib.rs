use anyhow::Result;
use core_access::{register_user, Argon2Hasher, User};
use persona::{
    survey::{bulk_create_questions, list_questions, NewSurveyQuestion, SurveyQuestion},
    SqliteStore,
};
use turso::Database;

/// The password every fixture user is registered with.
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub store: SqliteStore,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let store = SqliteStore::new(":memory:").await?;
        store.initialize_schema().await?;
        Ok(Self { store })
    }

    pub fn db(&self) -> &Database {
        &self.store.db
    }

    /// Registers `username` with a derived email and [`TEST_PASSWORD`].
    pub async fn create_user(&self, username: &str) -> Result<User> {
        let email = format!("{username}@example.com");
        let user = register_user(
            self.db(),
            &Argon2Hasher::new(),
            username,
            &email,
            TEST_PASSWORD,
        )
        .await?;
        Ok(user)
    }

    /// Inserts `(question_text, category)` pairs and returns the questions
    /// just created, in order.
    pub async fn seed_questions(&self, questions: &[(&str, &str)]) -> Result<Vec<SurveyQuestion>> {
        let before = list_questions(self.db()).await?.len();
        let new: Vec<NewSurveyQuestion> = questions
            .iter()
            .map(|(text, category)| NewSurveyQuestion::new(*text, *category))
            .collect();
        bulk_create_questions(self.db(), &new).await?;
        Ok(list_questions(self.db()).await?.split_off(before))
    }

    /// Counts the stored responses of `user_id`, bypassing the read-back API.
    pub async fn count_responses(&self, user_id: i64) -> Result<i64> {
        let conn = self.db().connect()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM survey_responses WHERE user_id = ?",
                turso::params![user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| anyhow::anyhow!("COUNT(*) returned no row"))?;
        Ok(row.get(0)?)
    }
}

/// The catalog used by most tests: one question per mapped category plus one
/// the reconciler does not know about.
pub fn default_questions() -> Vec<(&'static str, &'static str)> {
    vec![
        ("What is your name?", "general_information"),
        ("What do you do for fun?", "hobbies_interests"),
        ("What do you dislike?", "dislikes_personality"),
        ("How do you handle stress?", "stress_emotions"),
        ("What makes you laugh?", "humor_communication"),
        ("Where do you see yourself in ten years?", "life_goals_decision_making"),
        ("How should your assistant behave?", "ai_assistant_personality"),
        ("Do you enjoy deep conversations?", "deep_conversations_engagement"),
        ("What is your star sign?", "astrology"),
    ]
}

/// Installs a compact tracing subscriber once per test binary.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .try_init();
}
