//! # Profile Store
//!
//! One profile per user. Profiles are either created explicitly through
//! [`create_profile`] or implicitly by the reconciler on a user's first
//! survey submission.

use crate::{errors::PersonaError, store::sql::PROFILE_COLUMNS};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use turso::{params, Connection, Database, Row, Value};

/// A user's personality profile as stored in `user_profiles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub hobbies: Option<String>,
    pub dislikes: Option<String>,
    pub favorite_music: Option<String>,
    pub favorite_movies: Option<String>,
    pub personality_type: Option<String>,
    pub stress_handling: Option<String>,
    pub humor_preference: Option<String>,
    pub long_term_goals: Option<String>,
    pub decision_making: Option<String>,
    pub assistant_personality: Option<String>,
    pub wants_deep_conversations: bool,
}

impl Profile {
    /// An unsaved profile with only the required fields set.
    pub fn new(user_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            user_id,
            name: name.into(),
            description: None,
            hobbies: None,
            dislikes: None,
            favorite_music: None,
            favorite_movies: None,
            personality_type: None,
            stress_handling: None,
            humor_preference: None,
            long_term_goals: None,
            decision_making: None,
            assistant_personality: None,
            wants_deep_conversations: true,
        }
    }

    fn from_new(user_id: i64, new: NewProfile) -> Self {
        Self {
            id: 0,
            user_id,
            name: new.name,
            description: new.description,
            hobbies: new.hobbies,
            dislikes: new.dislikes,
            favorite_music: new.favorite_music,
            favorite_movies: new.favorite_movies,
            personality_type: new.personality_type,
            stress_handling: new.stress_handling,
            humor_preference: new.humor_preference,
            long_term_goals: new.long_term_goals,
            decision_making: new.decision_making,
            assistant_personality: new.assistant_personality,
            wants_deep_conversations: new.wants_deep_conversations.unwrap_or(true),
        }
    }

    /// Values for every column after `id` and `user_id`, in `PROFILE_COLUMNS` order.
    fn field_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            text_or_null(&self.description),
            text_or_null(&self.hobbies),
            text_or_null(&self.dislikes),
            text_or_null(&self.favorite_music),
            text_or_null(&self.favorite_movies),
            text_or_null(&self.personality_type),
            text_or_null(&self.stress_handling),
            text_or_null(&self.humor_preference),
            text_or_null(&self.long_term_goals),
            text_or_null(&self.decision_making),
            text_or_null(&self.assistant_personality),
            Value::Integer(i64::from(self.wants_deep_conversations)),
        ]
    }
}

fn text_or_null(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

impl TryFrom<&Row> for Profile {
    type Error = PersonaError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let wants_deep_conversations: i64 = row.get(14)?;
        Ok(Profile {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            hobbies: row.get(4)?,
            dislikes: row.get(5)?,
            favorite_music: row.get(6)?,
            favorite_movies: row.get(7)?,
            personality_type: row.get(8)?,
            stress_handling: row.get(9)?,
            humor_preference: row.get(10)?,
            long_term_goals: row.get(11)?,
            decision_making: row.get(12)?,
            assistant_personality: row.get(13)?,
            wants_deep_conversations: wants_deep_conversations != 0,
        })
    }
}

/// The payload for creating a profile by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hobbies: Option<String>,
    #[serde(default)]
    pub dislikes: Option<String>,
    #[serde(default)]
    pub favorite_music: Option<String>,
    #[serde(default)]
    pub favorite_movies: Option<String>,
    #[serde(default)]
    pub personality_type: Option<String>,
    #[serde(default)]
    pub stress_handling: Option<String>,
    #[serde(default)]
    pub humor_preference: Option<String>,
    #[serde(default)]
    pub long_term_goals: Option<String>,
    #[serde(default)]
    pub decision_making: Option<String>,
    #[serde(default)]
    pub assistant_personality: Option<String>,
    /// Defaults to `true` when omitted.
    #[serde(default)]
    pub wants_deep_conversations: Option<bool>,
}

/// A single writable profile attribute, as targeted by survey categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Description,
    Hobbies,
    Dislikes,
    FavoriteMusic,
    FavoriteMovies,
    PersonalityType,
    StressHandling,
    HumorPreference,
    LongTermGoals,
    DecisionMaking,
    AssistantPersonality,
    WantsDeepConversations,
}

impl ProfileField {
    /// The column name backing this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Description => "description",
            ProfileField::Hobbies => "hobbies",
            ProfileField::Dislikes => "dislikes",
            ProfileField::FavoriteMusic => "favorite_music",
            ProfileField::FavoriteMovies => "favorite_movies",
            ProfileField::PersonalityType => "personality_type",
            ProfileField::StressHandling => "stress_handling",
            ProfileField::HumorPreference => "humor_preference",
            ProfileField::LongTermGoals => "long_term_goals",
            ProfileField::DecisionMaking => "decision_making",
            ProfileField::AssistantPersonality => "assistant_personality",
            ProfileField::WantsDeepConversations => "wants_deep_conversations",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates a profile for `user_id`, failing with `ProfileExists` if one is already there.
pub async fn create_profile(
    db: &Database,
    user_id: i64,
    new: NewProfile,
) -> Result<Profile, PersonaError> {
    let conn = db.connect()?;
    if fetch_profile(&conn, user_id).await?.is_some() {
        return Err(PersonaError::ProfileExists(user_id));
    }

    let mut profile = Profile::from_new(user_id, new);
    profile.id = match insert_profile(&conn, &profile).await {
        Err(PersonaError::Database(turso::Error::SqlExecutionFailure(msg)))
            if msg.contains("UNIQUE constraint failed") =>
        {
            return Err(PersonaError::ProfileExists(user_id));
        }
        other => other?,
    };

    info!(user_id, profile_id = profile.id, "Created profile.");
    Ok(profile)
}

/// Reads the profile for `user_id`, failing with `ProfileNotFound` if there is none.
pub async fn get_profile(db: &Database, user_id: i64) -> Result<Profile, PersonaError> {
    let conn = db.connect()?;
    fetch_profile(&conn, user_id)
        .await?
        .ok_or(PersonaError::ProfileNotFound(user_id))
}

pub(crate) async fn fetch_profile(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<Profile>, PersonaError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?");
    let mut rows = conn.query(&sql, params![user_id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Profile::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Inserts `profile` and returns the new row id. `profile.id` is ignored.
pub(crate) async fn insert_profile(
    conn: &Connection,
    profile: &Profile,
) -> Result<i64, PersonaError> {
    let mut values = vec![Value::Integer(profile.user_id)];
    values.extend(profile.field_values());

    let mut rows = conn
        .query(
            "INSERT INTO user_profiles (user_id, name, description, hobbies, dislikes, \
             favorite_music, favorite_movies, personality_type, stress_handling, \
             humor_preference, long_term_goals, decision_making, assistant_personality, \
             wants_deep_conversations) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            values,
        )
        .await?;

    let row = rows.next().await?.ok_or_else(|| {
        PersonaError::DataIntegrity(format!(
            "Profile insert for user {} returned no id",
            profile.user_id
        ))
    })?;
    Ok(row.get(0)?)
}

/// Overwrites every field of the stored profile for `profile.user_id`.
pub(crate) async fn update_profile(
    conn: &Connection,
    profile: &Profile,
) -> Result<(), PersonaError> {
    let mut values = profile.field_values();
    values.push(Value::Integer(profile.user_id));

    conn.execute(
        "UPDATE user_profiles SET name = ?, description = ?, hobbies = ?, dislikes = ?, \
         favorite_music = ?, favorite_movies = ?, personality_type = ?, stress_handling = ?, \
         humor_preference = ?, long_term_goals = ?, decision_making = ?, \
         assistant_personality = ?, wants_deep_conversations = ? \
         WHERE user_id = ?",
        values,
    )
    .await?;
    Ok(())
}
