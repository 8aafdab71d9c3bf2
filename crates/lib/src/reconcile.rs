//! # Profile Reconciler
//!
//! Folds a user's survey answers into their profile. Each question category
//! feeds a fixed set of profile fields; the table below is the complete
//! mapping and anything not listed in it is ignored.
//!
//! Answers are applied in ascending question id order, so when two categories
//! target the same field (both `dislikes_personality` and
//! `deep_conversations_engagement` set `wants_deep_conversations`) the answer
//! to the later question wins.

use crate::{
    errors::PersonaError,
    profile::{fetch_profile, insert_profile, update_profile, Profile, ProfileField},
    responses::{fetch_answered_questions, submit_responses, AnsweredQuestion, SurveyAnswer},
};
use core_access::User;
use tracing::{debug, info};
use turso::{Connection, Database};

use ProfileField::*;

/// Category → profile fields. Keys are matched case-sensitively.
pub const CATEGORY_FIELDS: &[(&str, &[ProfileField])] = &[
    ("general_information", &[Name, Description]),
    (
        "hobbies_interests",
        &[Hobbies, FavoriteMusic, FavoriteMovies],
    ),
    (
        "dislikes_personality",
        &[Dislikes, PersonalityType, WantsDeepConversations],
    ),
    ("stress_emotions", &[StressHandling]),
    ("humor_communication", &[HumorPreference]),
    (
        "life_goals_decision_making",
        &[LongTermGoals, DecisionMaking],
    ),
    ("ai_assistant_personality", &[AssistantPersonality]),
    ("deep_conversations_engagement", &[WantsDeepConversations]),
];

/// Looks up the fields fed by `category`, or `None` for an unmapped category.
pub fn fields_for_category(category: &str) -> Option<&'static [ProfileField]> {
    CATEGORY_FIELDS
        .iter()
        .find(|(key, _)| *key == category)
        .map(|(_, fields)| *fields)
}

/// Interprets a free-text answer as a yes/no flag.
///
/// "yes", "true" and "1" in any case are true; everything else, including
/// padded forms such as `" yes"`, is false.
pub fn parse_bool(text: &str) -> bool {
    ["yes", "true", "1"]
        .iter()
        .any(|accepted| text.eq_ignore_ascii_case(accepted))
}

fn assign(profile: &mut Profile, field: ProfileField, text: &str) {
    let value = Some(text.to_string());
    match field {
        Name => profile.name = text.to_string(),
        Description => profile.description = value,
        Hobbies => profile.hobbies = value,
        Dislikes => profile.dislikes = value,
        FavoriteMusic => profile.favorite_music = value,
        FavoriteMovies => profile.favorite_movies = value,
        PersonalityType => profile.personality_type = value,
        StressHandling => profile.stress_handling = value,
        HumorPreference => profile.humor_preference = value,
        LongTermGoals => profile.long_term_goals = value,
        DecisionMaking => profile.decision_making = value,
        AssistantPersonality => profile.assistant_personality = value,
        WantsDeepConversations => profile.wants_deep_conversations = parse_bool(text),
    }
}

/// Applies `answers` to `profile` in the order given.
pub fn apply_answers(profile: &mut Profile, answers: &[AnsweredQuestion]) {
    for answer in answers {
        let Some(fields) = fields_for_category(&answer.category) else {
            debug!(
                question_id = answer.question_id,
                category = %answer.category,
                "Ignoring answer with unmapped category."
            );
            continue;
        };
        for field in fields {
            assign(profile, *field, &answer.response_text);
        }
    }
}

/// Recomputes the profile of `user` from all of their stored answers.
///
/// Creates the profile on first use; its name falls back to the username until
/// a `general_information` answer provides one. Fails with `NoResponses` if the
/// user has not answered anything.
pub async fn reconcile_profile(db: &Database, user: &User) -> Result<Profile, PersonaError> {
    let conn = db.connect()?;

    let answers = fetch_answered_questions(&conn, user.id).await?;
    if answers.is_empty() {
        return Err(PersonaError::NoResponses(user.id));
    }

    let existing = fetch_profile(&conn, user.id).await?;
    let is_new = existing.is_none();
    let profile = save_reconciled(&conn, user, &answers, existing).await?;

    info!(
        user_id = user.id,
        profile_id = profile.id,
        answers = answers.len(),
        created = is_new,
        "Reconciled profile from survey answers."
    );
    Ok(profile)
}

/// Applies `answers` on top of `existing` and writes the result back.
///
/// `existing` is the profile as last read. If it was absent but another writer
/// has created the row since, the insert hits the `user_id` uniqueness and the
/// answers are applied to the stored row instead.
async fn save_reconciled(
    conn: &Connection,
    user: &User,
    answers: &[AnsweredQuestion],
    existing: Option<Profile>,
) -> Result<Profile, PersonaError> {
    if let Some(mut profile) = existing {
        apply_answers(&mut profile, answers);
        update_profile(conn, &profile).await?;
        return Ok(profile);
    }

    let mut profile = Profile::new(user.id, user.username.clone());
    apply_answers(&mut profile, answers);
    match insert_profile(conn, &profile).await {
        Ok(id) => {
            profile.id = id;
            Ok(profile)
        }
        Err(PersonaError::Database(turso::Error::SqlExecutionFailure(msg)))
            if msg.contains("UNIQUE constraint failed") =>
        {
            debug!(
                user_id = user.id,
                "Profile created concurrently; updating the stored row."
            );
            let mut stored = fetch_profile(conn, user.id)
                .await?
                .ok_or(PersonaError::ProfileNotFound(user.id))?;
            apply_answers(&mut stored, answers);
            update_profile(conn, &stored).await?;
            Ok(stored)
        }
        Err(e) => Err(e),
    }
}

/// Stores a batch of answers and then reconciles the profile.
///
/// The batch is committed before reconciliation starts; if the batch fails,
/// the profile is left untouched.
pub async fn submit_and_reconcile(
    db: &Database,
    user: &User,
    answers: &[SurveyAnswer],
) -> Result<Profile, PersonaError> {
    submit_responses(db, user.id, answers).await?;
    reconcile_profile(db, user).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_id: i64, category: &str, text: &str) -> AnsweredQuestion {
        AnsweredQuestion {
            question_id,
            question_text: format!("Question {question_id}"),
            category: category.to_string(),
            response_text: text.to_string(),
        }
    }

    #[test]
    fn test_parse_bool() {
        for yes in ["yes", "Yes", "YES", "true", "True", "1"] {
            assert!(parse_bool(yes), "{yes:?} should parse as true");
        }
        for no in ["nah", "no", "false", "0", "", "yes please", "y", "  yes ", " 1"] {
            assert!(!parse_bool(no), "{no:?} should parse as false");
        }
    }

    #[test]
    fn test_mapping_covers_every_field() {
        let mapped: Vec<ProfileField> = CATEGORY_FIELDS
            .iter()
            .flat_map(|(_, fields)| fields.iter().copied())
            .collect();
        for field in [
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
        ] {
            assert!(mapped.contains(&field), "{field} is not fed by any category");
        }
    }

    #[test]
    fn test_category_lookup_is_case_sensitive() {
        assert_eq!(
            fields_for_category("stress_emotions"),
            Some(&[StressHandling][..])
        );
        assert!(fields_for_category("Stress_Emotions").is_none());
        assert!(fields_for_category("astrology").is_none());
    }

    #[test]
    fn test_apply_answers_fills_all_targets() {
        let mut profile = Profile::new(1, "placeholder");
        apply_answers(
            &mut profile,
            &[
                answer(1, "general_information", "Alice"),
                answer(2, "hobbies_interests", "Jazz and hiking"),
                answer(3, "life_goals_decision_making", "Open a bakery"),
            ],
        );

        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.description.as_deref(), Some("Alice"));
        assert_eq!(profile.hobbies.as_deref(), Some("Jazz and hiking"));
        assert_eq!(profile.favorite_music.as_deref(), Some("Jazz and hiking"));
        assert_eq!(profile.favorite_movies.as_deref(), Some("Jazz and hiking"));
        assert_eq!(profile.long_term_goals.as_deref(), Some("Open a bakery"));
        assert_eq!(profile.decision_making.as_deref(), Some("Open a bakery"));
        assert!(profile.stress_handling.is_none());
    }

    #[test]
    fn test_boolean_field_is_coerced() {
        let mut profile = Profile::new(1, "Alice");
        apply_answers(&mut profile, &[answer(1, "dislikes_personality", "nah")]);
        assert!(!profile.wants_deep_conversations);
        assert_eq!(profile.dislikes.as_deref(), Some("nah"));
        assert_eq!(profile.personality_type.as_deref(), Some("nah"));

        apply_answers(&mut profile, &[answer(1, "dislikes_personality", "Yes")]);
        assert!(profile.wants_deep_conversations);
    }

    #[test]
    fn test_later_answer_wins_on_shared_field() {
        let mut profile = Profile::new(1, "Alice");
        apply_answers(
            &mut profile,
            &[
                answer(4, "dislikes_personality", "yes"),
                answer(9, "deep_conversations_engagement", "no thanks"),
            ],
        );
        assert!(!profile.wants_deep_conversations);
    }

    #[test]
    fn test_unknown_category_changes_nothing() {
        let mut profile = Profile::new(1, "Alice");
        let before = profile.clone();
        apply_answers(&mut profile, &[answer(1, "astrology", "Leo")]);
        assert_eq!(profile, before);
    }

    #[tokio::test]
    async fn test_stale_read_updates_concurrently_created_profile() {
        let db = turso::Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        for statement in crate::store::sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await.unwrap();
        }
        conn.execute(
            "INSERT INTO users (username, email, hashed_password) VALUES ('alice', 'alice@example.com', 'x')",
            (),
        )
        .await
        .unwrap();
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };

        // Another request created the profile after this one read "no profile".
        let created = crate::profile::create_profile(
            &db,
            user.id,
            crate::profile::NewProfile {
                name: "Placeholder".to_string(),
                hobbies: Some("Chess".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let saved = save_reconciled(
            &conn,
            &user,
            &[answer(1, "stress_emotions", "Long walks")],
            None,
        )
        .await
        .unwrap();

        assert_eq!(saved.id, created.id);
        assert_eq!(saved.hobbies.as_deref(), Some("Chess"));
        assert_eq!(saved.stress_handling.as_deref(), Some("Long walks"));
        assert_eq!(fetch_profile(&conn, user.id).await.unwrap(), Some(saved));
    }
}
