//! # Persona
//!
//! Survey-driven personality profiles. Users answer a catalog of categorized
//! survey questions; their answers are stored per question and folded into a
//! single profile record by the reconciler.
//!
//! Identity (users, passwords, tokens) lives in the `core-access` crate; this
//! crate owns everything that hangs off a user.

pub mod constants;
pub mod errors;
pub mod profile;
pub mod reconcile;
pub mod responses;
pub mod store;
pub mod survey;

pub use errors::PersonaError;
pub use profile::{create_profile, get_profile, NewProfile, Profile, ProfileField};
pub use reconcile::{parse_bool, reconcile_profile, submit_and_reconcile, CATEGORY_FIELDS};
pub use responses::{list_responses, submit_responses, AnsweredQuestion, SurveyAnswer};
pub use store::SqliteStore;
pub use survey::{bulk_create_questions, list_questions, NewSurveyQuestion, SurveyQuestion};
