use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Links to the user's external profiles and resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct ShowCase {
    pub github: String,
    pub instagram: String,
    pub linked_in: String,
    pub resume: String,
    pub youtube: String,
}

/// The persisted profile document, one per user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ProfileRecord {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(rename = "showCase", default)]
    pub show_case: ShowCase,
}

impl ProfileRecord {
    pub fn personal_info(&self) -> PersonalInfo {
        PersonalInfo {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            about: self.about.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// Personal-info field group with an already uploaded picture URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct PersonalInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub profile_picture: String,
}

/// One of the two units of partial update on a [`ProfileRecord`].
///
/// Serializes to the patch shape sent to the document store: either the flat
/// personal-info object or `{ "showCase": { .. } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldGroup {
    ShowCase {
        #[serde(rename = "showCase")]
        show_case: ShowCase,
    },
    PersonalInfo(PersonalInfo),
}

impl FieldGroup {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PersonalInfo(_) => "personal_info",
            Self::ShowCase { .. } => "show_case",
        }
    }
}
