//! The fixed `getProblem` query body.

use serde::Serialize;

use crate::adapter::{RestBytes, RestError, RestResult};

pub const DISPLAY_ID: u64 = 1002;
pub const LOCALE: &str = "zh_CN";

/// Query sent to `getProblem`. Fields are private and there is no setter,
/// so a value never changes after `fixed()` builds it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    display_id: u64,
    discussion_count: bool,
    judge_info: bool,
    judge_info_to_be_preprocessed: bool,
    last_submission_and_last_accepted_submission: bool,
    localized_contents_of_locale: &'static str,
    permission_of_current_user: bool,
    samples: bool,
    statistics: bool,
    tags_of_locale: &'static str,
}

impl ProblemQuery {
    pub const fn fixed() -> Self {
        Self {
            display_id: DISPLAY_ID,
            discussion_count: true,
            judge_info: true,
            judge_info_to_be_preprocessed: true,
            last_submission_and_last_accepted_submission: true,
            localized_contents_of_locale: LOCALE,
            permission_of_current_user: true,
            samples: true,
            statistics: true,
            tags_of_locale: LOCALE,
        }
    }

    pub fn display_id(&self) -> u64 {
        self.display_id
    }

    pub fn to_body(&self) -> RestResult<RestBytes> {
        sonic_rs::to_vec(self)
            .map(RestBytes::from)
            .map_err(|err| RestError::internal(format!("payload encoding failed: {err}")))
    }
}

impl Default for ProblemQuery {
    fn default() -> Self {
        Self::fixed()
    }
}

