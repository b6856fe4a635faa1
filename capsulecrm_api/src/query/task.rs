use url::Url;

use super::{common::QueryCommon, Query};

/// Filters for the `tasks` listing.
#[derive(Default, Clone, Debug)]
pub struct TaskQuery {
    pub common: QueryCommon,
    pub category: Option<String>,
    pub user: Option<String>,
}

impl Query for TaskQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        if let Some(category) = &self.category {
            url.query_pairs_mut()
                .append_pair("category", category.as_str());
        };
        if let Some(user) = &self.user {
            url.query_pairs_mut().append_pair("user", user.as_str());
        };
        url
    }
}

impl TaskQuery {
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Restricts results to tasks owned by the given user name.
    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }
}
