use url::Url;

use super::{common::QueryCommon, Query};

/// Filters for the `party` listing.
#[derive(Default, Clone, Debug)]
pub struct PartyQuery {
    pub common: QueryCommon,
    pub search: Option<String>,
    pub email: Option<String>,
    pub tag: Option<String>,
}

impl Query for PartyQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        if let Some(search) = &self.search {
            url.query_pairs_mut().append_pair("q", search.as_str());
        };
        if let Some(email) = &self.email {
            url.query_pairs_mut().append_pair("email", email.as_str());
        };
        if let Some(tag) = &self.tag {
            url.query_pairs_mut().append_pair("tag", tag.as_str());
        };
        url
    }
}

impl PartyQuery {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }
}
