use url::Url;

use super::{common::QueryCommon, Query};

/// Filters for the `opportunity` listing.
#[derive(Default, Clone, Debug)]
pub struct OpportunityQuery {
    pub common: QueryCommon,
    pub search: Option<String>,
    pub milestone: Option<String>,
    pub tag: Option<String>,
}

impl Query for OpportunityQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        if let Some(search) = &self.search {
            url.query_pairs_mut().append_pair("q", search.as_str());
        };
        if let Some(milestone) = &self.milestone {
            url.query_pairs_mut()
                .append_pair("milestone", milestone.as_str());
        };
        if let Some(tag) = &self.tag {
            url.query_pairs_mut().append_pair("tag", tag.as_str());
        };
        url
    }
}

impl OpportunityQuery {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    /// Restricts results to a milestone, by name.
    pub fn with_milestone(mut self, milestone: &str) -> Self {
        self.milestone = Some(milestone.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }
}
