//! Shared query infrastructure: the [`Query`] trait and the [`QueryCommon`] fields.

use url::Url;

/// Trait implemented by all list query builders. Provides URL serialization
/// and the shared builder methods for `start`/`limit` and pass-through filters.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Sets the offset of the first result (0-indexed).
    fn with_start(mut self, start: u32) -> Self
    where
        Self: Sized,
    {
        self.get_common().start = Some(start);
        self
    }

    /// Sets the maximum number of results returned.
    fn with_limit(mut self, limit: u32) -> Self
    where
        Self: Sized,
    {
        self.get_common().limit = Some(limit);
        self
    }

    /// Only returns records modified since the given timestamp
    /// (`YYYYMMDDTHHMMSS`, as the API expects it).
    fn with_last_modified(mut self, last_modified: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common().last_modified = Some(last_modified.to_string());
        self
    }

    /// Adds an arbitrary query parameter, sent through as given.
    fn with_param(mut self, key: &str, value: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common()
            .extra
            .push((key.to_string(), value.to_string()));
        self
    }
}

/// Fields shared by all query types: pagination window and extra parameters.
#[derive(Clone, Default, Debug)]
pub struct QueryCommon {
    /// Offset of the first result. `None` uses the API default.
    pub start: Option<u32>,
    /// Maximum results. `None` uses the API default.
    pub limit: Option<u32>,
    /// Modified-since filter.
    pub last_modified: Option<String>,
    /// Additional parameters appended verbatim.
    pub extra: Vec<(String, String)>,
}

impl QueryCommon {
    /// Appends the common pagination and filter parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(start) = self.start {
            url.query_pairs_mut()
                .append_pair("start", &start.to_string());
        };
        if let Some(limit) = self.limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        };
        if let Some(last_modified) = &self.last_modified {
            url.query_pairs_mut()
                .append_pair("lastmodified", last_modified.as_str());
        };
        for (key, value) in self.extra.iter() {
            url.query_pairs_mut().append_pair(key, value);
        }
        url
    }
}
