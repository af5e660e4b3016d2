use async_trait::async_trait;
use classroom_core::domain::UserProfile;
use classroom_core::ports::{PortResult, RosterService};
use reqwest::Method;

use crate::adapters::http::ApiClient;

/// Class roster lookups over `GET /class/{year}`.
#[derive(Clone, Debug)]
pub struct HttpRosterService {
    api: ApiClient,
}

impl HttpRosterService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RosterService for HttpRosterService {
    async fn students_by_year(&self, year: &str) -> PortResult<Vec<UserProfile>> {
        let request = self.api.request(Method::GET, &format!("/class/{}", year.trim()));
        self.api.fetch_data(request, "Roster request failed").await
    }
}
