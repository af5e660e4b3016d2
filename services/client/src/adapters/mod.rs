pub mod auth;
pub mod feed;
pub mod file_store;
pub mod http;
pub mod roster;

pub use auth::HttpAuthTransport;
pub use feed::HttpFeedService;
pub use file_store::FileStore;
pub use http::ApiClient;
pub use roster::HttpRosterService;
