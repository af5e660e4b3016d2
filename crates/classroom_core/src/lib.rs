pub mod domain;
pub mod error;
pub mod feed;
pub mod guard;
pub mod ports;
pub mod session;
pub mod store;
pub mod validation;

pub use domain::{Author, Comment, Education, Post, School, Session, SignInResponse, UserProfile};
pub use error::AuthError;
pub use feed::{CommentExpansion, FeedController, FeedError, LikeAction};
pub use guard::{GuardPolicy, Location, Navigator, RouteGuard};
pub use ports::{AuthTransport, FeedService, KeyValueStore, PortError, PortResult, RosterService};
pub use session::{AuthStatus, SessionSnapshot, SessionStore};
pub use store::MemoryStore;
pub use validation::{validate_credentials, ValidationError};
