mod client;
mod errors;
mod query;
pub mod shape;
pub mod types;
pub use self::client::{Client, Method, WriteResponse};
pub use self::errors::Error;
pub use self::query::{OpportunityQuery, PartyQuery, Query, QueryCommon, TaskQuery};
