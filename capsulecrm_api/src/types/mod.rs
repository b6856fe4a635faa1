mod payload;
pub use self::payload::{NewHistoryItem, NewOpportunity, NewOrganisation, NewPerson};
