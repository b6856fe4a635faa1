mod common;
pub use self::common::{Query, QueryCommon};

mod opportunity;
pub use self::opportunity::OpportunityQuery;

mod party;
pub use self::party::PartyQuery;

mod task;
pub use self::task::TaskQuery;
