//! Value objects identifying who a token belongs to and what it is for.

pub mod purpose;
pub mod user_id;

pub use purpose::Purpose;
pub use user_id::UserId;
