mod page;
pub use self::page::{PageEnvelope, PageResult};

mod row;
pub use self::row::{field_text, value_text, Row};
