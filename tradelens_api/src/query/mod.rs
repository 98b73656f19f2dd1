mod common;
pub use self::common::{PageRequest, Query};

mod params;
pub use self::params::NormalizedQueryParams;
