mod fixtures;
mod mock_instance;

pub use fixtures::{header_from_columns, nominal, numeric};
pub use mock_instance::MockInstance;
