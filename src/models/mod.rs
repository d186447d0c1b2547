pub mod data_item;
pub mod enums;
pub mod label_result;
pub mod session;
pub mod taxonomy;

pub use data_item::DataItem;
pub use enums::*;
pub use label_result::*;
pub use session::{LabelingSession, SessionSummary};
pub use taxonomy::{LabelCategory, LabelOption, LabelingIntent, Taxonomy, TaxonomyError};
