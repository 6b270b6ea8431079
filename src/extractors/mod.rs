pub mod date;
pub mod drive_id;
pub mod sentiment;

pub use date::{format_timestamp, normalize_date, normalize_date_at, NormalizedDate};
pub use drive_id::{extract_all_drive_ids, extract_drive_id};
pub use sentiment::SentimentClassifier;
