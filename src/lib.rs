pub mod cli;
pub mod dataset;
pub mod extractors;
pub mod field_resolver;
pub mod google_sheets;
pub mod mapping_config;
pub mod model;
pub mod raw_row;
pub mod row_mapper;

pub use cli::{Cli, OutputFormat};
pub use dataset::{
    analysis_digest, write_csv, write_json, DatasetAssembler, DatasetSummary, FilterState,
};
pub use extractors::{
    extract_all_drive_ids, extract_drive_id, normalize_date, normalize_date_at, NormalizedDate,
    SentimentClassifier,
};
pub use field_resolver::{find_matching_column, normalize_header, FieldResolver};
pub use google_sheets::{validate_csv_payload, SheetSource, DEFAULT_SHEET_NAME};
pub use mapping_config::{FieldAliases, MappingConfig, DEFAULT_TOML_STR};
pub use model::{CampaignResponse, MediaKind, Sentiment};
pub use raw_row::{parse_csv_text, read_csv_file, RawRow};
pub use row_mapper::{map_rows, MappedRow, MappingStats, RowMapper};
