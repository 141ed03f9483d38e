// Persistence sinks for merged records

pub mod json_file;
pub mod sqlite;

pub use json_file::StagedJson;
pub use sqlite::CountryStore;
