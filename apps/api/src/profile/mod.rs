// Profile intake: typed records, the delimited-line parser, the level mapper, and the
// dialogue-replay endpoint. The composer consumes a finished ProfileRecord.

pub mod handlers;
pub mod intake;
pub mod models;
pub mod parser;
pub mod proficiency;

pub use intake::ProfileRequest;
