pub mod exclusion;
pub mod parser;
pub mod prompt;
pub mod scorer;
