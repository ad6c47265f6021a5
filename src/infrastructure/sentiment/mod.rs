pub mod keyword;
pub mod vader;

pub use keyword::KeywordClassifier;
pub use vader::VaderClassifier;
