//! 命令定义和实现

pub mod fields;
pub mod scan;
pub mod table;
pub mod words;

pub use fields::FieldsCommand;
pub use table::TableCommand;
pub use words::WordsCommand;
