pub mod convert;
pub mod guid;
pub mod lua;
pub mod natural;
pub mod pieces;
pub mod save_file;
