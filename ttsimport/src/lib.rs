pub mod drive;
pub mod importer;
pub mod logging;
pub mod tts;
