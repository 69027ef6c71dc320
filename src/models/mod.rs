pub mod notes_log;
