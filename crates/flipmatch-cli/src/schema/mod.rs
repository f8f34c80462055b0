pub mod progress_file;
pub mod simulation;
