pub mod archive;
pub mod artifact_store;
pub mod config;
pub mod ffmpeg;
pub mod process;
pub mod roboflow;
pub mod settings_store;
pub mod yolo;
