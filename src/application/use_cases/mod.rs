pub mod download_dataset;
pub mod downscale_video;
pub mod export_model;
pub mod extract_frames;
pub mod train_model;
