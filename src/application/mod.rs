pub mod use_cases;

pub use use_cases::download_dataset::DownloadDatasetUseCase;
pub use use_cases::downscale_video::DownscaleVideoUseCase;
pub use use_cases::export_model::ExportModelUseCase;
pub use use_cases::extract_frames::ExtractFramesUseCase;
pub use use_cases::train_model::TrainModelUseCase;
