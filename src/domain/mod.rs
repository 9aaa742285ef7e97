pub mod dataset;
pub mod error;
pub mod settings;
pub mod training;
pub mod video;
