pub mod config;
pub mod estimate;
pub mod figures;
pub mod observation;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod stats;
