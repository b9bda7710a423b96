pub mod cytocon;
pub mod fivedb;

pub use cytocon::CytoconManager;
pub use fivedb::FivedbManager;
