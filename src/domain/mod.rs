pub mod asset;
pub mod track;
