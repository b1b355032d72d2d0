pub mod from_tab;
pub mod merge;
pub mod to_tab;
pub mod to_tped;
