pub mod frontier;
pub mod returns;
pub mod risk;
