pub mod ai;
pub mod recommendations;
pub mod storage;
pub mod submissions;
