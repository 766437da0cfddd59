pub mod board;
pub mod synchronizer;
