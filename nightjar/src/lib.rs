pub mod bench;
pub mod controller;
pub mod evaluate;
pub mod movepick;
pub mod search;
pub mod search_tables;
pub mod time_control;
pub mod transpositions;
