pub mod lists;
pub mod markets;
