pub mod db_utils;
pub mod geo;
pub mod session_cache;
pub mod time;
