pub mod assignment;
pub mod attendance;
pub mod clock;
pub mod employee;
pub mod health;
pub mod location;
pub mod settings;
pub mod shift;
pub mod upload;
