pub mod home;
pub mod products;
pub mod system;
pub mod uploads;
