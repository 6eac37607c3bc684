pub mod authorization;
pub mod booking;
pub mod identity;
pub mod lifecycle;
