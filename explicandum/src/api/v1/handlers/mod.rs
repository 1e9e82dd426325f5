pub mod chat;
pub mod health;
pub mod stances;

pub use health::health_check;
