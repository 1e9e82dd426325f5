pub mod chat;
pub mod stances;
