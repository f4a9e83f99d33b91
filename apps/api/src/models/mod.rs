pub mod chat;
pub mod customer;
