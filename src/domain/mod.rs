pub mod access;
pub mod cart;
pub mod catalog;
pub mod customer;
pub mod errors;
pub mod order;
pub mod pagination;
pub mod ports;
pub mod tagging;
