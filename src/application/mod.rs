pub mod cart_service;
pub mod catalog_service;
pub mod customer_service;
pub mod order_service;
pub mod tag_service;
