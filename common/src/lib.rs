pub mod catalogue;
pub mod currency;
pub mod purchase;
pub mod session;
