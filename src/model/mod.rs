pub mod forecast;
pub mod price;
