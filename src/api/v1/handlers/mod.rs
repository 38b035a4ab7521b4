pub mod health;
pub mod proof;
pub mod validate;
