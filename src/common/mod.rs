pub mod name;
pub mod prop;
