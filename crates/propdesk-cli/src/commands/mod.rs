pub mod billing;
pub mod mortgage;
pub mod property;
