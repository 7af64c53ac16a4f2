pub mod drum;
pub mod input;
pub mod mode;
pub mod view;
