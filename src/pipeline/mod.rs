pub mod layout;
pub mod persistence;
pub mod project;
pub mod song;
