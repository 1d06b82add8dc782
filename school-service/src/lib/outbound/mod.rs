pub mod email;
pub mod repositories;
