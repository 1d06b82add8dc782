pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::user;
pub use domain::user::access::AccessPolicy;
pub use domain::user::access::Identity;
pub use domain::user::service::AuthService;
pub use outbound::repositories;
