//! 인증 도메인 모델.

mod directory;
mod principal;
mod role;

pub use directory::{DirectoryError, PrincipalDirectory};
pub use principal::{normalize_email, NewPrincipal, Principal, PrincipalRecord};
pub use role::Role;
