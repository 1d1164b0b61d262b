//! 사용자 디렉터리 구현.
//!
//! - `postgres`: 주 저장소
//! - `memory`: 주 저장소 장애 시 사용하는 비영속 디렉터리
//! - `failover`: circuit breaker로 둘 중 하나를 선택

pub mod failover;
pub mod memory;
pub mod postgres;

pub use failover::{FailoverDirectory, PrimaryStatus};
pub use memory::MemoryPrincipalDirectory;
pub use postgres::PgPrincipalDirectory;
