//! Repository layer.
//!
//! Each resource has a static [`Provider`](crate::provider::Provider) for
//! list/get/delete and a zero-sized repository struct for the writes whose
//! column sets differ per table. All methods take `&PgPool`, except the
//! contract lifecycle writes which take a locked `&mut PgConnection`.

pub mod audit_repo;
pub mod client_repo;
pub mod contract_repo;
pub mod industry_repo;
pub mod kpi_repo;
pub mod role_repo;
pub mod service_assignment_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use client_repo::{ClientRepo, CLIENT_PROVIDER};
pub use contract_repo::{ContractRepo, LockedContract, CONTRACT_PROVIDER};
pub use industry_repo::{IndustryRepo, INDUSTRY_PROVIDER};
pub use kpi_repo::{KpiRepo, KPI_PROVIDER};
pub use role_repo::{RoleRepo, ROLE_PROVIDER};
pub use service_assignment_repo::{ServiceAssignmentRepo, SERVICE_ASSIGNMENT_PROVIDER};
pub use user_repo::{UserRepo, USER_PROVIDER};
