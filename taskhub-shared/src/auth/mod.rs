/// Authentication and authorization for TaskHub
///
/// # Modules
///
/// - [`jwt`]: HS256 token creation and validation
/// - [`session`]: bearer-credential extraction and caller resolution
/// - [`authorization`]: the per-project permission gate
///
/// Token issuance (login, refresh) is owned by an external identity flow;
/// this crate validates what that flow mints and decides what the caller may
/// do inside a project.

pub mod authorization;
pub mod jwt;
pub mod session;
