/// Router Module Index
///
/// Organizes the application's routing logic into access-segregated modules,
/// so that the authentication layer is applied explicitly at the module level
/// (via Axum layers) and protected endpoints cannot be exposed by accident.

/// Routes accessible to all clients (reads, registration, event subscription).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session.
pub mod authenticated;

/// Routes that additionally require the privileged role.
/// The role itself is enforced by the authorization gate inside the handlers.
pub mod privileged;
