/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the registration password policy
/// - [`jwt`]: HS256 access tokens carrying id, email, and role
/// - [`middleware`]: bearer-token extraction into an [`middleware::AuthContext`]
/// - [`authorization`]: the closed [`authorization::Role`] set and route audiences

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
