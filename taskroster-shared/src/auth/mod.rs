/// Authentication and authorization utilities
///
/// This module provides the credential, token, and access-control layers for
/// TaskRoster:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Bearer-token resolution into a request [`middleware::Principal`]
/// - [`authorization`]: Pure roster-ownership decision functions
///
/// # Example
///
/// ```no_run
/// use taskroster_shared::auth::password::{hash_password, verify_password};
/// use taskroster_shared::auth::jwt::{create_token, Claims, TokenType};
/// use taskroster_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // Token issuance
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Admin, TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
