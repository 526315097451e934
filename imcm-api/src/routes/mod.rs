/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, email verification, login and token refresh
/// - `users`: Invites, roster and user management
/// - `otp`: Two-factor enrolment and validation

pub mod auth;
pub mod health;
pub mod otp;
pub mod users;
