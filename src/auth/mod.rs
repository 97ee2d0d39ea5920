//! Authentication module for Feedloft.
//!
//! This module provides password hashing, user registration and login.

mod password;
mod registration;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use registration::{authenticate, register, RegistrationRequest, MAX_NAME_LENGTH};
