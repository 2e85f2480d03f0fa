use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("email address `{email}` does not contain `@`")]
    InvalidEmail { email: String },
}
