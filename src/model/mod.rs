//! Model module - wire types and request parameters for the join flow

pub mod dtos;
pub mod structs;

pub use dtos::{AuthTokens, JoinParams};
pub use structs::{JoinRequest, JoinResponse, JoinStatus, TokenRecord};
