//! [`Command`] definition.

pub mod authorize_access_token;
pub mod create_user;
pub mod create_user_session;
pub mod delete_user;
#[cfg(test)]
mod fixture;
pub mod set_user_admin;
pub mod update_user;
pub mod update_user_password;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_access_token::AuthorizeAccessToken, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_user::DeleteUser,
    set_user_admin::SetUserAdmin, update_user::UpdateUser,
    update_user_password::UpdateUserPassword,
};
