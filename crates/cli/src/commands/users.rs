use clap::Subcommand;
use gestibank_client::dto::UserRegisterRequest;
use gestibank_core::config::LoadOptions;
use gestibank_core::domain::{Role, UserId};

use super::{with_service, CommandResult, Reply};

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    #[command(about = "List every user (admin)")]
    List,
    #[command(about = "Register a user with a role (admin)")]
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GESTIBANK_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        role: Role,
    },
    #[command(about = "Delete a user (admin)")]
    Delete { id: i64 },
}

pub fn run(command: UsersCommand, options: LoadOptions) -> CommandResult {
    match command {
        UsersCommand::List => with_service("users.list", options, |service| async move {
            let users = service.users().await?;
            Ok(Reply::new(format!("{} user(s)", users.len()), &users))
        }),
        UsersCommand::Register { first_name, last_name, email, password, role } => {
            with_service("users.register", options, |service| async move {
                let request = UserRegisterRequest { first_name, last_name, password, email, role };
                let user = service.register_user(request).await?;
                Ok(Reply::new(format!("registered {} as {}", user.email, user.role), &user))
            })
        }
        UsersCommand::Delete { id } => with_service("users.delete", options, |service| async move {
            service.delete_user(UserId(id)).await?;
            Ok(Reply::new(format!("deleted user {id}"), &serde_json::json!({ "id": id })))
        }),
    }
}
