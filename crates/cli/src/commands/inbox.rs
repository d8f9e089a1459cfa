use gestibank_core::config::LoadOptions;

use super::{with_service, CommandResult, Reply};

pub fn run(options: LoadOptions) -> CommandResult {
    with_service("inbox", options, |service| async move {
        let items = service.inbox().await?;
        let message = if items.is_empty() {
            "nothing awaits you".to_string()
        } else {
            format!("{} item(s) awaiting {}", items.len(), service.session().role)
        };
        Ok(Reply::new(message, &items))
    })
}
