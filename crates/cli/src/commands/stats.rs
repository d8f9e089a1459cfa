use gestibank_core::config::LoadOptions;

use super::{with_service, CommandResult, Reply};

pub fn run(local: bool, options: LoadOptions) -> CommandResult {
    with_service("stats", options, |service| async move {
        let statistics =
            if local { service.local_statistics().await? } else { service.statistics().await? };
        let source = if local { "computed from visible entities" } else { "reported by backend" };
        Ok(Reply::new(format!("{} statistics {source}", service.session().role), &statistics))
    })
}
