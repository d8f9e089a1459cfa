use std::path::PathBuf;

use clap::{Args, Subcommand};
use gestibank_client::{Page, ServiceError};
use gestibank_core::config::LoadOptions;
use gestibank_core::domain::{ArticleDraft, Demand, DemandDraft, DemandId, DemandStatus};

use super::{read_upload, with_actions, with_service, CommandResult, Reply};

#[derive(Debug, Subcommand)]
pub enum DemandsCommand {
    #[command(about = "List demands visible to the session's role")]
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    #[command(about = "Show one demand with its articles and comments")]
    Show { id: i64 },
    #[command(about = "Create a demand (agent or responsible)")]
    Create {
        #[command(flatten)]
        content: DraftArgs,
        #[arg(long, help = "File attached to the demand")]
        attach: Option<PathBuf>,
    },
    #[command(about = "Approve a demand under review")]
    Approve {
        id: i64,
        #[arg(long)]
        note: Option<String>,
        #[command(flatten)]
        observed: Observed,
    },
    #[command(about = "Reject a demand under review; a reason is required")]
    Reject {
        id: i64,
        #[arg(long)]
        reason: String,
        #[command(flatten)]
        observed: Observed,
    },
    #[command(about = "Edit a rejected demand and send it back for review")]
    Resubmit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(
            long = "article",
            value_name = "NAME:QUANTITY[:DESCRIPTION]",
            help = "Replaces all articles when given"
        )]
        articles: Vec<String>,
        #[command(flatten)]
        observed: Observed,
    },
}

#[derive(Debug, Args)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long = "article", value_name = "NAME:QUANTITY[:DESCRIPTION]")]
    pub articles: Vec<String>,
}

impl DraftArgs {
    fn into_draft(self) -> Result<DemandDraft, ServiceError> {
        Ok(DemandDraft {
            title: self.title,
            description: self.description,
            articles: parse_articles(&self.articles)?,
        })
    }
}

/// Status the operator last saw; acting on anything else is refused as stale.
#[derive(Debug, Default, Args)]
pub struct Observed {
    #[arg(long = "expect-status")]
    pub status: Option<DemandStatus>,
}

pub fn run(command: DemandsCommand, options: LoadOptions) -> CommandResult {
    match command {
        DemandsCommand::List { page } => {
            with_service("demands.list", options, |service| async move {
                let page = Page { page, size: service.page_size() };
                let demands = service.visible_demands(page).await?;
                Ok(Reply::new(format!("{} demand(s)", demands.len()), &demands))
            })
        }
        DemandsCommand::Show { id } => with_service("demands.show", options, |service| async move {
            let demand = service.demand(DemandId(id)).await?;
            let actions = service.demand_actions(&demand);
            Ok(Reply::new(with_actions(describe(&demand), &actions), &demand))
        }),
        DemandsCommand::Create { content, attach } => {
            with_service("demands.create", options, |service| async move {
                let draft = content.into_draft()?;
                let attachment = attach.as_deref().map(read_upload).transpose()?;
                let demand = service.create_demand(draft, attachment).await?;
                Ok(Reply::new(format!("created {}", describe(&demand)), &demand))
            })
        }
        DemandsCommand::Approve { id, note, observed } => {
            with_service("demands.approve", options, |service| async move {
                let snapshot = service.demand_snapshot(DemandId(id), observed.status).await?;
                let outcome = service.approve_demand(&snapshot, note).await?;
                Ok(Reply::new(format!("approved demand {id}"), &outcome))
            })
        }
        DemandsCommand::Reject { id, reason, observed } => {
            with_service("demands.reject", options, |service| async move {
                let snapshot = service.demand_snapshot(DemandId(id), observed.status).await?;
                let outcome = service.reject_demand(&snapshot, reason).await?;
                Ok(Reply::new(format!("rejected demand {id}"), &outcome))
            })
        }
        DemandsCommand::Resubmit { id, title, description, articles, observed } => {
            with_service("demands.resubmit", options, |service| async move {
                let snapshot = service.demand_snapshot(DemandId(id), observed.status).await?;
                let mut draft = snapshot.draft();
                if let Some(title) = title {
                    draft.title = title;
                }
                if let Some(description) = description {
                    draft.description = description;
                }
                if !articles.is_empty() {
                    draft.articles = parse_articles(&articles)?;
                }
                let outcome = service.resubmit_demand(&snapshot, draft).await?;
                Ok(Reply::new(format!("resubmitted demand {id}"), &outcome))
            })
        }
    }
}

fn describe(demand: &Demand) -> String {
    let mut summary = format!("demand {} `{}` is {}", demand.id, demand.title, demand.status);
    if let Some(reason) = demand.rejection_comment() {
        summary.push_str(&format!(" (reason: {reason})"));
    }
    summary
}

/// Parses `name:quantity[:description]` article specs.
pub fn parse_articles(specs: &[String]) -> Result<Vec<ArticleDraft>, ServiceError> {
    specs.iter().map(|spec| parse_article(spec)).collect()
}

fn parse_article(spec: &str) -> Result<ArticleDraft, ServiceError> {
    let mut parts = spec.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    let quantity = parts.next().map(str::trim).unwrap_or_default();
    let description = parts.next().unwrap_or_default().trim();

    let quantity = quantity.parse::<u32>().map_err(|_| {
        ServiceError::Validation(format!(
            "article `{spec}` needs a whole quantity (expected NAME:QUANTITY[:DESCRIPTION])"
        ))
    })?;

    Ok(ArticleDraft {
        id: None,
        name: name.to_string(),
        description: description.to_string(),
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_articles;

    #[test]
    fn article_specs_split_on_the_first_two_colons() {
        let articles = parse_articles(&[
            "Laptop:4:14 inch: with dock".to_string(),
            "Mouse:10".to_string(),
        ])
        .expect("valid specs");

        assert_eq!(articles[0].name, "Laptop");
        assert_eq!(articles[0].quantity, 4);
        assert_eq!(articles[0].description, "14 inch: with dock");
        assert_eq!(articles[1].description, "");
    }

    #[test]
    fn article_without_quantity_is_rejected() {
        assert!(parse_articles(&["Laptop".to_string()]).is_err());
        assert!(parse_articles(&["Laptop:four".to_string()]).is_err());
    }
}
