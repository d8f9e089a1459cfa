use std::path::PathBuf;

use clap::Subcommand;
use gestibank_client::Page;
use gestibank_core::config::LoadOptions;
use gestibank_core::domain::{DemandId, Quote, QuoteId, QuoteStatus};
use rust_decimal::Decimal;

use super::{read_upload, with_actions, with_service, CommandResult, Reply};

#[derive(Debug, Subcommand)]
pub enum QuotesCommand {
    #[command(about = "List quotes visible to the session's role")]
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    #[command(about = "Show one quote")]
    Show { id: i64 },
    #[command(about = "Price a technician-approved demand (provider)")]
    Create {
        #[arg(long)]
        demand: i64,
        #[arg(long)]
        amount: Decimal,
    },
    #[command(about = "Approve a created quote (technician)")]
    Approve {
        id: i64,
        #[arg(long)]
        note: Option<String>,
        #[arg(long = "expect-status")]
        observed: Option<QuoteStatus>,
    },
    #[command(about = "Reject a created quote (technician); a reason is required")]
    Reject {
        id: i64,
        #[arg(long)]
        reason: String,
        #[arg(long = "expect-status")]
        observed: Option<QuoteStatus>,
    },
    #[command(about = "Send a rejected quote back with a new amount (provider)")]
    Resubmit {
        id: i64,
        #[arg(long)]
        amount: Decimal,
        #[arg(long = "expect-status")]
        observed: Option<QuoteStatus>,
    },
    #[command(about = "Attach the purchase order to an approved quote (manager)")]
    Attach {
        id: i64,
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "expect-status")]
        observed: Option<QuoteStatus>,
    },
}

pub fn run(command: QuotesCommand, options: LoadOptions) -> CommandResult {
    match command {
        QuotesCommand::List { page } => with_service("quotes.list", options, |service| async move {
            let page = Page { page, size: service.page_size() };
            let quotes = service.visible_quotes(page).await?;
            Ok(Reply::new(format!("{} quote(s)", quotes.len()), &quotes))
        }),
        QuotesCommand::Show { id } => with_service("quotes.show", options, |service| async move {
            let quote = service.quote(QuoteId(id)).await?;
            let actions = service.quote_actions(&quote);
            Ok(Reply::new(with_actions(describe(&quote), &actions), &quote))
        }),
        QuotesCommand::Create { demand, amount } => {
            with_service("quotes.create", options, |service| async move {
                let snapshot = service.demand(DemandId(demand)).await?;
                let quote = service.create_quote(&snapshot, amount).await?;
                Ok(Reply::new(format!("created {}", describe(&quote)), &quote))
            })
        }
        QuotesCommand::Approve { id, note, observed } => {
            with_service("quotes.approve", options, |service| async move {
                let snapshot = service.quote_snapshot(QuoteId(id), observed).await?;
                let quote = service.approve_quote(&snapshot, note).await?;
                Ok(Reply::new(describe(&quote), &quote))
            })
        }
        QuotesCommand::Reject { id, reason, observed } => {
            with_service("quotes.reject", options, |service| async move {
                let snapshot = service.quote_snapshot(QuoteId(id), observed).await?;
                let quote = service.reject_quote(&snapshot, reason).await?;
                Ok(Reply::new(describe(&quote), &quote))
            })
        }
        QuotesCommand::Resubmit { id, amount, observed } => {
            with_service("quotes.resubmit", options, |service| async move {
                let snapshot = service.quote_snapshot(QuoteId(id), observed).await?;
                let quote = service.resubmit_quote(&snapshot, amount).await?;
                Ok(Reply::new(describe(&quote), &quote))
            })
        }
        QuotesCommand::Attach { id, file, observed } => {
            with_service("quotes.attach", options, |service| async move {
                let upload = read_upload(&file)?;
                let snapshot = service.quote_snapshot(QuoteId(id), observed).await?;
                let quote = service.attach_purchase_order(&snapshot, upload).await?;
                Ok(Reply::new(describe(&quote), &quote))
            })
        }
    }
}

fn describe(quote: &Quote) -> String {
    let mut summary = format!(
        "quote {} for demand {} is {} ({})",
        quote.id, quote.demand_id, quote.status, quote.total_amount
    );
    if let Some(reason) = quote.rejection_comment() {
        summary.push_str(&format!(", reason: {reason}"));
    }
    if quote.has_purchase_order() {
        summary.push_str(", purchase order attached");
    }
    summary
}
