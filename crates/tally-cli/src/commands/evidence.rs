//! Evidence command implementation.

use crate::cli::EvidenceArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::services::Services;
use tally_evidence::EmailQuery;

/// Execute the evidence command.
pub async fn execute_evidence(args: EvidenceArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let services = Services::load(config).await?;
    let search = services.email_search(config, args.live);

    let query = EmailQuery {
        company_name: args.company,
        amount: args.amount,
        center_date: args.date,
        days_before: args.days_before,
        days_after: args.days_after,
    };
    let evidence = search.search(&query).await?;
    println!("{}", formatter.format_evidence(&evidence)?);

    if args.summarize {
        // A successful search implies a company name
        let company = query.company().unwrap_or_default();
        let summary = services
            .summarizer(config)
            .summarize(&evidence, company, args.amount)
            .await;
        println!("{}", formatter.format_summary(summary.as_ref())?);
    }
    Ok(())
}
