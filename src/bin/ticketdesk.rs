use clap::{Parser, Subcommand};

use ticketdesk::text_util::truncate;
use ticketdesk::{Category, NewTicket, Priority, Status, TicketFilter};

#[derive(Parser)]
#[command(name = "ticketdesk", about = "Support ticket tracker with LLM-assisted triage")]
struct Cli {
    /// Database path (default: ~/.ticketdesk/ticketdesk.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Classify with keyword rules only, never calling the LLM
    #[arg(long)]
    no_llm: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new ticket
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// billing, technical, account, general (suggested if omitted)
        #[arg(long)]
        category: Option<Category>,
        /// low, medium, high, critical (suggested if omitted)
        #[arg(long)]
        priority: Option<Priority>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tickets, newest first
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        priority: Option<Priority>,
        /// open, in_progress, resolved, closed
        #[arg(long)]
        status: Option<Status>,
        /// Case-insensitive text to find in title or description
        #[arg(long)]
        search: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Count only (no output rows)
        #[arg(long)]
        count: bool,
    },
    /// Show one ticket
    Show {
        #[arg(value_name = "TICKET_ID")]
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Change a ticket's status
    Status {
        #[arg(value_name = "TICKET_ID")]
        id: String,
        /// open, in_progress, resolved, closed
        status: Status,
    },
    /// Suggest a category and priority for a description
    Classify {
        description: String,
        #[arg(long)]
        json: bool,
    },
    /// Summary counts over all tickets
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => ticketdesk::Database::open_at(path).await?,
        None => ticketdesk::Database::open().await?,
    };

    // Only classify and intake without both overrides consult the classifier.
    let needs_llm = match &cli.command {
        Commands::Create {
            category, priority, ..
        } => category.is_none() || priority.is_none(),
        Commands::Classify { .. } => true,
        _ => false,
    };
    let classifier = if cli.no_llm || !needs_llm {
        ticketdesk::Classifier::keywords_only()
    } else {
        ticketdesk::llm::create_classifier(&db).await?
    };
    let desk = ticketdesk::TicketDesk::new(db, classifier);
    log::debug!(
        "Classifier: {}",
        desk.classifier().primary_name().unwrap_or("keywords")
    );

    match cli.command {
        Commands::Create {
            title,
            description,
            category,
            priority,
            json,
        } => {
            let ticket = desk
                .create_ticket(NewTicket {
                    title,
                    description,
                    category,
                    priority,
                })
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ticket)?);
            } else {
                println!("Created {}", ticket.id);
                print_ticket(&ticket);
            }
        }
        Commands::List {
            category,
            priority,
            status,
            search,
            limit,
            json,
            csv,
            count,
        } => {
            let mut filter = TicketFilter::new();
            if let Some(c) = category {
                filter = filter.category(c);
            }
            if let Some(p) = priority {
                filter = filter.priority(p);
            }
            if let Some(s) = status {
                filter = filter.status(s);
            }
            if let Some(ref text) = search {
                filter = filter.search(text);
            }

            if count {
                println!("{}", filter.count(desk.db()).await?);
                return Ok(());
            }
            let filter = filter.limit(limit);
            if json {
                println!("{}", filter.to_json(desk.db()).await?);
            } else if csv {
                print!("{}", filter.to_csv(desk.db()).await?);
            } else {
                let tickets = desk.list_tickets(filter).await?;
                if tickets.is_empty() {
                    println!("No tickets found.");
                }
                for t in &tickets {
                    println!(
                        "{}  {:<11} {:<9} {:<8} {}",
                        truncate(&t.id, 8),
                        t.status,
                        t.category,
                        t.priority,
                        truncate(&t.title, 60)
                    );
                }
            }
        }
        Commands::Show { id, json } => {
            let ticket = desk.get_ticket(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ticket)?);
            } else {
                print_ticket(&ticket);
                println!("\n{}", ticket.description);
            }
        }
        Commands::Status { id, status } => {
            let ticket = desk.update_status(&id, status).await?;
            println!("{} -> {}", ticket.id, ticket.status);
        }
        Commands::Classify { description, json } => {
            let suggestion = desk.classify(&description).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&suggestion)?);
            } else {
                match suggestion.pair() {
                    Some((category, priority)) => {
                        println!("Category: {category}");
                        println!("Priority: {priority}");
                    }
                    None => println!("No suggestion (description too short)."),
                }
            }
        }
        Commands::Stats { json } => {
            let stats = desk.stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        Commands::Config { action } => {
            handle_config(&desk, action).await?;
        }
    }

    Ok(())
}

async fn handle_config(desk: &ticketdesk::TicketDesk, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match desk.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            desk.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = desk.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

fn print_ticket(t: &ticketdesk::Ticket) {
    println!("  Title:    {}", t.title);
    println!("  Category: {}", t.category);
    println!("  Priority: {}", t.priority);
    println!("  Status:   {}", t.status);
    println!("  Created:  {}", t.created_at.format("%Y-%m-%d %H:%M UTC"));
}

fn print_stats(s: &ticketdesk::Stats) {
    println!("Ticket Stats");
    println!("  Total:       {}", s.total_tickets);
    println!("  Open:        {}", s.open_tickets);
    println!("  Avg per day: {:.1}", s.avg_tickets_per_day);
    println!("  By category:");
    for (category, n) in &s.category_breakdown {
        println!("    {:<10} {n}", category.as_str());
    }
    println!("  By priority:");
    for (priority, n) in &s.priority_breakdown {
        println!("    {:<10} {n}", priority.as_str());
    }
}
