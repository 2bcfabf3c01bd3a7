use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Number;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the ledger node")]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Target {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, env = "LEDGER_NODE", default_value = "http://127.0.0.1:5000")]
    node: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount (any JSON number)
        #[arg(long, allow_hyphen_values = true)]
        amount: Number,
    },
    /// Mine a block from the pending pool
    Mine,
    /// Print the full chain
    Chain,
    /// List known peers
    Nodes,
    /// Register peers with the node
    Register {
        /// Peer addresses (host:port or URL)
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Run consensus against the node's peers
    Resolve,
}

#[derive(Serialize)]
struct NewTransaction {
    sender: String,
    recipient: String,
    amount: Number,
}

#[derive(Serialize)]
struct RegisterNodes {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.target.node.trim_end_matches('/');
    let client = Client::new();

    let request = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => client
            .post(format!("{node}/transactions/new"))
            .json(&NewTransaction {
                sender,
                recipient,
                amount,
            }),
        Command::Mine => client.get(format!("{node}/mine")),
        Command::Chain => client.get(format!("{node}/chain")),
        Command::Nodes => client.get(format!("{node}/nodes")),
        Command::Register { nodes } => client
            .post(format!("{node}/nodes/register"))
            .json(&RegisterNodes { nodes }),
        Command::Resolve => client.get(format!("{node}/nodes/resolve")),
    };
    send(request).await
}

async fn send(request: RequestBuilder) -> Result<()> {
    let res = request.send().await?;
    let status = res.status();
    debug!("response from {}", res.url());
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
