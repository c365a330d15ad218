use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "remeslo")]
#[command(author, version, about = "Telegram bot: narrative leathercraft simulator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot
    Run,

    /// Seed the shop catalog and exit
    Seed,

    /// Print a player's tutorial progress
    Progress {
        /// Player id
        player_id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
