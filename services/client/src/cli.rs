//! services/client/src/cli.rs
//!
//! Command-line surface of the `classroom` binary.

use clap::{Parser, Subcommand};
use classroom_core::guard::Location;

#[derive(Debug, Parser)]
#[command(name = "classroom", version, about = "The KKU classroom feed from your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sign in and remember the session on this device.
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the session on this device.
    Signout,
    /// Show the signed-in profile.
    Whoami,
    /// List the class feed.
    Posts {
        /// Show every comment of these posts instead of the first two.
        #[arg(long, value_name = "POST_ID")]
        expand: Vec<String>,
        /// Show every comment of every post.
        #[arg(long)]
        all_comments: bool,
    },
    /// Publish a new post.
    Post { content: String },
    /// Delete one of your posts.
    DeletePost { post_id: String },
    /// Comment on a post.
    Comment { post_id: String, content: String },
    /// Delete one of your comments.
    DeleteComment { post_id: String, comment_id: String },
    /// Like a post, or take your like back.
    Like { post_id: String },
    /// List the students of an enrollment year.
    Students {
        #[arg(long, default_value = "2565")]
        year: String,
    },
}

impl Command {
    /// The screen this command stands for, as seen by the route guard.
    pub fn location(&self) -> Location {
        let path = match self {
            Command::Signin { .. } => "/auth/signin",
            Command::Signout | Command::Whoami => "/profile",
            Command::Posts { .. } => "/feed",
            Command::Post { .. } => "/feed/create",
            Command::DeletePost { .. }
            | Command::Comment { .. }
            | Command::DeleteComment { .. }
            | Command::Like { .. } => "/feed",
            Command::Students { .. } => "/classroom",
        };
        Location::parse(path)
    }
}
