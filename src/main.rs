//! cube CLI - minimal version control command line interface

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cube::ops::{self, StoredObject};
use cube::{Hash, InitOutcome, Repo};

#[derive(Parser)]
#[command(name = "cube")]
#[command(about = "minimal content-addressed version control")]
#[command(version)]
struct Cli {
    /// workspace directory
    #[arg(short = 'C', long, default_value = ".")]
    workdir: PathBuf,

    /// increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a repository in the workspace
    Init,

    /// stage a file or directory
    Add {
        /// file or directory to stage
        path: PathBuf,
    },

    /// show staged, modified and untracked files
    Status,

    /// record the staged changes
    Commit {
        /// commit message
        #[arg(short, long)]
        message: String,
    },

    /// list branches, or create one
    Branch {
        /// name of the branch to create
        name: Option<String>,
    },

    /// change the active branch
    Switch {
        /// branch to make active
        branch: String,
    },

    /// show the current branch's history
    Log,

    /// delete the repository metadata
    Undo,

    /// show a stored object
    CatFile {
        /// object hash
        object: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("cube={}", level)))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: Cli) -> cube::Result<()> {
    match cli.command {
        Commands::Init => {
            let (repo, outcome) = Repo::init(&cli.workdir)?;
            match outcome {
                InitOutcome::Created => {
                    println!("initialized cube repository at {}", repo.path().display())
                }
                InitOutcome::AlreadyInitialized => {
                    println!("already initialized at {}", repo.path().display())
                }
            }
        }

        Commands::Add { path } => {
            let repo = Repo::open(&cli.workdir)?;
            let summary = ops::add(&repo, &path)?;

            for path in &summary.staged {
                println!("staged {}", path);
            }
            for path in &summary.removed {
                println!("removed {}", path);
            }
            if summary.staged.is_empty() && summary.removed.is_empty() {
                println!("nothing new to stage");
            }
        }

        Commands::Status => {
            let repo = Repo::open(&cli.workdir)?;
            print!("{}", ops::status(&repo)?);
        }

        Commands::Commit { message } => {
            let repo = Repo::open(&cli.workdir)?;
            let hash = ops::commit(&repo, &message)?;
            let branch = repo.refs().current_branch()?;
            println!("[{} {}] {}", branch, hash.short(), message);
        }

        Commands::Branch { name: Some(name) } => {
            let repo = Repo::open(&cli.workdir)?;
            match ops::create_branch(&repo, &name)? {
                Some(hash) => println!("created branch {} at {}", name, hash.short()),
                None => println!("created branch {}", name),
            }
        }

        Commands::Branch { name: None } => {
            let repo = Repo::open(&cli.workdir)?;
            for branch in ops::list_branches(&repo)? {
                println!("{}", branch);
            }
        }

        Commands::Switch { branch } => {
            let repo = Repo::open(&cli.workdir)?;
            ops::switch(&repo, &branch)?;
            println!("switched to branch {}", branch);
        }

        Commands::Log => {
            let repo = Repo::open(&cli.workdir)?;
            let entries = ops::log(&repo)?;

            if entries.is_empty() {
                println!("no commits");
            }
            for entry in entries {
                println!("{}", entry);
            }
        }

        Commands::Undo => {
            let path = Repo::destroy_in(&cli.workdir)?;
            println!("removed {}", path.display());
        }

        Commands::CatFile { object } => {
            let repo = Repo::open(&cli.workdir)?;
            let hash = Hash::from_hex(&object)?;

            match ops::cat_file(&repo, &hash)? {
                StoredObject::Commit(commit) => {
                    if let Some(parent) = commit.parent {
                        println!("parent {}", parent);
                    }
                    println!();
                    println!("{}", commit.message);
                    println!();
                    println!("{}", commit.tree);
                }
                StoredObject::Blob(data) => {
                    io::stdout()
                        .write_all(&data)
                        .map_err(|e| cube::Error::Io { path: "stdout".into(), source: e })?;
                }
            }
        }
    }

    Ok(())
}
