use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use taskboard_cli::config::ClientConfig;
use taskboard_cli::http::HttpTaskEndpoints;
use taskboard_cli::view;
use taskboard_core::client::{
    DropOutcome, KanbanBoard, SubmitOutcome, TaskDialog, TaskEndpoints, TaskList,
};
use taskboard_core::{TaskId, TaskStatus};

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Manage your tasks from the terminal")]
struct Cli {
    /// Base URL of the taskboard server [env: TASKBOARD_SERVER_URL]
    #[arg(long, global = true)]
    server: Option<String>,
    /// Bearer token from `taskboard login` [env: TASKBOARD_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Obtain a bearer token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show your tasks as a list
    List,
    /// Show your tasks as a kanban board
    Board,
    /// Show one task
    Show { id: TaskId },
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = TaskStatus::Todo)]
        status: TaskStatus,
    },
    /// Edit a task; omitted fields keep their current value
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Flip a task between completed and to do
    Toggle { id: TaskId },
    /// Move a task to another board column (todo, in-progress, completed)
    Move { id: TaskId, column: String },
    /// Delete a task
    Rm { id: TaskId },
    /// Keep a view open, refreshing it on every change
    Watch {
        /// Show the board instead of the list
        #[arg(long)]
        board: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let config = ClientConfig::from_env()?.with_overrides(cli.server, cli.token);
    let endpoints = HttpTaskEndpoints::new(config.server_url, config.token);

    match cli.command {
        Commands::Login { username, password } => {
            let token = endpoints.login(&username, &password).await?;
            println!("{}", token);
        }
        Commands::List => {
            let tasks = endpoints.list().await?;
            print!("{}", view::render_list(&tasks));
        }
        Commands::Board => {
            let board = KanbanBoard::new(&endpoints, endpoints.list().await?);
            print!("{}", view::render_board(&board.columns()));
        }
        Commands::Show { id } => {
            let task = endpoints.get(id).await?;
            print!("{}", view::render_task(&task));
        }
        Commands::Add {
            title,
            description,
            status,
        } => {
            let mut dialog = TaskDialog::new();
            dialog.open_for_create();
            dialog.set_title(title);
            dialog.set_description(description.unwrap_or_default());
            dialog.set_status(status);
            match dialog.submit(&endpoints).await {
                SubmitOutcome::Created(id) => println!("Task added with ID {}", id),
                outcome => bail_on_submit(outcome)?,
            }
        }
        Commands::Edit {
            id,
            title,
            description,
            status,
        } => {
            let task = endpoints.get(id).await?;
            let mut dialog = TaskDialog::new();
            dialog.open_for_edit(&task);
            if let Some(title) = title {
                dialog.set_title(title);
            }
            if let Some(description) = description {
                dialog.set_description(description);
            }
            if let Some(status) = status {
                dialog.set_status(status);
            }
            match dialog.submit(&endpoints).await {
                SubmitOutcome::Updated => println!("Task {} updated", id),
                outcome => bail_on_submit(outcome)?,
            }
        }
        Commands::Toggle { id } => {
            let task = endpoints.get(id).await?;
            TaskList::new(&endpoints).toggle_complete(&task).await?;
            let status = TaskStatus::for_completion(!task.is_completed);
            println!("Task {} is now {}", id, status.label());
        }
        Commands::Move { id, column } => {
            let mut board = KanbanBoard::new(&endpoints, endpoints.list().await?);
            board.start_drag(id);
            match board.end_drag(Some(column.as_str())).await? {
                DropOutcome::Moved { from, to } => {
                    println!("Moved task {} from {} to {}", id, from.label(), to.label())
                }
                DropOutcome::SameColumn => println!("Task {} is already there", id),
                DropOutcome::Discarded => {
                    bail!("Nothing moved: no task {} or no column named '{}'", id, column)
                }
            }
        }
        Commands::Rm { id } => {
            TaskList::new(&endpoints).delete(id).await?;
            println!("Task {} deleted", id);
        }
        Commands::Watch { board } => watch(&endpoints, board).await?,
    }

    Ok(())
}

fn bail_on_submit(outcome: SubmitOutcome) -> anyhow::Result<()> {
    match outcome {
        SubmitOutcome::Rejected => bail!("Title must not be empty"),
        SubmitOutcome::Failed => bail!("Task could not be saved"),
        SubmitOutcome::Created(_) | SubmitOutcome::Updated => Ok(()),
    }
}

/// Renders the chosen view, then re-renders from a fresh list after every change.
async fn watch(endpoints: &HttpTaskEndpoints, board: bool) -> anyhow::Result<()> {
    let mut feed = endpoints
        .subscribe()
        .await
        .context("Could not open the change feed")?;

    loop {
        let tasks = endpoints.list().await?;
        let rendered = if board {
            view::render_board(&KanbanBoard::new(endpoints, tasks).columns())
        } else {
            view::render_list(&tasks)
        };
        // Clear the screen and home the cursor.
        print!("\x1b[2J\x1b[H{}", rendered);

        match feed.next().await? {
            Some(event) => tracing::debug!("Refreshing after {:?}", event),
            None => {
                tracing::info!("Server closed the change feed");
                return Ok(());
            }
        }
    }
}
